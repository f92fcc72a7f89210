use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{Cell, Generation, Grid, Mode, Rgb};

/// chance that `randomize` brings a given cell to life.
pub const RANDOM_ALIVE_THRESHOLD: f64 = 0.7;

/// Computes generation N+1 from generation N.
///
/// The engine owns the random source used for dying blend cells and for
/// randomizing, so a seeded engine replays identically.
#[derive(Debug, Clone)]
pub struct StepEngine {
    rng: StdRng,
}

impl StepEngine {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// advances `grid` by one generation.
    pub fn step(&mut self, grid: &mut Grid) {
        let next = self.next(&grid.snapshot());
        grid.commit(next);
    }

    /// the generation following `current`; `current` is only read.
    pub fn next(&mut self, current: &Generation) -> Generation {
        let cells = (0..current.len())
            .map(|index| self.next_cell(current, index))
            .collect();
        Generation::from_cells(current.rows(), current.cols(), current.mode(), cells)
    }

    fn next_cell(&mut self, current: &Generation, index: usize) -> Cell {
        let cell = current.cells()[index];
        let live_count = current.live_neighbors(index).count();
        let alive = match (cell.is_alive(), live_count) {
            (true, 2..=3) => true,  // survives
            (false, 3) => true,     // born
            _ => false,             // dies or stays dead
        };

        if current.mode() == Mode::Classic {
            return if alive {
                Cell::alive(None)
            } else {
                Cell::dead(None)
            };
        }

        match (cell.is_alive(), alive) {
            (true, true) => Cell::alive(blend(current, index, live_count)),
            (true, false) => Cell::dead(Some(Rgb::random(&mut self.rng))),
            (false, true) => Cell::alive(cell.color()),
            (false, false) => cell,
        }
    }

    /// sets every cell alive with probability 0.3, independently of the others.
    /// Live blend cells get a fresh color, dead ones keep theirs. The result
    /// is committed as one generation.
    pub fn randomize(&mut self, grid: &mut Grid) {
        let current = grid.snapshot();
        let cells = current
            .cells()
            .iter()
            .map(|cell| {
                let alive = self.rng.gen::<f64>() > RANDOM_ALIVE_THRESHOLD;
                match (current.mode(), alive) {
                    (Mode::Classic, true) => Cell::alive(None),
                    (Mode::Classic, false) => Cell::dead(None),
                    (Mode::Blend, true) => Cell::alive(Some(Rgb::random(&mut self.rng))),
                    (Mode::Blend, false) => Cell::dead(cell.color()),
                }
            })
            .collect();
        grid.commit(Generation::from_cells(
            current.rows(),
            current.cols(),
            current.mode(),
            cells,
        ));
    }
}

/// folds the live neighbors' colors into the cell's own, each one pulling the
/// running blend `1 / live_count` of the way toward it. The result depends on
/// neighbor order.
fn blend(current: &Generation, index: usize, live_count: usize) -> Option<Rgb> {
    let own = current.cells()[index].color()?;
    let ratio = 1.0 / live_count as f32;
    let blended = current
        .live_neighbors(index)
        .filter_map(|n| current.cells()[n].color())
        .fold(own, |acc, color| acc.lerp(color, ratio));
    Some(blended)
}
