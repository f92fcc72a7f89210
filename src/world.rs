use std::fmt;

use thiserror::Error;

use crate::Pos;

pub use color::Rgb;
mod color;

pub use generation::Generation;
mod generation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    alive: bool,
    color: Option<Rgb>,
}

impl Cell {
    pub fn alive(color: Option<Rgb>) -> Self {
        Self { alive: true, color }
    }

    pub fn dead(color: Option<Rgb>) -> Self {
        Self {
            alive: false,
            color,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn color(&self) -> Option<Rgb> {
        self.color
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::dead(None)
    }
}

/// Which rule set a grid is played with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// plain alive/dead cells, no colors.
    #[default]
    Classic,
    /// every cell carries a color; survivors blend with their live neighbors.
    Blend,
}

impl Mode {
    /// the state of a cell on a freshly created or cleared grid.
    pub fn blank_cell(self) -> Cell {
        match self {
            Mode::Classic => Cell::dead(None),
            Mode::Blend => Cell::dead(Some(Rgb::SEED)),
        }
    }
}

/// How a caller addressed a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRef {
    Index(usize),
    Pos(Pos),
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRef::Index(index) => write!(f, "cell #{index}"),
            CellRef::Pos(pos) => write!(f, "position {pos}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("invalid grid dimension {rows}x{cols}, both must be at least 1")]
    InvalidDimension { rows: i32, cols: i32 },
    #[error("{at} outside of a {rows}x{cols} grid")]
    InvalidIndex { at: CellRef, rows: usize, cols: usize },
}

/// The authoritative, mutable store of cells.
///
/// Readers only ever see whole generations: user edits touch single cells
/// between steps, and the step engine swaps the entire generation in
/// [`Grid::commit`].
#[derive(Debug, Clone)]
pub struct Grid {
    current: Generation,
}

impl Grid {
    pub fn new(rows: i32, cols: i32, mode: Mode) -> Result<Self, GridError> {
        let (rows, cols) = checked_dimensions(rows, cols)?;
        let current = Generation::blank(rows, cols, mode);
        Ok(Self { current })
    }

    pub fn rows(&self) -> usize {
        self.current.rows()
    }

    pub fn cols(&self) -> usize {
        self.current.cols()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn mode(&self) -> Mode {
        self.current.mode()
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.current.get(index)
    }

    pub fn index_of(&self, pos: Pos) -> Result<usize, GridError> {
        self.current.index_of(pos)
    }

    pub fn pos_of(&self, index: usize) -> Result<Pos, GridError> {
        self.current.pos_of(index)
    }

    /// a value copy of the current generation, unaffected by later edits.
    pub fn snapshot(&self) -> Generation {
        self.current.clone()
    }

    /// sets one cell from outside the step rule (clicks, painting, randomizing).
    ///
    /// Classic grids ignore `color`. On blend grids `None` keeps the cell's
    /// current color.
    pub fn set_cell(
        &mut self,
        index: usize,
        alive: bool,
        color: Option<Rgb>,
    ) -> Result<(), GridError> {
        let mode = self.mode();
        let cell = self.current.cell_mut(index)?;
        cell.alive = alive;
        if mode == Mode::Blend {
            if let Some(color) = color {
                cell.color = Some(color);
            }
        }
        Ok(())
    }

    /// flips a cell and returns whether it is now alive.
    pub fn toggle(&mut self, index: usize) -> Result<bool, GridError> {
        let cell = self.current.cell_mut(index)?;
        cell.alive = !cell.alive;
        Ok(cell.alive)
    }

    pub fn clear(&mut self) {
        self.current = Generation::blank(self.rows(), self.cols(), self.mode());
    }

    /// replaces the grid with a blank one of the new size, keeping the mode.
    /// On error the grid is left untouched.
    pub fn resize(&mut self, rows: i32, cols: i32) -> Result<(), GridError> {
        let (rows, cols) = checked_dimensions(rows, cols)?;
        self.current = Generation::blank(rows, cols, self.mode());
        Ok(())
    }

    /// swaps in the next generation as a whole.
    pub fn commit(&mut self, next: Generation) {
        debug_assert_eq!(
            (next.rows(), next.cols(), next.mode()),
            (self.rows(), self.cols(), self.mode()),
            "committed generation does not match the grid layout"
        );
        self.current = next;
    }
}

fn checked_dimensions(rows: i32, cols: i32) -> Result<(usize, usize), GridError> {
    if rows <= 0 || cols <= 0 {
        return Err(GridError::InvalidDimension { rows, cols });
    }
    Ok((rows as usize, cols as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos;

    #[test]
    fn new_grid_is_all_dead() {
        let grid = Grid::new(4, 6, Mode::Classic).unwrap();
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.snapshot().population(), 0);
    }

    #[test]
    fn blend_grid_cells_carry_the_seed_color() {
        let grid = Grid::new(2, 2, Mode::Blend).unwrap();
        assert!(grid
            .snapshot()
            .cells()
            .iter()
            .all(|cell| cell.color() == Some(Rgb::SEED)));
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert_eq!(
            Grid::new(0, 3, Mode::Classic).unwrap_err(),
            GridError::InvalidDimension { rows: 0, cols: 3 }
        );
    }

    #[test]
    fn failed_resize_keeps_the_grid() {
        let mut grid = Grid::new(3, 4, Mode::Classic).unwrap();
        grid.set_cell(5, true, None).unwrap();

        assert_eq!(
            grid.resize(0, 5),
            Err(GridError::InvalidDimension { rows: 0, cols: 5 })
        );
        assert_eq!(
            grid.resize(5, -1),
            Err(GridError::InvalidDimension { rows: 5, cols: -1 })
        );
        assert_eq!((grid.rows(), grid.cols()), (3, 4));
        assert!(grid.get(5).unwrap().is_alive());
    }

    #[test]
    fn resize_discards_state() {
        let mut grid = Grid::new(3, 3, Mode::Blend).unwrap();
        grid.set_cell(4, true, Some(Rgb::new(1, 2, 3))).unwrap();
        grid.resize(2, 7).unwrap();

        assert_eq!((grid.rows(), grid.cols()), (2, 7));
        assert_eq!(grid.mode(), Mode::Blend);
        assert_eq!(grid.snapshot().population(), 0);
        assert_eq!(grid.get(4).unwrap().color(), Some(Rgb::SEED));
    }

    #[test]
    fn set_cell_out_of_range() {
        let mut grid = Grid::new(2, 2, Mode::Classic).unwrap();
        assert_eq!(
            grid.set_cell(4, true, None),
            Err(GridError::InvalidIndex {
                at: CellRef::Index(4),
                rows: 2,
                cols: 2
            })
        );
        assert_eq!(grid.snapshot().population(), 0);
    }

    #[test]
    fn set_cell_color_policy() {
        let red = Rgb::new(255, 0, 0);

        let mut classic = Grid::new(1, 2, Mode::Classic).unwrap();
        classic.set_cell(0, true, Some(red)).unwrap();
        assert_eq!(classic.get(0).unwrap().color(), None);

        let mut blend = Grid::new(1, 2, Mode::Blend).unwrap();
        blend.set_cell(0, true, Some(red)).unwrap();
        blend.set_cell(0, false, None).unwrap();
        assert_eq!(blend.get(0).unwrap(), &Cell::dead(Some(red)));
    }

    #[test]
    fn toggle_flips() {
        let mut grid = Grid::new(2, 2, Mode::Classic).unwrap();
        assert_eq!(grid.toggle(3), Ok(true));
        assert_eq!(grid.toggle(3), Ok(false));
        assert!(grid.toggle(9).is_err());
    }

    #[test]
    fn snapshot_is_decoupled() {
        let mut grid = Grid::new(2, 2, Mode::Classic).unwrap();
        let before = grid.snapshot();
        grid.set_cell(0, true, None).unwrap();
        assert!(!before.is_alive(0));
        assert!(grid.snapshot().is_alive(0));
    }

    #[test]
    fn clear_kills_everything() {
        let mut grid = Grid::new(3, 3, Mode::Classic).unwrap();
        for index in 0..grid.len() {
            grid.set_cell(index, true, None).unwrap();
        }
        grid.clear();
        assert_eq!(grid.snapshot().population(), 0);
        assert_eq!((grid.rows(), grid.cols()), (3, 3));
    }

    #[test]
    fn index_and_pos_round_trip() {
        let grid = Grid::new(3, 5, Mode::Classic).unwrap();
        assert_eq!(grid.index_of(pos!(2, 1)), Ok(11));
        assert_eq!(grid.pos_of(11), Ok(pos!(2, 1)));
        assert!(grid.index_of(pos!(0, -1)).is_err());
        assert!(grid.pos_of(15).is_err());
    }

    #[test]
    fn coordinate_misses_are_invalid_indices() {
        let grid = Grid::new(2, 2, Mode::Classic).unwrap();
        let err = grid.index_of(pos!(5, 5)).unwrap_err();
        assert_eq!(
            err,
            GridError::InvalidIndex {
                at: CellRef::Pos(pos!(5, 5)),
                rows: 2,
                cols: 2
            }
        );
        assert_eq!(err.to_string(), "position (5, 5) outside of a 2x2 grid");
        assert!(matches!(
            grid.index_of(pos!(3, 0)),
            Err(GridError::InvalidIndex { .. })
        ));
    }
}
