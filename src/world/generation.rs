use std::hash::{Hash, Hasher};

use metrohash::MetroHash64;

use crate::{pos, Pos};

use super::{Cell, CellRef, GridError, Mode};

/// Every cell of the grid at one point in time, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generation {
    rows: usize,
    cols: usize,
    mode: Mode,
    cells: Vec<Cell>,
}

impl Generation {
    pub fn blank(rows: usize, cols: usize, mode: Mode) -> Self {
        let cells = vec![mode.blank_cell(); rows * cols];
        Self::from_cells(rows, cols, mode, cells)
    }

    pub fn from_cells(rows: usize, cols: usize, mode: Mode, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self {
            rows,
            cols,
            mode,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn is_alive(&self, index: usize) -> bool {
        self.get(index).is_some_and(Cell::is_alive)
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_alive()).count()
    }

    fn invalid(&self, at: CellRef) -> GridError {
        GridError::InvalidIndex {
            at,
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub(super) fn cell_mut(&mut self, index: usize) -> Result<&mut Cell, GridError> {
        let err = self.invalid(CellRef::Index(index));
        self.cells.get_mut(index).ok_or(err)
    }

    pub fn index_of(&self, pos: Pos) -> Result<usize, GridError> {
        index_in(self.rows, self.cols, pos).ok_or_else(|| self.invalid(CellRef::Pos(pos)))
    }

    pub fn pos_of(&self, index: usize) -> Result<Pos, GridError> {
        if index >= self.len() {
            return Err(self.invalid(CellRef::Index(index)));
        }
        Ok(pos_in(self.cols, index))
    }

    /// in-range indices around `index`, row by row then column by column.
    /// The blend rule depends on this order.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> {
        let (rows, cols) = (self.rows, self.cols);
        let center = pos_in(cols, index);
        (-1..=1)
            .flat_map(|row| (-1..=1).map(move |col| pos!(row, col)))
            .filter(|offset| *offset != pos!(0, 0))
            .filter_map(move |offset| index_in(rows, cols, center + offset))
    }

    pub fn live_neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors(index).filter(|&n| self.is_alive(n))
    }

    /// a cheap 64 bit digest of the whole generation, colors included.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = MetroHash64::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn pos_in(cols: usize, index: usize) -> Pos {
    pos!((index / cols) as i32, (index % cols) as i32)
}

fn index_in(rows: usize, cols: usize, Pos { row, col }: Pos) -> Option<usize> {
    let in_range = row >= 0 && col >= 0 && (row as usize) < rows && (col as usize) < cols;
    in_range.then(|| row as usize * cols + col as usize)
}
