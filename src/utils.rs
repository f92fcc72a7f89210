use std::{
    fmt,
    ops::{Add, Sub},
};

/// A grid coordinate. Signed so that neighbor offsets can step off the edge
/// before being bounds-checked.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

#[macro_export]
macro_rules! pos {
    ($row:expr, $col:expr) => {
        Pos {
            row: $row,
            col: $col,
        }
    };
}

impl Add for Pos {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        pos!(self.row + rhs.row, self.col + rhs.col)
    }
}

impl Sub for Pos {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        pos!(self.row - rhs.row, self.col - rhs.col)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[test]
fn test_pos_arithmetic() {
    assert_eq!(pos!(1, 2) + pos!(-1, 3), pos!(0, 5));
    assert_eq!(pos!(1, 2) - pos!(2, 2), pos!(-1, 0));
}
