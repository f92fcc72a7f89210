use crate::{pos, Grid, GridError, Pos};

/// Reads a plain text layout: `#` is a live cell, anything else is dead,
/// every line is a row.
pub fn deserialize(str: &str) -> Vec<Pos> {
    let mut result = vec![];
    let mut pos = pos!(0, 0);
    for c in str.chars() {
        match c {
            '#' => {
                result.push(pos);
                pos.col += 1
            }
            '\n' => pos = pos!(pos.row + 1, 0),
            '\r' => (),
            _ => pos.col += 1,
        }
    }
    result
}

/// the smallest (rows, cols) that holds every position.
pub fn extent(actives: &[Pos]) -> (i32, i32) {
    actives.iter().fold((0, 0), |(rows, cols), pos| {
        (rows.max(pos.row + 1), cols.max(pos.col + 1))
    })
}

/// brings every position of the layout to life, shifted by `origin`.
/// Stops at the first position outside the grid.
pub fn stamp(grid: &mut Grid, actives: &[Pos], origin: Pos) -> Result<(), GridError> {
    for &pos in actives {
        let index = grid.index_of(origin + pos)?;
        grid.set_cell(index, true, None)?;
    }
    Ok(())
}
