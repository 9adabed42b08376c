//! Grid builders shared by unit tests.

use crate::cell::{Cell, CellCollection};
use crate::geometry::{square, PlanarGeometry};

/// Unit squares laid out row-major from the bottom-left, so cell
/// `(col, row)` gets id `row * cols + col`.
pub fn grid(cols: usize, rows: usize, risk: impl Fn(usize, usize) -> f64) -> CellCollection {
    let mut cells = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            cells.push(Cell::new(
                square(col as f64, row as f64, 1.0),
                risk(col, row),
            ));
        }
    }
    CellCollection::new(cells, &PlanarGeometry::new()).expect("fixture grid is valid")
}

/// Unit squares at arbitrary integer origins, ids in slice order.
pub fn cells_at(origins: &[(i32, i32)], risk: f64) -> CellCollection {
    let cells = origins
        .iter()
        .map(|&(x, y)| Cell::new(square(x as f64, y as f64, 1.0), risk))
        .collect();
    CellCollection::new(cells, &PlanarGeometry::new()).expect("fixture cells are valid")
}
