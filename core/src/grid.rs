use serde::{Deserialize, Serialize};

use crate::*;

/// Board dimensions and the coordinate arithmetic that goes with them.
///
/// Cells are stored row-major, so the linear index of `(row, column)` is
/// `row * width + column`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: Coord,
    height: Coord,
}

impl Grid {
    pub const fn new(width: Coord, height: Coord) -> Self {
        Self { width, height }
    }

    pub const fn width(&self) -> Coord {
        self.width
    }

    pub const fn height(&self) -> Coord {
        self.height
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }

    /// Shape for `ndarray` storage, `[rows, columns]`.
    pub const fn nd_dim(&self) -> [usize; 2] {
        [self.height as usize, self.width as usize]
    }

    /// Bounds check over signed coordinates, so callers can probe off-board offsets.
    pub fn is_valid(&self, row: isize, column: isize) -> bool {
        (0..isize::from(self.height)).contains(&row)
            && (0..isize::from(self.width)).contains(&column)
    }

    pub const fn contains(&self, (row, column): Coord2) -> bool {
        row < self.height && column < self.width
    }

    /// Linear index of in-range `coords`.
    pub fn cell_index(&self, coords: Coord2) -> CellIndex {
        debug_assert!(self.contains(coords), "{:?} is outside {:?}", coords, self);
        let (row, column) = coords;
        CellIndex::from(row) * CellIndex::from(self.width) + CellIndex::from(column)
    }

    /// `(row, column)` of an in-range linear `index`.
    pub fn coords(&self, index: CellIndex) -> Coord2 {
        debug_assert!(index < self.total_cells(), "{} is outside {:?}", index, self);
        let width = CellIndex::from(self.width);
        ((index / width) as Coord, (index % width) as Coord)
    }

    pub fn checked_index(&self, coords: Coord2) -> Result<CellIndex> {
        if self.contains(coords) {
            Ok(self.cell_index(coords))
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn checked_coords(&self, index: CellIndex) -> Result<Coord2> {
        if index < self.total_cells() {
            Ok(self.coords(index))
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    /// In-bounds cells around `coords`, not including `coords` itself.
    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, *self, &NEIGHBORS)
    }

    /// In-bounds 3x3 block centred on `coords`, the centre included.
    pub fn iter_block(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, *self, &BLOCK)
    }

    /// Every cell, in linear index order.
    pub fn iter_coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        let (height, width) = (self.height, self.width);
        (0..height).flat_map(move |row| (0..width).map(move |column| (row, column)))
    }
}

const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const BLOCK: [(isize, isize); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Grid) -> Option<Coord2> {
    let (row, column) = coords;
    let (d_row, d_column) = delta;

    let next_row = row.checked_add_signed(d_row.try_into().ok()?)?;
    let next_column = column.checked_add_signed(d_column.try_into().ok()?)?;

    bounds
        .contains((next_row, next_column))
        .then_some((next_row, next_column))
}

#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Grid,
    deltas: &'static [(isize, isize)],
    index: u8,
}

impl NeighborIter {
    fn new(center: Coord2, bounds: Grid, deltas: &'static [(isize, isize)]) -> Self {
        Self {
            center,
            bounds,
            deltas,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let delta = *self.deltas.get(usize::from(self.index))?;
            self.index += 1;

            if let Some(next_item) = apply_delta(self.center, delta, self.bounds) {
                return Some(next_item);
            }
        }
    }
}
