#![no_std]

extern crate alloc;

use core::ops::{BitOr, BitOrAssign, Index};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use grid::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod generator;
mod grid;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }

    pub fn new(width: Coord, height: Coord, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(width, height, mines);
        config.validate()?;
        Ok(config)
    }

    /// The fixed 16x16 board with 40 mines.
    pub const fn classic() -> Self {
        Self::new_unchecked(16, 16, 40)
    }

    /// Requires a non-empty board and `0 < mines < width * height`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::EmptyBoard);
        }
        if self.mines == 0 {
            return Err(GameError::NoMines);
        }
        if self.mines >= self.total_cells() {
            return Err(GameError::TooManyMines);
        }
        Ok(())
    }

    pub const fn grid(&self) -> Grid {
        Grid::new(self.width, self.height)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::classic()
    }
}

/// Where the mines are. Fixed for the whole game once placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    grid: Grid,
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_indices(grid: Grid, mine_indices: &[CellIndex]) -> Result<Self> {
        for &index in mine_indices {
            grid.checked_coords(index)?;
        }
        Ok(Self::from_valid_indices(grid, mine_indices))
    }

    pub fn from_mine_coords(grid: Grid, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(grid.nd_dim());

        for &coords in mine_coords {
            grid.checked_index(coords)?;
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(grid, mine_mask))
    }

    /// Indices must already be known to be on the board.
    pub(crate) fn from_valid_indices(grid: Grid, mine_indices: &[CellIndex]) -> Self {
        let mut mine_mask: Array2<bool> = Array2::default(grid.nd_dim());

        for &index in mine_indices {
            mine_mask[grid.coords(index).to_nd_index()] = true;
        }

        Self::from_mine_mask(grid, mine_mask)
    }

    fn from_mine_mask(grid: Grid, mine_mask: Array2<bool>) -> Self {
        // duplicates collapse into one mine, count what actually landed
        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count() as CellCount;
        Self {
            grid,
            mine_mask,
            mine_count,
        }
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.grid.width(), self.grid.height(), self.mine_count)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.grid.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn is_mine(&self, index: CellIndex) -> bool {
        self.grid
            .checked_coords(index)
            .is_ok_and(|coords| self.contains_mine(coords))
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.grid
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count() as u8
    }

    /// Linear indices of every mine, ascending.
    pub fn iter_mines(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.grid
            .iter_coords()
            .filter(|&coords| self[coords])
            .map(|coords| self.grid.cell_index(coords))
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}

/// Used to merge per-cell outcomes during a cascade
impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (HitMine, _) => HitMine,
            (_, HitMine) => HitMine,
            (Won, _) => Won,
            (_, Won) => Won,
            (Revealed, _) => Revealed,
            (_, Revealed) => Revealed,
            (NoChange, NoChange) => NoChange,
        }
    }
}

impl BitOrAssign for RevealOutcome {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}
