use serde::{Deserialize, Serialize};

/// Marking state the engine keeps for every cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Hidden,
    /// Opened, carrying the number of adjacent mines.
    Revealed(u8),
    Flagged,
    Questioned,
}

impl Cell {
    /// Hidden and question-marked cells can be opened, flagged ones must be unmarked first.
    pub const fn is_revealable(self) -> bool {
        matches!(self, Self::Hidden | Self::Questioned)
    }

    pub const fn is_closed(self) -> bool {
        !matches!(self, Self::Revealed(_))
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Visual marker for a cell, what the presentation layer draws.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Closed,
    /// Opened cell, `Open(0)` draws blank.
    Open(u8),
    Flag,
    Question,
    // these are only used to show result after the game is lost:
    Exploded,
    Mine,
    IncorrectFlag,
}

impl Tile {
    // whether the tile is visually closed
    pub const fn is_closed(self) -> bool {
        use Tile::*;
        match self {
            Closed => true,
            Open(_) => false,
            Flag => true,
            Question => true,
            Exploded => false,
            Mine => false,
            IncorrectFlag => true,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::Closed
    }
}

impl From<Cell> for Tile {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Hidden => Tile::Closed,
            Cell::Revealed(count) => Tile::Open(count),
            Cell::Flagged => Tile::Flag,
            Cell::Questioned => Tile::Question,
        }
    }
}
