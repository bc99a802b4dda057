use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board must have at least one cell")]
    EmptyBoard,
    #[error("At least one mine is required")]
    NoMines,
    #[error("Too many mines, at least one cell must be safe")]
    TooManyMines,
}

pub type Result<T> = core::result::Result<T, GameError>;
