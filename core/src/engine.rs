use alloc::{vec, vec::Vec};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - NotStarted -> InProgress
/// - InProgress -> Won
/// - InProgress -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// No cell opened yet, mines not placed
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameState {
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::NotStarted)
    }

    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// One cell whose tile changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileUpdate {
    pub index: CellIndex,
    pub tile: Tile,
}

/// Result of a reveal: what happened and which tiles need redrawing.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealReport {
    pub outcome: RevealOutcome,
    pub state: GameState,
    pub changes: Vec<TileUpdate>,
}

/// Result of cycling a mark.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkReport {
    pub outcome: MarkOutcome,
    /// Mark now on the cell, `None` when the index is off the board.
    pub cell: Option<Cell>,
    /// `mines - flagged`, for the counter.
    pub flags_left: CellCount,
}

/// One game from first click to win or loss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    config: GameConfig,
    seed: u64,
    mine_layout: Option<MineLayout>,
    board: Array2<Cell>,
    closed_count: CellCount,
    flagged_count: CellCount,
    state: GameState,
    elapsed_secs: u32,
    triggered_mine: Option<CellIndex>,
}

impl Engine {
    /// New game, mines are placed by the first reveal using `seed`.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self::fresh(config, seed, None))
    }

    /// New game over mines that are already placed.
    pub fn with_layout(mine_layout: MineLayout) -> Result<Self> {
        let config = mine_layout.game_config();
        config.validate()?;
        Ok(Self::fresh(config, 0, Some(mine_layout)))
    }

    fn fresh(config: GameConfig, seed: u64, mine_layout: Option<MineLayout>) -> Self {
        Self {
            config,
            seed,
            mine_layout,
            board: Array2::default(config.grid().nd_dim()),
            closed_count: config.total_cells(),
            flagged_count: 0,
            state: Default::default(),
            elapsed_secs: 0,
            triggered_mine: None,
        }
    }

    /// Throws away the current game and starts over with `config`.
    pub fn initialize(&mut self, config: GameConfig, seed: u64) -> Result<()> {
        *self = Self::new(config, seed)?;
        Ok(())
    }

    /// Same board size and mine count, fresh mines.
    pub fn restart(&mut self, seed: u64) {
        log::debug!("Restarting {:?} game", self.state);
        *self = Self::fresh(self.config, seed, None);
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn grid(&self) -> Grid {
        self.config.grid()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_final()
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn flags_left(&self) -> CellCount {
        self.config.mines.saturating_sub(self.flagged_count)
    }

    pub fn closed_count(&self) -> CellCount {
        self.closed_count
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn triggered_mine(&self) -> Option<CellIndex> {
        self.triggered_mine
    }

    /// Whether the cell holds a mine, always `false` before mines are placed.
    pub fn has_mine(&self, index: CellIndex) -> bool {
        self.mine_layout
            .as_ref()
            .is_some_and(|layout| layout.is_mine(index))
    }

    /// Same as [`Engine::has_mine`], `false` off the board.
    pub fn has_mine_at(&self, coords: Coord2) -> bool {
        self.grid().contains(coords)
            && self
                .mine_layout
                .as_ref()
                .is_some_and(|layout| layout.contains_mine(coords))
    }

    /// Marking state of in-range `coords`, panics off the board. [`Engine::cell`] is the checked form.
    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.board[coords.to_nd_index()]
    }

    pub fn cell(&self, index: CellIndex) -> Option<Cell> {
        let coords = self.grid().checked_coords(index).ok()?;
        Some(self.cell_at(coords))
    }

    /// What to draw for in-range `coords`, including the mine map once the game is lost.
    ///
    /// Panics off the board, [`Engine::tile`] is the checked form.
    pub fn tile_at(&self, coords: Coord2) -> Tile {
        let cell = self.cell_at(coords);

        if !matches!(self.state, GameState::Lost) {
            return cell.into();
        }

        if self.triggered_mine == Some(self.grid().cell_index(coords)) {
            return Tile::Exploded;
        }

        match (cell, self.has_mine_at(coords)) {
            (Cell::Flagged, true) => Tile::Flag,
            (Cell::Flagged, false) => Tile::IncorrectFlag,
            (_, true) => Tile::Mine,
            (cell, false) => cell.into(),
        }
    }

    pub fn tile(&self, index: CellIndex) -> Option<Tile> {
        let coords = self.grid().checked_coords(index).ok()?;
        Some(self.tile_at(coords))
    }

    /// Advances the clock by one second while the game is running and returns the reading.
    pub fn tick(&mut self) -> u32 {
        if self.state.is_active() {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        }
        self.elapsed_secs
    }

    /// Opening move: places the mines so `index` is safe, then reveals it.
    ///
    /// No change once the game has started, later moves go through [`Engine::reveal`], which also accepts the opening
    /// move itself.
    pub fn reveal_first(&mut self, index: CellIndex) -> RevealReport {
        if !self.state.is_initial() {
            log::trace!("Ignoring opening move at {}, game is {:?}", index, self.state);
            return self.no_change();
        }
        self.reveal(index)
    }

    pub fn reveal(&mut self, index: CellIndex) -> RevealReport {
        match self.grid().checked_coords(index) {
            Ok(coords) => self.reveal_at(coords),
            Err(_) => {
                log::trace!("Ignoring reveal outside the board: {}", index);
                self.no_change()
            }
        }
    }

    pub fn reveal_at(&mut self, coords: Coord2) -> RevealReport {
        if !self.grid().contains(coords) {
            log::trace!("Ignoring reveal outside the board: {:?}", coords);
            return self.no_change();
        }

        if self.state.is_final() {
            log::trace!("Game already ended, ignoring reveal at {:?}", coords);
            return self.no_change();
        }

        if !self.cell_at(coords).is_revealable() {
            log::trace!("Cell at {:?} is {:?}, not revealable", coords, self.cell_at(coords));
            return self.no_change();
        }

        if self.state.is_initial() {
            self.start(coords);
        }

        self.open_from(coords)
    }

    /// Cycles Hidden -> Flagged -> Questioned -> Hidden.
    ///
    /// Flagging is refused once every mine has a flag, and revealed cells keep no marks.
    pub fn cycle_mark(&mut self, index: CellIndex) -> MarkReport {
        match self.grid().checked_coords(index) {
            Ok(coords) => self.mark_cell(coords),
            Err(_) => {
                log::trace!("Ignoring mark outside the board: {}", index);
                MarkReport {
                    outcome: MarkOutcome::NoChange,
                    cell: None,
                    flags_left: self.flags_left(),
                }
            }
        }
    }

    fn mark_cell(&mut self, coords: Coord2) -> MarkReport {
        let cell = self.cell_at(coords);

        let next = if self.state.is_final() {
            log::trace!("Game already ended, ignoring mark at {:?}", coords);
            None
        } else {
            match cell {
                Cell::Hidden if self.flagged_count >= self.config.mines => {
                    log::trace!("No flags left for {:?}", coords);
                    None
                }
                Cell::Hidden => Some(Cell::Flagged),
                Cell::Flagged => Some(Cell::Questioned),
                Cell::Questioned => Some(Cell::Hidden),
                Cell::Revealed(_) => None,
            }
        };

        let outcome = match next {
            Some(next) => {
                if cell == Cell::Flagged {
                    self.flagged_count -= 1;
                }
                if next == Cell::Flagged {
                    self.flagged_count += 1;
                }
                self.board[coords.to_nd_index()] = next;
                MarkOutcome::Changed
            }
            None => MarkOutcome::NoChange,
        };

        MarkReport {
            outcome,
            cell: Some(self.cell_at(coords)),
            flags_left: self.flags_left(),
        }
    }

    fn start(&mut self, first_move: Coord2) {
        let index = self.grid().cell_index(first_move);

        if self.mine_layout.is_none() {
            let layout = ShuffleLayoutGenerator::new(self.seed, index).generate(self.config);
            self.mine_layout = Some(layout);
        }

        self.state = GameState::InProgress;
        log::debug!("Game started at {:?}", first_move);
    }

    /// Opens `start` and cascades through zero cells with an explicit worklist.
    ///
    /// The win check runs on every single-cell reveal, right after the closed count drops and before the mine check.
    fn open_from(&mut self, start: Coord2) -> RevealReport {
        let grid = self.config.grid();
        let Some(layout) = self.mine_layout.as_ref() else {
            return self.no_change();
        };

        let mut outcome = RevealOutcome::NoChange;
        let mut changes = Vec::new();
        let mut to_visit = vec![start];

        while let Some(coords) = to_visit.pop() {
            // already revealed or flagged, this also covers the centre of a re-scanned block
            if !self.board[coords.to_nd_index()].is_revealable() {
                continue;
            }

            let index = grid.cell_index(coords);
            let is_mine = layout.contains_mine(coords);
            let adjacent_mines = layout.adjacent_mine_count(coords);
            self.board[coords.to_nd_index()] = Cell::Revealed(adjacent_mines);
            self.closed_count -= 1;
            outcome |= RevealOutcome::Revealed;
            log::trace!("Revealed {:?}, adjacent mines: {}", coords, adjacent_mines);

            if !is_mine && self.closed_count <= layout.mine_count() {
                changes.push(TileUpdate {
                    index,
                    tile: Tile::Open(adjacent_mines),
                });
                self.state = GameState::Won;
                outcome |= RevealOutcome::Won;
                log::debug!("Game won at {:?}", coords);
                break;
            }

            if is_mine {
                self.triggered_mine = Some(index);
                self.state = GameState::Lost;
                changes.extend(self.disclosure());
                outcome |= RevealOutcome::HitMine;
                log::debug!("Game lost at {:?}", coords);
                break;
            }

            changes.push(TileUpdate {
                index,
                tile: Tile::Open(adjacent_mines),
            });

            if adjacent_mines == 0 {
                to_visit.extend(grid.iter_block(coords));
            }
        }

        RevealReport {
            outcome,
            state: self.state,
            changes,
        }
    }

    /// Every mine and every flag, as drawn after a loss.
    fn disclosure(&self) -> impl Iterator<Item = TileUpdate> + '_ {
        let grid = self.grid();
        grid.iter_coords()
            .filter(|&coords| self.has_mine_at(coords) || self.cell_at(coords) == Cell::Flagged)
            .map(move |coords| TileUpdate {
                index: grid.cell_index(coords),
                tile: self.tile_at(coords),
            })
    }

    fn no_change(&self) -> RevealReport {
        RevealReport {
            outcome: RevealOutcome::NoChange,
            state: self.state,
            changes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: Coord, height: Coord, mines: &[CellIndex]) -> MineLayout {
        MineLayout::from_mine_indices(Grid::new(width, height), mines).unwrap()
    }

    fn engine(width: Coord, height: Coord, mines: &[CellIndex]) -> Engine {
        Engine::with_layout(layout(width, height, mines)).unwrap()
    }

    fn changed_indices(report: &RevealReport) -> Vec<CellIndex> {
        let mut indices: Vec<_> = report.changes.iter().map(|update| update.index).collect();
        indices.sort_unstable();
        indices
    }

    #[test]
    fn new_rejects_invalid_config() {
        assert_eq!(
            Engine::new(GameConfig::new_unchecked(2, 2, 4), 0).unwrap_err(),
            GameError::TooManyMines
        );
        assert_eq!(
            Engine::new(GameConfig::new_unchecked(2, 2, 0), 0).unwrap_err(),
            GameError::NoMines
        );
    }

    #[test]
    fn first_move_is_never_a_mine() {
        let config = GameConfig::classic();

        for seed in 0..32 {
            let mut engine = Engine::new(config, seed).unwrap();
            let first_move = (seed as CellIndex * 53) % config.total_cells();

            let report = engine.reveal(first_move);

            assert_ne!(report.outcome, RevealOutcome::HitMine);
            assert_ne!(engine.state(), GameState::NotStarted);
            assert!(!engine.has_mine(first_move));
            let mines = (0..config.total_cells())
                .filter(|&index| engine.has_mine(index))
                .count();
            assert_eq!(mines, usize::from(config.mines));
        }
    }

    #[test]
    fn single_mine_board_cascades_to_win() {
        let mut engine = engine(4, 4, &[15]);

        let report = engine.reveal(0);

        assert_eq!(report.outcome, RevealOutcome::Won);
        assert_eq!(report.state, GameState::Won);
        assert_eq!(changed_indices(&report), (0..15).collect::<Vec<CellIndex>>());
        assert_eq!(engine.cell(15), Some(Cell::Hidden));
        assert_eq!(engine.closed_count(), 1);
        assert_eq!(engine.tile(10), Some(Tile::Open(1)));
        assert_eq!(engine.tile(0), Some(Tile::Open(0)));
    }

    #[test]
    fn three_adjacent_mines_show_count_without_cascade() {
        let mut engine = engine(3, 3, &[0, 1, 2]);

        let report = engine.reveal_at((1, 1));

        assert_eq!(report.outcome, RevealOutcome::Revealed);
        assert_eq!(
            report.changes,
            [TileUpdate {
                index: 4,
                tile: Tile::Open(3)
            }]
        );
        assert_eq!(engine.closed_count(), 8);
        assert_eq!(engine.state(), GameState::InProgress);
    }

    #[test]
    fn revealing_mine_loses_and_discloses_flags() {
        let mut engine = engine(3, 3, &[0, 8]);

        assert_eq!(engine.reveal(4).outcome, RevealOutcome::Revealed);
        assert_eq!(engine.cycle_mark(0).cell, Some(Cell::Flagged));
        assert_eq!(engine.cycle_mark(2).cell, Some(Cell::Flagged));

        let report = engine.reveal(8);

        assert_eq!(report.outcome, RevealOutcome::HitMine);
        assert_eq!(report.state, GameState::Lost);
        assert_eq!(engine.triggered_mine(), Some(8));
        assert_eq!(
            report.changes,
            [
                TileUpdate {
                    index: 0,
                    tile: Tile::Flag
                },
                TileUpdate {
                    index: 2,
                    tile: Tile::IncorrectFlag
                },
                TileUpdate {
                    index: 8,
                    tile: Tile::Exploded
                },
            ]
        );
        assert_eq!(engine.tile(4), Some(Tile::Open(2)));
        assert_eq!(engine.tile(3), Some(Tile::Closed));
        // the disclosure is display-only
        assert_eq!(engine.cell(2), Some(Cell::Flagged));
    }

    #[test]
    fn mine_hit_with_one_safe_cell_left_is_a_loss() {
        let mut engine = engine(4, 1, &[0, 3]);

        assert_eq!(engine.cycle_mark(3).cell, Some(Cell::Flagged));
        assert_eq!(engine.cycle_mark(3).cell, Some(Cell::Questioned));
        assert_eq!(engine.reveal(1).outcome, RevealOutcome::Revealed);
        assert_eq!(engine.closed_count(), 3);

        let report = engine.reveal(0);

        assert_eq!(report.outcome, RevealOutcome::HitMine);
        assert_eq!(engine.state(), GameState::Lost);
        assert_eq!(
            report.changes,
            [
                TileUpdate {
                    index: 0,
                    tile: Tile::Exploded
                },
                TileUpdate {
                    index: 3,
                    tile: Tile::Mine
                },
            ]
        );
    }

    #[test]
    fn closed_count_only_drops_on_real_reveals() {
        let mut engine = engine(4, 1, &[0, 3]);

        engine.reveal(1);
        assert_eq!(engine.closed_count(), 3);

        assert_eq!(engine.reveal(1).outcome, RevealOutcome::NoChange);
        assert_eq!(engine.reveal(99).outcome, RevealOutcome::NoChange);
        assert_eq!(engine.reveal_at((1, 0)).outcome, RevealOutcome::NoChange);
        engine.cycle_mark(2);
        assert_eq!(engine.reveal(2).outcome, RevealOutcome::NoChange);

        assert_eq!(engine.closed_count(), 3);
    }

    #[test]
    fn flood_fill_stops_at_flags() {
        let mut engine = engine(5, 1, &[4]);

        engine.cycle_mark(2);
        let report = engine.reveal(0);

        assert_eq!(changed_indices(&report), [0, 1]);
        assert_eq!(engine.cell(2), Some(Cell::Flagged));
        assert_eq!(engine.state(), GameState::InProgress);

        assert_eq!(engine.cycle_mark(2).cell, Some(Cell::Questioned));
        let report = engine.reveal(2);

        assert_eq!(report.outcome, RevealOutcome::Won);
        assert_eq!(changed_indices(&report), [2, 3]);
        assert_eq!(engine.tile(3), Some(Tile::Open(1)));
    }

    #[test]
    fn flood_fill_reveals_closure_and_never_a_mine() {
        let config = GameConfig::classic();

        for seed in 0..16 {
            let mut engine = Engine::new(config, seed).unwrap();
            engine.reveal(0);
            let grid = engine.grid();

            for coords in grid.iter_coords() {
                match engine.cell_at(coords) {
                    Cell::Revealed(0) => {
                        assert!(!engine.has_mine_at(coords));
                        for pos in grid.iter_neighbors(coords) {
                            assert!(!engine.cell_at(pos).is_closed(), "{:?} left closed", pos);
                        }
                    }
                    Cell::Revealed(_) => assert!(!engine.has_mine_at(coords)),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn finished_game_ignores_moves() {
        let mut engine = engine(4, 4, &[15]);
        engine.reveal(0);

        assert_eq!(engine.reveal(15).outcome, RevealOutcome::NoChange);
        let mark = engine.cycle_mark(15);
        assert_eq!(mark.outcome, MarkOutcome::NoChange);
        assert_eq!(mark.cell, Some(Cell::Hidden));
        assert_eq!(engine.state(), GameState::Won);
    }

    #[test]
    fn lost_game_ignores_moves() {
        let mut engine = engine(3, 3, &[0, 8]);
        engine.reveal(4);
        engine.cycle_mark(1);
        assert_eq!(engine.reveal(0).outcome, RevealOutcome::HitMine);
        let closed = engine.closed_count();

        assert_eq!(engine.reveal(2).outcome, RevealOutcome::NoChange);
        assert_eq!(engine.reveal(8).outcome, RevealOutcome::NoChange);

        let flagged = engine.cycle_mark(1);
        assert_eq!(flagged.outcome, MarkOutcome::NoChange);
        assert_eq!(flagged.cell, Some(Cell::Flagged));
        let hidden = engine.cycle_mark(3);
        assert_eq!(hidden.outcome, MarkOutcome::NoChange);
        assert_eq!(hidden.cell, Some(Cell::Hidden));

        assert_eq!(engine.state(), GameState::Lost);
        assert_eq!(engine.closed_count(), closed);
        assert_eq!(engine.tile(0), Some(Tile::Exploded));
        assert_eq!(engine.tile(1), Some(Tile::IncorrectFlag));
        assert_eq!(engine.tile(8), Some(Tile::Mine));
        assert_eq!(engine.tile(2), Some(Tile::Closed));
    }

    #[test]
    fn off_board_queries_are_checked() {
        let mut engine = engine(3, 3, &[0, 8]);
        engine.reveal(4);

        assert_eq!(engine.cell(9), None);
        assert_eq!(engine.tile(9), None);
        assert!(!engine.has_mine(9));
        assert!(!engine.has_mine_at((3, 0)));
        assert!(!engine.has_mine_at((0, 3)));
        assert!(engine.has_mine_at((2, 2)));
    }

    #[test]
    fn flag_budget_caps_flags() {
        let mut engine = engine(3, 3, &[0, 8]);

        assert_eq!(engine.cycle_mark(1).flags_left, 1);
        assert_eq!(engine.cycle_mark(2).flags_left, 0);

        let refused = engine.cycle_mark(3);
        assert_eq!(refused.outcome, MarkOutcome::NoChange);
        assert_eq!(refused.cell, Some(Cell::Hidden));
        assert_eq!(refused.flags_left, 0);

        assert_eq!(engine.cycle_mark(1).cell, Some(Cell::Questioned));
        let accepted = engine.cycle_mark(3);
        assert_eq!(accepted.cell, Some(Cell::Flagged));
        assert_eq!(accepted.flags_left, 0);
    }

    #[test]
    fn marks_cycle_and_skip_revealed_cells() {
        let mut engine = engine(3, 3, &[0, 8]);

        assert_eq!(engine.cycle_mark(5).cell, Some(Cell::Flagged));
        assert_eq!(engine.cycle_mark(5).cell, Some(Cell::Questioned));
        assert_eq!(engine.cycle_mark(5).cell, Some(Cell::Hidden));
        assert_eq!(engine.flags_left(), 2);

        engine.reveal(4);
        let mark = engine.cycle_mark(4);
        assert_eq!(mark.outcome, MarkOutcome::NoChange);
        assert_eq!(mark.cell, Some(Cell::Revealed(2)));

        assert_eq!(engine.cycle_mark(9).cell, None);
    }

    #[test]
    fn reveal_first_only_opens_the_game() {
        let mut engine = Engine::new(GameConfig::new_unchecked(9, 9, 10), 3).unwrap();

        assert!(engine.reveal_first(40).outcome.has_update());
        assert_eq!(engine.reveal_first(0).outcome, RevealOutcome::NoChange);
    }

    #[test]
    fn clock_runs_only_while_in_progress() {
        let mut engine = engine(4, 1, &[0, 3]);

        assert_eq!(engine.tick(), 0);
        engine.reveal(1);
        assert_eq!(engine.elapsed_secs(), 0);
        engine.tick();
        engine.tick();
        assert_eq!(engine.tick(), 3);

        engine.reveal(0);
        assert_eq!(engine.tick(), 3);
        assert_eq!(engine.elapsed_secs(), 3);
    }

    #[test]
    fn restart_clears_everything() {
        let mut engine = Engine::new(GameConfig::classic(), 1).unwrap();
        engine.reveal(0);
        engine.tick();

        engine.restart(2);

        assert_eq!(engine.state(), GameState::NotStarted);
        assert_eq!(engine.closed_count(), 256);
        assert_eq!(engine.elapsed_secs(), 0);
        assert_eq!(engine.flags_left(), 40);
        assert!((0..256).all(|index| !engine.has_mine(index)));
    }

    #[test]
    fn initialize_keeps_game_on_bad_config() {
        let mut engine = engine(4, 1, &[0, 3]);
        engine.reveal(1);

        assert_eq!(
            engine.initialize(GameConfig::new_unchecked(2, 2, 4), 0),
            Err(GameError::TooManyMines)
        );
        assert_eq!(engine.state(), GameState::InProgress);

        assert_eq!(engine.initialize(GameConfig::new_unchecked(5, 5, 3), 0), Ok(()));
        assert_eq!(engine.grid(), Grid::new(5, 5));
        assert_eq!(engine.state(), GameState::NotStarted);
    }
}
