use alloc::vec::Vec;

use super::*;

/// Shuffles every cell index and keeps the first `mines` of them, after taking the first move out of the deck.
///
/// Removing one element from a uniformly shuffled sequence leaves the rest uniform, so no resampling is needed.
#[derive(Clone, Debug, PartialEq)]
pub struct ShuffleLayoutGenerator {
    seed: u64,
    first_move: CellIndex,
}

impl ShuffleLayoutGenerator {
    pub fn new(seed: u64, first_move: CellIndex) -> Self {
        Self { seed, first_move }
    }
}

impl LayoutGenerator for ShuffleLayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};

        let grid = config.grid();
        let mut deck: Vec<CellIndex> = (0..grid.total_cells()).collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        deck.shuffle(&mut rng);

        match deck.iter().position(|&index| index == self.first_move) {
            Some(position) => {
                deck.remove(position);
            }
            None => log::warn!(
                "First move {} is outside the board, no cell is kept safe",
                self.first_move
            ),
        }

        if usize::from(config.mines) > deck.len() {
            log::warn!(
                "Minefield already full, generated anyway, requested {} but only fits {}",
                config.mines,
                deck.len()
            );
        }
        deck.truncate(config.mines.into());

        let layout = MineLayout::from_valid_indices(grid, &deck);

        // double check mine count
        if layout.mine_count() != config.mines {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                config.mines
            );
        }
        log::debug!(
            "Placed {} mines on {}x{} avoiding {}",
            layout.mine_count(),
            grid.width(),
            grid.height(),
            self.first_move
        );
        layout
    }
}
