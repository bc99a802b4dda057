use crate::*;
pub use shuffle::*;

mod shuffle;

pub trait LayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout;
}
