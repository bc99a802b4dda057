use crate::utils::*;
use bitflags::bitflags;
use gloo::timers::callback::Interval;
use minefield_core as game;
use serde::{Deserialize, Serialize};
use yew::prelude::*;

/// The clock moves once per second.
const TICK_MILLIS: u32 = 1_000;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Face {
    Basic,
    Pressed,
    Winner,
    Loser,
}

impl Face {
    fn for_state(state: game::GameState, pressing: bool) -> Self {
        use game::GameState::*;
        match state {
            Won => Self::Winner,
            Lost => Self::Loser,
            NotStarted | InProgress if pressing => Self::Pressed,
            NotStarted | InProgress => Self::Basic,
        }
    }

    const fn emoji(self) -> &'static str {
        match self {
            Self::Basic => "\u{1F642}",
            Self::Pressed => "\u{1F632}",
            Self::Winner => "\u{1F60E}",
            Self::Loser => "\u{1F61E}",
        }
    }
}

const MINE: &str = "\u{1F4A3}";
const FLAG: &str = "\u{1F6A9}";
const QUESTION_MARK: &str = "\u{2754}";

const fn number_color(count: u8) -> Option<&'static str> {
    match count {
        1 => Some("#0000ff"),
        2 => Some("#00ff00"),
        3 => Some("#ff0000"),
        4 => Some("#7100a5"),
        5 => Some("#880020"),
        6 => Some("#00b3aa"),
        7 => Some("#000000"),
        8 => Some("#4a4a4a"),
        _ => None,
    }
}

fn tile_label(tile: game::Tile) -> String {
    use game::Tile::*;
    match tile {
        Closed | Open(0) => String::new(),
        Open(count) => count.to_string(),
        Flag => FLAG.to_string(),
        Question => QUESTION_MARK.to_string(),
        Exploded | Mine | IncorrectFlag => MINE.to_string(),
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct MouseButtons: u16 {
        const LEFT    = 1;
        const RIGHT   = 1 << 1;
        const MIDDLE  = 1 << 2;
        const BACK    = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CellPointerState {
    index: game::CellIndex,
    buttons: MouseButtons,
}

impl CellPointerState {
    /// Move made when every button held in this state is released over the cell.
    fn release_action(self) -> Option<CellAction> {
        if self.buttons == MouseButtons::LEFT {
            Some(CellAction::Reveal(self.index))
        } else if self.buttons == MouseButtons::RIGHT {
            Some(CellAction::Mark(self.index))
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CellAction {
    Reveal(game::CellIndex),
    Mark(game::CellIndex),
}

/// The clock ticks only between the first reveal and the end of the game.
const fn wants_timer(state: game::GameState) -> bool {
    state.is_active()
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum CellMsg {
    Update(CellPointerState),
    Leave,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Msg {
    CellEvent(CellMsg),
    Tick,
    NewGame,
}

#[derive(Properties, Clone, PartialEq)]
struct CellProps {
    index: game::CellIndex,
    tile: game::Tile,
    callback: Callback<CellMsg>,
}

#[function_component(CellView)]
fn cell_component(props: &CellProps) -> Html {
    use game::Tile::*;

    let CellProps {
        index,
        tile,
        callback,
    } = props.clone();

    let class = classes!(
        "cell",
        match tile {
            Closed => classes!(),
            Open(count) => classes!("open", format!("num-{}", count)),
            Flag => classes!("flag"),
            Question => classes!("question"),
            Exploded => classes!("open", "mine", "oops"),
            Mine => classes!("open", "mine"),
            IncorrectFlag => classes!("flag", "wrong"),
        }
    );
    let style = match tile {
        Open(count) => number_color(count).map(|color| format!("color: {}", color)),
        _ => None,
    };
    let label = tile_label(tile);

    let onmousedown = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            let buttons = MouseButtons::from_bits_truncate(e.buttons());
            callback.emit(CellMsg::Update(CellPointerState { index, buttons }));
            log::trace!("{} mouse down ({:?})", index, buttons);
        })
    };

    let onmouseup = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            let buttons = MouseButtons::from_bits_truncate(e.buttons());
            callback.emit(CellMsg::Update(CellPointerState { index, buttons }));
            log::trace!("{} mouse up ({:?})", index, buttons);
        })
    };

    let onmouseleave = {
        let callback = callback.clone();
        Callback::from(move |_: MouseEvent| {
            callback.emit(CellMsg::Leave);
            log::trace!("{} mouse leave", index);
        })
    };

    html! {
        <td {class} {style} {onmousedown} {onmouseup} {onmouseleave}>{label}</td>
    }
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[prop_or_default]
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub(crate) struct GameView {
    engine: game::Engine,
    forced_seed: Option<u64>,
    current_cell_state: Option<CellPointerState>,
    timer_interval: Option<Interval>,
}

impl GameView {
    fn new_engine(seed: u64) -> game::Engine {
        game::Engine::new(game::GameConfig::classic(), seed)
            .expect("classic board is a valid configuration")
    }

    fn next_seed(&self) -> u64 {
        self.forced_seed.unwrap_or_else(js_random_seed)
    }

    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(TICK_MILLIS, move || link.send_message(Msg::Tick))
    }

    /// One running interval while the game is in progress, none otherwise. Dropping the handle cancels it.
    fn sync_timer(&mut self, ctx: &Context<Self>) {
        match (wants_timer(self.engine.state()), self.timer_interval.is_some()) {
            (true, false) => {
                log::debug!("timer started");
                self.timer_interval = Some(Self::create_timer(ctx));
            }
            (false, true) => {
                self.timer_interval = None;
                log::debug!("timer stopped at {}s", self.engine.elapsed_secs());
            }
            _ => {}
        }
    }

    fn reveal_cell(&mut self, index: game::CellIndex) {
        let report = self.engine.reveal(index);
        log::debug!(
            "reveal {}: {:?}, {} tiles changed",
            index,
            report.outcome,
            report.changes.len()
        );
    }

    fn mark_cell(&mut self, index: game::CellIndex) {
        let report = self.engine.cycle_mark(index);
        log::debug!(
            "mark {}: {:?}, {} flags left",
            index,
            report.cell,
            report.flags_left
        );
    }

    fn is_pressing(&self) -> bool {
        self.current_cell_state
            .is_some_and(|state| !state.buttons.is_empty())
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let forced_seed = ctx.props().seed;
        Self {
            engine: Self::new_engine(forced_seed.unwrap_or_else(js_random_seed)),
            forced_seed,
            current_cell_state: None,
            timer_interval: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use CellMsg::*;
        use Msg::*;

        let updated = match msg {
            CellEvent(Leave) => {
                log::trace!("cell leave");
                self.current_cell_state.take().is_some()
            }
            CellEvent(Update(cell_state)) if cell_state.buttons.is_empty() => {
                match self.current_cell_state.take() {
                    None => false,
                    Some(pressed) => {
                        match pressed.release_action() {
                            Some(CellAction::Reveal(index)) => self.reveal_cell(index),
                            Some(CellAction::Mark(index)) => self.mark_cell(index),
                            None => log::trace!("chord {:?} released", pressed.buttons),
                        }
                        true
                    }
                }
            }
            CellEvent(Update(cell_state)) => {
                log::trace!("cell update: {:?}", cell_state);
                self.current_cell_state.replace(cell_state) != Some(cell_state)
            }
            Tick => {
                let before = self.engine.elapsed_secs();
                self.engine.tick() != before
            }
            NewGame => {
                let seed = self.next_seed();
                self.engine.restart(seed);
                self.current_cell_state = None;
                true
            }
        };

        self.sync_timer(ctx);
        updated
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let grid = self.engine.grid();
        let face = Face::for_state(self.engine.state(), self.is_pressing());
        let flags_left = format_for_counter(i32::from(self.engine.flags_left()));
        let elapsed_time =
            format_for_counter(self.engine.elapsed_secs().try_into().unwrap_or(i32::MAX));
        let is_playable = !self.engine.is_finished();

        let cb_new_game = ctx.link().callback(|e: MouseEvent| {
            e.stop_propagation();
            Msg::NewGame
        });
        let callback = ctx.link().callback(Msg::CellEvent);

        html! {
            <div class="minefield" oncontextmenu={Callback::from(move |e: MouseEvent| e.prevent_default())}>
                <nav>
                    <aside>{flags_left}</aside>
                    <span><button class="face" onclick={cb_new_game}>{face.emoji()}</button></span>
                    <aside>{elapsed_time}</aside>
                </nav>
                <table class={is_playable.then_some("playable")}>
                    {
                        for (0..grid.height()).map(|row| html! {
                            <tr>
                                {
                                    for (0..grid.width()).map(|column| {
                                        let coords = (row, column);
                                        let index = grid.cell_index(coords);
                                        let tile = self.engine.tile_at(coords);
                                        let callback = callback.clone();
                                        html! {
                                            <CellView {index} {tile} {callback}/>
                                        }
                                    })
                                }
                            </tr>
                        })
                    }
                </table>
            </div>
        }
    }
}
