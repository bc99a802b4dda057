use clap::Parser;
use wasm_bindgen::prelude::*;

mod game;
mod utils;

/// Options read from the page's location hash, e.g. `#-vv&--seed=42`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Replay the same mine placement on every new game
    #[arg(short, long)]
    seed: Option<u64>,
}

impl Args {
    fn from_location_hash(hash: &str) -> Result<Self, clap::Error> {
        // the empty piece before `#` stands in for the binary name
        Self::try_parse_from(hash.split(['#', '&']))
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let hash = window().location().hash().unwrap_or_default();
    let args = match Args::from_location_hash(&hash) {
        Ok(args) => args,
        Err(err) => {
            gloo::console::warn!(format!("ignoring location hash {:?}: {}", hash, err));
            Args::from_location_hash("").expect("no arguments always parse")
        }
    };

    if let Some(level) = args.verbose.log_level() {
        console_log::init_with_level(level).expect("Error initializing logger");
    }

    let Some(root) = document().get_element_by_id("game") else {
        log::error!("No id=\"game\" element to mount on");
        return;
    };

    log::info!("Mounting minefield, seed: {:?}", args.seed);
    let props = game::GameProps { seed: args.seed };
    yew::Renderer::<game::GameView>::with_root_and_props(root, props).render();
}
