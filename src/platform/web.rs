//! wasm-bindgen bridge for JavaScript game engines
//!
//! The engine owns physics and rendering. Every frame it hands over its
//! input and trigger events as JSON and gets back the world commands the
//! director issued (spawns, removals, HUD, cues), also as JSON.

use wasm_bindgen::prelude::*;

use crate::highscores::HighScores;
use crate::sim::{RecordingWorld, RunState, TickInput, TriggerEvent, tick};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already initialized");
    }
}

/// One run, driven from JavaScript
#[wasm_bindgen]
pub struct WebDirector {
    state: RunState,
    world: RecordingWorld,
}

#[wasm_bindgen]
impl WebDirector {
    /// Start a run. Without a seed the current time is used; without tuning
    /// JSON the defaults are used.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<f64>, tuning_json: Option<String>) -> Result<WebDirector, JsError> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json)?,
            None => Tuning::default(),
        };
        let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;
        let mut world = RecordingWorld::new();
        let state = RunState::new(seed, tuning, &mut world);
        Ok(Self { state, world })
    }

    /// Advance one frame; returns the commands issued since the last call
    pub fn tick(&mut self, input_json: &str, events_json: &str) -> Result<String, JsError> {
        let input: TickInput = serde_json::from_str(input_json)?;
        let events: Vec<TriggerEvent> = if events_json.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(events_json)?
        };
        tick(&mut self.state, &input, &events, &mut self.world);
        self.drain_commands()
    }

    /// Commands issued so far (e.g. the opening platforms) as a JSON array
    #[wasm_bindgen(js_name = drainCommands)]
    pub fn drain_commands(&mut self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.world.drain())?)
    }

    #[wasm_bindgen(js_name = isOver)]
    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn seed(&self) -> f64 {
        self.state.seed as f64
    }

    /// Run summary JSON once the run has ended
    pub fn summary(&self) -> Result<Option<String>, JsError> {
        self.state
            .summary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(JsError::from)
    }
}

/// Add a run to a leaderboard held as JSON by the host
///
/// Returns the updated board JSON; the rank is logged.
#[wasm_bindgen(js_name = recordHighScore)]
pub fn record_high_score(board_json: &str, name: &str, score: f64, height: u32) -> String {
    let mut board = HighScores::from_json(board_json);
    let score = if score.is_finite() && score > 0.0 { score as u64 } else { 0 };
    match board.add_score(name, score, height) {
        Some(rank) => log::info!("Leaderboard rank {}", rank),
        None => log::info!("Score {} did not make the leaderboard", score),
    }
    board.to_json()
}
