//! Starfall Survivors entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use starfall_survivors::audio::AudioManager;
    use starfall_survivors::consts::FRAME_DT;
    use starfall_survivors::renderer::{CanvasRenderer, layout};
    use starfall_survivors::sim::{GameState, RunPhase, TickInput, snapshot, tick};
    use starfall_survivors::{GameError, Settings, Tuning};

    const CANVAS_ID: &str = "canvas";
    const TUNING_ID: &str = "tuning";

    /// Movement keys currently held
    #[derive(Default)]
    struct HeldKeys {
        up: bool,
        down: bool,
        left: bool,
        right: bool,
    }

    impl HeldKeys {
        fn movement(&self) -> Vec2 {
            let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
            Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
        }

        /// Returns false for keys that are not movement keys
        fn set(&mut self, key: &str, down: bool) -> bool {
            match key {
                "w" | "W" | "ArrowUp" => self.up = down,
                "s" | "S" | "ArrowDown" => self.down = down,
                "a" | "A" | "ArrowLeft" => self.left = down,
                "d" | "D" | "ArrowRight" => self.right = down,
                _ => return false,
            }
            true
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        renderer: CanvasRenderer,
        audio: AudioManager,
        settings: Settings,
        keys: HeldKeys,
        input: TickInput,
        last_time: f64,
        last_phase: RunPhase,
    }

    impl Game {
        /// One rendered frame: tick, play sounds, draw
        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                FRAME_DT
            };
            self.last_time = time;

            self.input.now_ms = time;
            self.input.movement = self.keys.movement();
            let input = self.input.clone();
            tick(&mut self.state, &input, dt);

            // Clear one-shot inputs after processing
            self.input.confirm = false;
            self.input.nav_left = false;
            self.input.nav_right = false;
            self.input.pause = false;
            self.input.reset = false;
            self.input.pick_offer = None;

            for event in self.state.drain_events() {
                self.audio.play(&event);
            }

            if self.state.phase != self.last_phase {
                log::debug!("Phase {:?} -> {:?}", self.last_phase, self.state.phase);
                self.last_phase = self.state.phase;
            }

            self.renderer.draw(&snapshot(&self.state));
        }

        fn key_down(&mut self, key: &str) {
            self.audio.unlock();
            match key {
                "Enter" | " " => self.input.confirm = true,
                "Escape" | "p" | "P" => self.input.pause = true,
                "r" | "R" => self.input.reset = true,
                "1" | "2" | "3" => {
                    self.input.pick_offer = key.parse::<usize>().ok().map(|n| n - 1);
                }
                "i" | "I" => {
                    self.input.autoplay = !self.input.autoplay;
                    log::info!("Autoplay: {}", self.input.autoplay);
                }
                "m" | "M" => {
                    self.settings.muted = !self.settings.muted;
                    self.settings.save();
                    self.audio.apply_settings(&self.settings);
                }
                _ => {}
            }
            // Left/right double as menu navigation
            match key {
                "a" | "A" | "ArrowLeft" => self.input.nav_left = true,
                "d" | "D" | "ArrowRight" => self.input.nav_right = true,
                _ => {}
            }
        }

        fn click(&mut self, point: Vec2) {
            self.audio.unlock();
            if self.state.phase != RunPhase::PausedForUpgrade {
                return;
            }
            let arena = Vec2::new(self.state.tuning.arena.width, self.state.tuning.arena.height);
            self.input.pick_offer = layout::card_at(arena, self.state.draft.offers.len(), point);
        }

        fn blur(&mut self) {
            self.keys = HeldKeys::default();
            if self.settings.auto_pause_on_blur && self.state.phase == RunPhase::Playing {
                self.input.pause = true;
                log::info!("Auto-paused (window blur)");
            }
        }
    }

    /// Tuning from an inline `<script id="tuning" type="application/json">`,
    /// defaults if absent or invalid
    fn load_tuning(document: &web_sys::Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id(TUNING_ID)
            .and_then(|el| el.text_content())
        else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("{e}; using default tuning");
                Tuning::default()
            }
        }
    }

    pub fn run() -> Result<(), GameError> {
        log::info!("Starfall Survivors starting...");

        let missing = |id: &str| GameError::MissingRenderTarget { id: id.to_string() };
        let window = web_sys::window().ok_or_else(|| missing("window"))?;
        let document = window.document().ok_or_else(|| missing("document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| missing(CANVAS_ID))?
            .dyn_into()
            .map_err(|_| missing(CANVAS_ID))?;

        let tuning = load_tuning(&document);
        let arena = Vec2::new(tuning.arena.width, tuning.arena.height);
        let renderer = CanvasRenderer::new(canvas.clone(), arena)?;
        let settings = Settings::load();

        let seed = js_sys::Date::now() as u64;
        let state = GameState::new(seed, tuning);
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            last_phase: state.phase,
            state,
            renderer,
            audio: AudioManager::new(&settings),
            settings,
            keys: HeldKeys::default(),
            input: TickInput::default(),
            last_time: 0.0,
        }));

        setup_input_handlers(&window, &canvas, game.clone());
        request_animation_frame(game);

        log::info!("Starfall Survivors running!");
        Ok(())
    }

    fn setup_input_handlers(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) {
        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                let mut g = game.borrow_mut();
                if g.keys.set(&key, true) {
                    event.prevent_default();
                }
                if !event.repeat() {
                    g.key_down(&key);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().keys.set(&event.key(), false);
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click - pick an upgrade card
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let point = g
                    .renderer
                    .to_arena(event.offset_x() as f64, event.offset_y() as f64);
                g.click(point);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur (click outside, tab switch)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().blur();
            });
            let _ = window
                .add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    if let Err(e) = wasm_game::run() {
        log::error!("{e}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Starfall Survivors (native) starting...");
    log::info!("Native mode runs a headless autoplay demo - use `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    headless::run(seed, headless::MAX_TICKS);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Seeded autoplay run without a window
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use starfall_survivors::Tuning;
    use starfall_survivors::consts::FRAME_DT;
    use starfall_survivors::format_timer;
    use starfall_survivors::sim::{GameEvent, GameState, RunPhase, TickInput, tick};

    /// Five simulated minutes at 60 fps
    pub const MAX_TICKS: u32 = 60 * 60 * 5;

    pub fn run(seed: u64, max_ticks: u32) {
        let mut state = GameState::new(seed, Tuning::default());
        let mut input = TickInput {
            autoplay: true,
            ..TickInput::default()
        };
        let mut shots = 0u32;
        let mut level_ups = 0u32;

        for frame in 0..max_ticks {
            input.now_ms = frame as f64 * FRAME_DT as f64 * 1000.0;
            tick(&mut state, &input, FRAME_DT);
            for event in state.drain_events() {
                match event {
                    GameEvent::ShotFired => shots += 1,
                    GameEvent::LevelUp { .. } => level_ups += 1,
                    _ => {}
                }
            }
            if state.phase == RunPhase::GameOver {
                break;
            }
        }

        let outcome = if state.phase == RunPhase::GameOver {
            "died"
        } else {
            "survived"
        };
        log::info!(
            "Seed {}: {} after {} at level {} ({} level-ups), {} kills, {} bosses, {} shots",
            seed,
            outcome,
            format_timer(state.stats.run_time_ms),
            state.player.level,
            level_ups,
            state.stats.kills,
            state.stats.bosses_defeated,
            shots
        );
    }
}
