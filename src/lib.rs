//! A time-gated single-page greeting experience.
//!
//! A lock screen counts down to an unlock instant; after that a tap leads
//! through an intro, an owl courier flight, a sealed letter, the letter
//! itself and finally a candle-lit countdown to dinner. Particles render on
//! a full-viewport canvas, music and cues run through [`audio`], and all
//! timed choreography is cancellable through [`timing`].
//!
//! The whole experience hangs off one [`App`] context in a thread-local
//! cell, the usual shape for a single-threaded wasm page: timer and event
//! closures re-enter through [`with_app`].

use std::cell::RefCell;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, EventTarget};

pub mod audio;
pub mod config;
pub mod countdown;
pub mod particles;
pub mod scenes;
pub mod stage;
pub mod timing;

use audio::AudioDirector;
use config::ExperienceConfig;
use scenes::{FlowState, Screen};
use stage::Stage;
use timing::{Interval, Sequence};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Everything the running experience owns.
pub struct App {
    pub config: ExperienceConfig,
    pub unlock_ms: Option<f64>,
    pub dinner_ms: Option<f64>,
    pub stage: Stage,
    pub audio: AudioDirector,
    pub flow: FlowState,
    pub audio_started: bool,
    pub seal_breaking: bool,
    pub dinner_done: bool,
    pub transition_seq: Option<Sequence>,
    pub scene_seq: Option<Sequence>,
    pub celebration_seq: Option<Sequence>,
    pub ui_seq: Option<Sequence>,
    pub trail: Option<Interval>,
    tickers: Vec<Interval>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Run `f` against the live app context, if the experience has started.
pub(crate) fn with_app(f: impl FnOnce(&mut App)) {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            f(app);
        }
    });
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Boot the experience. `config_json` may carry overrides for the unlock
/// and dinner instants plus debug switches; anything missing or malformed
/// falls back to the built-in values.
#[wasm_bindgen]
pub fn start_experience(config_json: Option<String>) {
    let config = ExperienceConfig::from_json(config_json.as_deref());
    let level = if config.debug_mode {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    let _ = console_log::init_with_level(level);
    log::info!("starting experience (debug: {})", config.debug_mode);

    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        log::error!("no document; cannot start");
        return;
    };

    let unlock_ms = parse_instant("unlock", &config.unlock_time);
    let dinner_ms = parse_instant("dinner", &config.dinner_date);

    let stage = Stage::capture(&doc);
    stage.generate_candles(scenes::CANDLE_COUNT);
    let audio = AudioDirector::new(&doc);
    particles::init(&doc, "particles-canvas");

    let flow = scenes::initial_flow(config.bypass_lock_screen, js_sys::Date::now(), unlock_ms);
    let initial = flow.screen;
    let mut app = App {
        config,
        unlock_ms,
        dinner_ms,
        stage,
        audio,
        flow,
        audio_started: false,
        seal_breaking: false,
        dinner_done: false,
        transition_seq: None,
        scene_seq: None,
        celebration_seq: None,
        ui_seq: None,
        trail: None,
        tickers: Vec::new(),
    };
    scenes::show_screen(&mut app, initial);
    attach_listeners(&doc);

    // First paint of both countdowns, then 1 Hz forever.
    scenes::lock_countdown_tick(&mut app);
    scenes::dinner_countdown_tick(&mut app);
    app.tickers.extend(Interval::every(1000, || {
        with_app(scenes::lock_countdown_tick);
    }));
    app.tickers.extend(Interval::every(1000, || {
        with_app(scenes::dinner_countdown_tick);
    }));

    APP.with(|cell| {
        if cell.borrow().is_some() {
            log::warn!("experience restarted from scratch");
        }
        *cell.borrow_mut() = Some(app);
    });
}

fn parse_instant(label: &str, value: &str) -> Option<f64> {
    let ms = js_sys::Date::new(&JsValue::from_str(value)).get_time();
    if ms.is_nan() {
        log::warn!("{label} instant {value:?} did not parse; treating it as already reached");
        None
    } else {
        Some(ms)
    }
}

fn attach_listeners(doc: &Document) {
    if let Some(el) = doc.get_element_by_id(Screen::Lock.dom_id()) {
        on_click(&el, || with_app(scenes::tap_lock));
    }
    if let Some(el) = doc.get_element_by_id(Screen::Intro.dom_id()) {
        on_click(&el, || with_app(scenes::tap_intro));
    }
    if let Some(el) = doc.get_element_by_id("wax-seal") {
        on_click(&el, || with_app(scenes::break_seal));
    }
    if let Some(el) = doc.get_element_by_id("continue-btn") {
        on_click(&el, || with_app(scenes::continue_to_countdown));
    }
    if let Some(el) = doc.get_element_by_id("restart-btn") {
        on_click(&el, || with_app(scenes::restart));
    }
    if let Some(el) = doc.get_element_by_id("audio-toggle") {
        on_click(&el, || with_app(scenes::toggle_audio));
    }
}

/// Install a leaked click handler; these live for the page lifetime.
fn on_click(target: &EventTarget, handler: impl FnMut() + 'static) {
    let cb = Closure::<dyn FnMut()>::new(handler);
    if target
        .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
        .is_err()
    {
        log::warn!("failed to attach click listener");
    }
    cb.forget();
}
