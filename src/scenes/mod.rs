//! Screen state machine and scripted choreography.
//!
//! Exactly one screen is active at a time. A transition is a two-phase fade
//! guarded by `is_animating`; the guard is cleared *before* the target screen
//! is shown so that completion-triggered follow-up transitions (the owl
//! screen auto-advancing, for instance) are not blocked by their own flag.
//! Every screen-entry routine is an explicit `(delay, action)` step list on a
//! [`Sequence`] slot in the app context, so entering another screen or
//! restarting cancels the whole routine in one move.

use crate::App;
use crate::audio::{Cue, Track};
use crate::countdown::{self, pad2};
use crate::particles::{self, Overrides, ParticleKind};
use crate::stage;
use crate::timing::{Interval, Sequence};

pub const CANDLE_COUNT: usize = 24;

/// Classes applied by timed choreography, all stripped on restart.
const TRANSIENT_CLASSES: &[&str] = &[
    "flying", "landed", "breaking", "dropping", "waiting", "unfolding", "revealing", "lighting",
    "fade-out", "fade-in", "final",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Lock,
    Intro,
    Owl,
    LetterSealed,
    LetterContent,
    Countdown,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Lock,
        Screen::Intro,
        Screen::Owl,
        Screen::LetterSealed,
        Screen::LetterContent,
        Screen::Countdown,
    ];

    pub fn dom_id(self) -> &'static str {
        match self {
            Screen::Lock => "lock-screen",
            Screen::Intro => "intro-screen",
            Screen::Owl => "owl-screen",
            Screen::LetterSealed => "letter-sealed-screen",
            Screen::LetterContent => "letter-content-screen",
            Screen::Countdown => "countdown-screen",
        }
    }
}

/// Pure flow state: current screen, in-flight transition flag, sticky unlock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowState {
    pub screen: Screen,
    pub is_animating: bool,
    pub unlocked: bool,
}

impl FlowState {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            is_animating: false,
            unlocked: false,
        }
    }

    /// Claim the transition guard; fails while another transition is in
    /// flight.
    pub fn try_begin(&mut self) -> bool {
        if self.is_animating {
            false
        } else {
            self.is_animating = true;
            true
        }
    }

    /// Arrive at `target`. Clears the guard first, then records the screen,
    /// so re-entrant transition requests from the arrival path are accepted.
    pub fn land(&mut self, target: Screen) {
        self.is_animating = false;
        self.screen = target;
    }

    /// Unlock is monotonic: once set it never reverts, even if the clock is
    /// later observed before the unlock instant again.
    pub fn note_unlock(&mut self) {
        self.unlocked = true;
    }

    /// Restart may interrupt a transition mid-flight.
    pub fn force_idle(&mut self) {
        self.is_animating = false;
    }
}

/// Whether the lock gate lets the user through. An unparseable unlock
/// instant counts as already reached (never fatal, never stuck).
pub fn gate_open(already_unlocked: bool, bypass: bool, now_ms: f64, unlock_ms: Option<f64>) -> bool {
    already_unlocked || bypass || unlock_ms.is_none_or(|t| now_ms >= t)
}

/// Flow state at startup: straight to the intro, already unlocked, when the
/// gate condition holds at boot; otherwise the lock screen.
pub fn initial_flow(bypass: bool, now_ms: f64, unlock_ms: Option<f64>) -> FlowState {
    let mut flow = FlowState::new(Screen::Lock);
    if gate_open(false, bypass, now_ms, unlock_ms) {
        flow.note_unlock();
        flow.screen = Screen::Intro;
    }
    flow
}

/// Activate `screen` without a fade (startup path).
pub fn show_screen(app: &mut App, screen: Screen) {
    app.stage.activate_only(screen);
    app.flow.screen = screen;
}

/// Two-phase fade transition. Rejected while another transition is in
/// flight.
pub fn transition_to(app: &mut App, target: Screen, delay_ms: i32) {
    if !app.flow.try_begin() {
        log::debug!("transition to {target:?} rejected: already animating");
        return;
    }
    let from = app.flow.screen;
    if let Some(el) = app.stage.screen_el(from) {
        stage::add_class(el, "fade-out");
    }
    let mut seq = Sequence::new();
    seq.at(delay_ms, move || {
        crate::with_app(|app| complete_transition(app, from, target));
    });
    seq.at(delay_ms + 500, move || {
        crate::with_app(|app| {
            if let Some(el) = app.stage.screen_el(target) {
                stage::remove_class(el, "fade-in");
            }
        });
    });
    app.transition_seq = Some(seq);
}

fn complete_transition(app: &mut App, from: Screen, target: Screen) {
    // Guard cleared before the new screen is shown.
    app.flow.land(target);
    app.stage.activate_only(target);
    if let Some(el) = app.stage.screen_el(target) {
        stage::add_class(el, "fade-in");
    }
    if let Some(el) = app.stage.screen_el(from) {
        for class in ARRIVAL_SWEEP {
            stage::remove_class(el, class);
        }
    }
    on_screen_enter(app, target);
}

/// Cleared from the outgoing screen on arrival. `fade-in` is included
/// because a transition started inside the previous one's 500 ms self-clear
/// window replaces (and cancels) that pending step, stranding the class.
const ARRIVAL_SWEEP: &[&str] = &["fade-out", "fade-in"];

fn on_screen_enter(app: &mut App, screen: Screen) {
    match screen {
        Screen::Owl => start_owl_flight(app),
        Screen::LetterSealed => show_envelope(app),
        Screen::LetterContent => reveal_letter(app),
        Screen::Countdown => start_celebration(app),
        Screen::Lock | Screen::Intro => {}
    }
}

/// Owl flies in trailing dust and sparkles, lands, then the experience
/// advances to the sealed letter by itself.
fn start_owl_flight(app: &mut App) {
    app.audio.play_sfx(Cue::Whoosh);
    match &app.stage.owl {
        Some(owl) => stage::add_class(owl, "flying"),
        None => log::warn!("owl element missing; skipping flight visuals"),
    }
    app.trail = Interval::every(100, || {
        crate::with_app(|app| {
            if let Some(owl) = &app.stage.owl {
                let (x, y) = stage::center_of(owl);
                particles::emit_trail(x, y);
            }
        });
    });
    let mut seq = Sequence::new();
    seq.at(3500, || {
        crate::with_app(|app| {
            app.trail = None; // flight over: the trail interval must not outlive it
            if let Some(owl) = &app.stage.owl {
                stage::remove_class(owl, "flying");
                stage::add_class(owl, "landed");
                let (x, y) = stage::bottom_center_of(owl);
                particles::emit(x, y, ParticleKind::Dust, 15, &Overrides::default());
            }
        });
    });
    seq.at(5000, || {
        crate::with_app(|app| transition_to(app, Screen::LetterSealed, 800));
    });
    app.scene_seq = Some(seq);
}

fn show_envelope(app: &mut App) {
    let mut seq = Sequence::new();
    if let Some(envelope) = app.stage.query(".envelope") {
        stage::add_class(&envelope, "dropping");
        app.audio.play_sfx(Cue::Whoosh);
        seq.at(1000, move || {
            stage::remove_class(&envelope, "dropping");
            stage::add_class(&envelope, "waiting");
        });
    }
    app.audio.crossfade_to(Track::Ambience, 2000.0);
    app.scene_seq = Some(seq);
}

fn reveal_letter(app: &mut App) {
    if let Some(parchment) = app.stage.query(".parchment") {
        stage::add_class(&parchment, "unfolding");
    }
    let mut seq = Sequence::new();
    seq.at(1000, || {
        crate::with_app(|app| {
            if let Some(body) = app.stage.query(".letter-body") {
                stage::add_class(&body, "revealing");
            }
        });
    });
    // The restaurant surprise line, with a little starburst at its spot.
    seq.at(3000, || {
        crate::with_app(|app| {
            if let Some(reveal) = app.stage.query(".restaurant-reveal") {
                stage::add_class(&reveal, "revealing");
                let (x, y) = stage::top_center_of(&reveal);
                particles::emit(x, y, ParticleKind::Star, 10, &Overrides::default());
            }
            app.audio.play_sfx(Cue::MagicChime);
        });
    });
    app.scene_seq = Some(seq);
}

/// Candle-lighting roll followed by the full celebration particle sequence.
fn start_celebration(app: &mut App) {
    app.audio.crossfade_to(Track::Celebration, 1500.0);
    let mut seq = Sequence::new();
    for (i, candle) in app.stage.candle_elements().into_iter().enumerate() {
        seq.at(i as i32 * 150, move || {
            if let Ok(Some(flame)) = candle.query_selector(".candle-flame") {
                stage::add_class(&flame, "lit");
                stage::add_class(&candle, "lighting");
                crate::with_app(|app| app.audio.play_sfx(Cue::CandleLight));
                let (x, y) = stage::top_center_of(&candle);
                particles::emit(x, y, ParticleKind::Sparkle, 3, &Overrides::default());
            }
        });
    }
    seq.at(500, || {
        crate::with_app(|app| {
            let mut drip = Sequence::new();
            particles::emit_celebration(&mut drip);
            app.celebration_seq = Some(drip);
        });
    });
    app.scene_seq = Some(seq);
}

/// Break the wax seal: cue + haptics + burst, then on to the letter.
pub fn break_seal(app: &mut App) {
    if app.seal_breaking {
        return;
    }
    let Some(seal) = app.stage.seal.clone() else {
        log::warn!("wax seal element missing");
        return;
    };
    if stage::has_class(&seal, "breaking") {
        return;
    }
    app.seal_breaking = true;
    app.audio.play_sfx(Cue::SealBreak);
    app.audio.vibrate(&[100, 50, 100]);
    let (x, y) = stage::center_of(&seal);
    particles::emit_radial_burst(x, y, ParticleKind::Sparkle, 30);
    particles::emit(x, y, ParticleKind::Dust, 20, &Overrides::default());
    stage::add_class(&seal, "breaking");
    let mut seq = Sequence::new();
    seq.at(600, || {
        crate::with_app(|app| {
            app.seal_breaking = false;
            transition_to(app, Screen::LetterContent, 500);
        });
    });
    app.scene_seq = Some(seq);
}

/// Lock screen tap: shake while still locked, proceed once the gate is open.
pub fn tap_lock(app: &mut App) {
    if !app.flow.unlocked {
        if let Some(container) = app.stage.query(".lock-countdown-container") {
            stage::add_class(&container, "shake");
            let mut seq = Sequence::new();
            seq.at(500, move || stage::remove_class(&container, "shake"));
            app.ui_seq = Some(seq);
        }
        return;
    }
    if app.flow.screen == Screen::Lock {
        transition_to(app, Screen::Intro, 500);
    }
}

/// Intro tap: first-gesture audio start, a sparkle burst, then the owl.
pub fn tap_intro(app: &mut App) {
    if app.flow.screen != Screen::Intro || app.flow.is_animating {
        return;
    }
    if !app.audio_started {
        app.audio.play_track(Track::Theme, Some(0.4), true);
        app.audio_started = true;
    }
    let (cx, cy) = stage::viewport_center();
    particles::emit_radial_burst(cx, cy, ParticleKind::Sparkle, 20);
    app.audio.play_sfx(Cue::MagicChime);
    transition_to(app, Screen::Owl, 800);
}

pub fn continue_to_countdown(app: &mut App) {
    app.audio.play_sfx(Cue::Celebration);
    transition_to(app, Screen::Countdown, 500);
}

pub fn toggle_audio(app: &mut App) {
    let muted = app.audio.toggle_mute();
    if let Some(icon) = &app.stage.audio_icon {
        icon.set_text_content(Some(if muted { "🔇" } else { "🔊" }));
    }
    if let Some(toggle) = &app.stage.audio_toggle {
        if muted {
            stage::remove_class(toggle, "playing");
        } else {
            stage::add_class(toggle, "playing");
        }
    }
}

/// Unconditional return to the intro: cancels every running routine, strips
/// transient visuals, clears particles and re-cues the theme.
pub fn restart(app: &mut App) {
    app.transition_seq = None;
    app.scene_seq = None;
    app.celebration_seq = None;
    app.ui_seq = None;
    app.trail = None;
    app.seal_breaking = false;
    app.stage.strip_classes(TRANSIENT_CLASSES);
    app.stage.strip_classes(&["lit"]);
    particles::clear();
    app.flow.force_idle();
    transition_to(app, Screen::Intro, 500);
    app.audio.crossfade_to(Track::Theme, 1000.0);
}

/// 1 Hz lock-gate tick: update the digits and flip the sticky unlock flag
/// the first time the wall clock reaches the unlock instant.
pub fn lock_countdown_tick(app: &mut App) {
    let now = js_sys::Date::now();
    let parts = match app.unlock_ms {
        Some(target) => countdown::parts_until(target, now),
        None => countdown::CountdownParts::ZERO,
    };
    if parts.finished {
        if !app.flow.unlocked {
            mark_unlocked(app);
        }
        app.stage.set_lock_cells("00", "00", "00");
        return;
    }
    app.stage
        .set_lock_cells(&pad2(parts.hours), &pad2(parts.minutes), &pad2(parts.seconds));
}

fn mark_unlocked(app: &mut App) {
    app.flow.note_unlock();
    if let Some(el) = app.stage.screen_el(Screen::Lock) {
        stage::add_class(el, "unlocked");
    }
    if let Some(patience) = app.stage.query(".lock-patience") {
        patience.set_text_content(Some("Tap to discover the surprise ✨"));
    }
    if let Some(subtitle) = app.stage.query(".lock-subtitle") {
        subtitle.set_text_content(Some("It's time!"));
    }
}

/// 1 Hz dinner tick: digits, last-minute pulse, one-shot finish celebration.
pub fn dinner_countdown_tick(app: &mut App) {
    let now = js_sys::Date::now();
    let Some(target) = app.dinner_ms else {
        app.stage.set_dinner_cells("00", "00", "00");
        return;
    };
    let parts = countdown::parts_until(target, now);
    if parts.finished {
        app.stage.set_dinner_cells("00", "00", "00");
        if !app.dinner_done {
            app.dinner_done = true;
            if let Some(label) = app.stage.query(".countdown-label") {
                label.set_text_content(Some("✨ It's time to go! ✨"));
            }
            let mut drip = Sequence::new();
            particles::emit_celebration(&mut drip);
            app.celebration_seq = Some(drip);
            app.audio.play_sfx(Cue::Celebration);
        }
        return;
    }
    app.stage
        .set_dinner_cells(&pad2(parts.hours), &pad2(parts.minutes), &pad2(parts.seconds));
    if countdown::in_final_minute(target, now) {
        if let Some(timer) = app.stage.query(".countdown-timer") {
            stage::add_class(&timer, "final");
        }
    }
}
