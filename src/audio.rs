//! Background-music tracks and synthesized one-shot cues.
//!
//! Two near-identical audio managers existed upstream; this is the single
//! canonical contract: looping `HtmlAudioElement` tracks with stepped
//! volume fades, oscillator/noise cues on one shared `AudioContext`, a
//! sticky mute toggle and haptic fallback while muted. Autoplay rejection
//! is caught and logged; the experience continues silently until a later
//! user gesture.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AudioContext, AudioContextState, BiquadFilterType, Document, HtmlAudioElement,
    OscillatorType, window,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Track {
    Theme,
    Ambience,
    Celebration,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Theme, Track::Ambience, Track::Celebration];

    fn url(self) -> &'static str {
        match self {
            Track::Theme => "https://cdn.pixabay.com/audio/2022/10/25/audio_032a7fde90.mp3",
            Track::Ambience => "https://cdn.pixabay.com/audio/2022/03/15/audio_8f1c8e1c87.mp3",
            Track::Celebration => "https://cdn.pixabay.com/audio/2021/08/04/audio_0625c1539c.mp3",
        }
    }
}

/// One-shot synthesized sound cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    SealBreak,
    MagicChime,
    CandleLight,
    Whoosh,
    Celebration,
}

pub struct AudioDirector {
    ctx: Option<AudioContext>,
    tracks: Vec<(Track, HtmlAudioElement)>,
    current: Option<Track>,
    muted: bool,
    volume: f64,
}

impl AudioDirector {
    /// Build the director; failures to set up individual pieces degrade to
    /// logged no-ops.
    pub fn new(doc: &Document) -> Self {
        let ctx = match AudioContext::new() {
            Ok(c) => Some(c),
            Err(e) => {
                log::warn!("Web Audio unavailable: {e:?}");
                None
            }
        };
        let mut tracks = Vec::new();
        for track in Track::ALL {
            match doc
                .create_element("audio")
                .ok()
                .and_then(|el| el.dyn_into::<HtmlAudioElement>().ok())
            {
                Some(el) => {
                    el.set_preload("metadata");
                    el.set_src(track.url());
                    el.set_loop(true);
                    el.set_volume(0.0);
                    tracks.push((track, el));
                }
                None => log::warn!("could not preload track {track:?}"),
            }
        }
        Self {
            ctx,
            tracks,
            current: None,
            muted: true, // autoplay policies: start muted until a gesture
            volume: 0.5,
        }
    }

    fn el(&self, track: Track) -> Option<&HtmlAudioElement> {
        self.tracks.iter().find(|(t, _)| *t == track).map(|(_, e)| e)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn resume_context(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    /// Start a background track, fading in unless muted. Any other playing
    /// track fades out first.
    pub fn play_track(&mut self, track: Track, volume: Option<f64>, fade_in: bool) {
        self.resume_context();
        let target = volume.unwrap_or(self.volume);
        if let Some(prev) = self.current.filter(|t| *t != track) {
            if let Some(prev_el) = self.el(prev) {
                fade(prev_el, 0.0, 1000.0, true);
            }
        }
        let Some(el) = self.el(track) else {
            log::warn!("track {track:?} not loaded");
            return;
        };
        el.set_loop(true);
        el.set_current_time(0.0);
        if self.muted {
            el.set_volume(0.0);
        } else if fade_in {
            el.set_volume(0.0);
            fade(el, target, 2000.0, false);
        } else {
            el.set_volume(target);
        }
        play_catching(el);
        self.current = Some(track);
    }

    /// Crossfade from the current track to `track` over `duration_ms`.
    pub fn crossfade_to(&mut self, track: Track, duration_ms: f64) {
        if self.current.is_none() {
            self.play_track(track, None, true);
            return;
        }
        let from = self.current.filter(|t| *t != track);
        let target = if self.muted { 0.0 } else { self.volume };
        if let Some(el) = self.el(track) {
            el.set_volume(0.0);
            el.set_current_time(0.0);
            play_catching(el);
            fade(el, target, duration_ms, false);
        }
        if let Some(prev) = from {
            if let Some(prev_el) = self.el(prev) {
                fade(prev_el, 0.0, duration_ms, true);
            }
        }
        self.current = Some(track);
    }

    /// Flip mute; returns the new muted state.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if let Some(el) = self.current.and_then(|t| self.el(t)) {
            if self.muted {
                el.set_volume(0.0);
            } else {
                fade(el, self.volume, 500.0, false);
            }
        }
        self.muted
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
        if !self.muted {
            if let Some(el) = self.current.and_then(|t| self.el(t)) {
                el.set_volume(self.volume);
            }
        }
    }

    /// Haptic feedback, used as the silent stand-in for cues while muted.
    pub fn vibrate(&self, pattern: &[u32]) {
        if !self.muted {
            return;
        }
        if let Some(win) = window() {
            let arr = js_sys::Array::new();
            for ms in pattern {
                arr.push(&JsValue::from_f64(f64::from(*ms)));
            }
            win.navigator().vibrate_with_pattern(&arr);
        }
    }

    /// Synthesize a one-shot cue. Silent (skipped) while muted.
    pub fn play_sfx(&self, cue: Cue) {
        if self.muted {
            return;
        }
        self.resume_context();
        if let Err(e) = self.synth(cue) {
            log::warn!("sfx {cue:?} failed: {e:?}");
        }
    }

    fn synth(&self, cue: Cue) -> Result<(), JsValue> {
        let Some(ctx) = &self.ctx else { return Ok(()) };
        let t = ctx.current_time();
        let sfx_volume = 0.3;
        match cue {
            Cue::SealBreak => {
                let (osc, gain) = tone(ctx)?;
                osc.frequency().set_value_at_time(800.0, t)?;
                osc.frequency().exponential_ramp_to_value_at_time(200.0, t + 0.3)?;
                gain.gain().set_value_at_time(sfx_volume, t)?;
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.3)?;
                osc.start()?;
                osc.stop_with_when(t + 0.3)?;
            }
            Cue::MagicChime => {
                // C5 -> E5 -> G5 arpeggio
                let (osc, gain) = tone(ctx)?;
                osc.frequency().set_value_at_time(523.0, t)?;
                osc.frequency().set_value_at_time(659.0, t + 0.1)?;
                osc.frequency().set_value_at_time(784.0, t + 0.2)?;
                gain.gain().set_value_at_time(sfx_volume, t)?;
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.5)?;
                osc.start()?;
                osc.stop_with_when(t + 0.5)?;
            }
            Cue::CandleLight => {
                let (osc, gain) = tone(ctx)?;
                osc.frequency()
                    .set_value_at_time(candle_pitch(fastrand::f64()), t)?;
                gain.gain().set_value_at_time(sfx_volume * 0.5, t)?;
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.1)?;
                osc.start()?;
                osc.stop_with_when(t + 0.1)?;
            }
            Cue::Whoosh => {
                let rate = ctx.sample_rate();
                let len = (rate * 0.5) as u32;
                let buffer = ctx.create_buffer(1, len, rate)?;
                let mut data = vec![0.0_f32; len as usize];
                for sample in &mut data {
                    *sample = fastrand::f32() * 2.0 - 1.0;
                }
                buffer.copy_to_channel(&mut data, 0)?;
                let noise = ctx.create_buffer_source()?;
                noise.set_buffer(Some(&buffer));
                let filter = ctx.create_biquad_filter()?;
                filter.set_type(BiquadFilterType::Bandpass);
                filter.frequency().set_value_at_time(1000.0, t)?;
                filter.frequency().exponential_ramp_to_value_at_time(100.0, t + 0.5)?;
                let gain = ctx.create_gain()?;
                gain.gain().set_value_at_time(sfx_volume, t)?;
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.5)?;
                noise.connect_with_audio_node(&filter)?;
                filter.connect_with_audio_node(&gain)?;
                gain.connect_with_audio_node(&ctx.destination())?;
                noise.start()?;
            }
            Cue::Celebration => {
                // Rising cluster of five notes, scheduled 100 ms apart.
                for i in 0..5_i32 {
                    let at = t + f64::from(i) * 0.1;
                    let (osc, gain) = tone(ctx)?;
                    osc.frequency()
                        .set_value_at_time(celebration_pitch(i, fastrand::f64()), at)?;
                    gain.gain().set_value_at_time(sfx_volume * 0.5, at)?;
                    gain.gain().exponential_ramp_to_value_at_time(0.01, at + 0.3)?;
                    osc.start_with_when(at)?;
                    osc.stop_with_when(at + 0.3)?;
                }
            }
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(el) = self.current.and_then(|t| self.el(t)) {
            el.pause().ok();
            el.set_current_time(0.0);
        }
        self.current = None;
    }
}

/// Sine oscillator routed through a fresh gain node to the destination.
fn tone(ctx: &AudioContext) -> Result<(web_sys::OscillatorNode, web_sys::GainNode), JsValue> {
    let osc = ctx.create_oscillator()?;
    let gain = ctx.create_gain()?;
    osc.set_type(OscillatorType::Sine);
    osc.connect_with_audio_node(&gain)?;
    gain.connect_with_audio_node(&ctx.destination())?;
    Ok((osc, gain))
}

/// Pitch of the little candle-lighting blip: 1000 Hz plus up to 500 Hz of
/// jitter so a row of candles doesn't sound like a metronome.
fn candle_pitch(rand: f64) -> f32 {
    (1000.0 + rand * 500.0) as f32
}

/// Pitch of the i-th note of the celebration cluster: a rising 100 Hz
/// staircase from 400 Hz with up to 200 Hz of jitter.
fn celebration_pitch(step: i32, rand: f64) -> f32 {
    (400.0 + f64::from(step) * 100.0 + rand * 200.0) as f32
}

fn play_catching(el: &HtmlAudioElement) {
    if let Ok(promise) = el.play() {
        let on_err: Closure<dyn FnMut(JsValue)> = Closure::once(move |e: JsValue| {
            log::warn!("playback blocked by autoplay policy: {e:?}");
        });
        let _ = promise.catch(&on_err);
        let _ = on_err.into_js_value();
    }
}

/// Step an element's volume toward `target` every 50 ms, clearing its own
/// interval when it arrives; optionally pause at zero.
fn fade(el: &HtmlAudioElement, target: f64, duration_ms: f64, pause_when_done: bool) {
    let Some(win) = window() else { return };
    let steps = (duration_ms / 50.0).max(1.0);
    let delta = (target - el.volume()) / steps;
    if delta == 0.0 {
        return;
    }
    let el = el.clone();
    let id = Rc::new(Cell::new(0));
    let keep_alive: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let id_in = id.clone();
    let keep_alive_in = keep_alive.clone();
    let cb = Closure::wrap(Box::new(move || {
        let next = el.volume() + delta;
        let arrived = if delta > 0.0 { next >= target } else { next <= target };
        if arrived {
            el.set_volume(target.clamp(0.0, 1.0));
            if pause_when_done && target <= 0.0 {
                el.pause().ok();
            }
            if let Some(w) = window() {
                w.clear_interval_with_handle(id_in.get());
            }
            keep_alive_in.borrow_mut().take();
        } else {
            el.set_volume(next.clamp(0.0, 1.0));
        }
    }) as Box<dyn FnMut()>);
    match win.set_interval_with_callback_and_timeout_and_arguments_0(
        cb.as_ref().unchecked_ref(),
        50,
    ) {
        Ok(handle) => {
            id.set(handle);
            keep_alive.borrow_mut().replace(cb);
        }
        Err(e) => log::warn!("volume fade failed to schedule: {e:?}"),
    }
}
