//! Canvas particle engine: emission, per-frame physics and rendering.
//!
//! The engine owns the full-viewport effects canvas and the live particle
//! set. Its loop is a two-state machine (`idle` ⇄ `running`): any emission
//! wakes it idempotently, and a tick that observes an empty set stops it
//! until the next emission. The loop is a self-rescheduling
//! `request_animation_frame` closure.
//!
//! State lives in a module-local `thread_local!` because the frame closure
//! needs `'static` access; everything algorithmic is in [`model`] and stays
//! host-testable.

pub mod model;

use std::cell::RefCell;
use std::f64::consts::{PI, TAU};

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, window};

pub use model::{Overrides, Particle, ParticleKind};

use crate::timing::Sequence;

/// Upper bound on the live set. Rapid repeated emission evicts the oldest
/// particles instead of growing per-frame cost without limit.
pub const MAX_LIVE_PARTICLES: usize = 600;

struct ParticleEngine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    particles: Vec<Particle>,
    running: bool,
}

thread_local! {
    static ENGINE: RefCell<Option<ParticleEngine>> = const { RefCell::new(None) };
    static FRAME: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
}

/// Attach the engine to the effects canvas and install the frame closure.
/// A missing canvas is logged and turns every emission into a no-op.
pub fn init(doc: &Document, canvas_id: &str) {
    let Some(engine) = attach(doc, canvas_id) else {
        log::warn!("effects canvas #{canvas_id} not found; particle effects disabled");
        return;
    };
    engine.resize();
    ENGINE.with(|cell| cell.replace(Some(engine)));

    FRAME.with(|cell| {
        cell.replace(Some(Closure::wrap(Box::new(move |_ts: f64| {
            let keep_running = ENGINE.with(|c| {
                c.borrow_mut().as_mut().map(|e| e.frame()).unwrap_or(false)
            });
            if keep_running {
                request_frame();
            }
        }) as Box<dyn FnMut(f64)>)));
    });

    // Keep the surface sized to the viewport.
    if let Some(win) = window() {
        let on_resize = Closure::wrap(Box::new(move || {
            ENGINE.with(|c| {
                if let Some(e) = c.borrow().as_ref() {
                    e.resize();
                }
            });
        }) as Box<dyn FnMut()>);
        win.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
            .ok();
        on_resize.forget();
    }
}

fn attach(doc: &Document, canvas_id: &str) -> Option<ParticleEngine> {
    let canvas: HtmlCanvasElement = doc.get_element_by_id(canvas_id)?.dyn_into().ok()?;
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
    Some(ParticleEngine {
        canvas,
        ctx,
        particles: Vec::new(),
        running: false,
    })
}

fn with_engine<R>(f: impl FnOnce(&mut ParticleEngine) -> R) -> Option<R> {
    ENGINE.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn request_frame() {
    FRAME.with(|cell| {
        if let (Some(win), Some(cb)) = (window(), cell.borrow().as_ref()) {
            win.request_animation_frame(cb.as_ref().unchecked_ref()).ok();
        }
    });
}

/// Start the loop if it is idle and there is work to do. Re-entering while
/// already running is a no-op.
fn wake() {
    let woke = with_engine(|e| {
        if !e.running && !e.particles.is_empty() {
            e.running = true;
            true
        } else {
            false
        }
    })
    .unwrap_or(false);
    if woke {
        request_frame();
    }
}

/// Append `count` particles of `kind` at `(x, y)`, all sharing `overrides`.
pub fn emit(x: f64, y: f64, kind: ParticleKind, count: usize, overrides: &Overrides) {
    with_engine(|e| {
        let mut rng = fastrand::f64;
        for _ in 0..count {
            e.particles.push(model::spawn(x, y, kind, overrides, &mut rng));
        }
        model::evict_overflow(&mut e.particles, MAX_LIVE_PARTICLES);
    });
    wake();
}

/// Emit `count` particles with initial directions evenly spaced around the
/// full circle, at a random speed in [3, 8) shared by the whole burst.
pub fn emit_radial_burst(x: f64, y: f64, kind: ParticleKind, count: usize) {
    let speed = 3.0 + fastrand::f64() * 5.0;
    with_engine(|e| {
        let mut rng = fastrand::f64;
        for i in 0..count {
            let (vx, vy) = model::radial_velocity(i, count, speed);
            let ov = Overrides {
                vx: Some(vx),
                vy: Some(vy),
                ..Default::default()
            };
            e.particles.push(model::spawn(x, y, kind, &ov, &mut rng));
        }
        model::evict_overflow(&mut e.particles, MAX_LIVE_PARTICLES);
    });
    wake();
}

/// Small dust + sparkle puff; call repeatedly to trace a moving point.
pub fn emit_trail(x: f64, y: f64) {
    emit(x, y, ParticleKind::Dust, 3, &Overrides::default());
    emit(x, y, ParticleKind::Sparkle, 2, &Overrides::default());
}

/// Discard all live particles and blank the surface. The loop notices the
/// empty set on its next tick and goes idle by itself.
pub fn clear() {
    with_engine(|e| {
        e.particles.clear();
        e.clear_surface();
    });
}

/// Current drawing surface size, if the engine is attached.
pub fn canvas_size() -> Option<(f64, f64)> {
    with_engine(|e| (e.canvas.width() as f64, e.canvas.height() as f64))
}

/// One scheduled emission of the celebration drip-feed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmitSpec {
    Burst { x: f64, y: f64, kind: ParticleKind, count: usize },
    Plain { x: f64, y: f64, kind: ParticleKind, count: usize },
}

/// The celebration choreography as data: two immediate center bursts, then
/// hearts rising from the bottom edge every 100 ms and confetti falling from
/// the top edge every 50 ms, for about 1.5 s of drip-feed.
pub fn celebration_plan(
    width: f64,
    height: f64,
    rng: &mut impl FnMut() -> f64,
) -> Vec<(i32, EmitSpec)> {
    let cx = width / 2.0;
    let cy = height / 2.0;
    let mut plan = vec![
        (0, EmitSpec::Burst { x: cx, y: cy, kind: ParticleKind::Confetti, count: 50 }),
        (0, EmitSpec::Burst { x: cx, y: cy, kind: ParticleKind::Star, count: 20 }),
    ];
    for i in 0..15 {
        plan.push((
            i * 100,
            EmitSpec::Plain {
                x: (rng)() * width,
                y: height + 20.0,
                kind: ParticleKind::Heart,
                count: 1,
            },
        ));
    }
    for i in 0..30 {
        plan.push((
            i * 50,
            EmitSpec::Plain {
                x: (rng)() * width,
                y: -10.0,
                kind: ParticleKind::Confetti,
                count: 3,
            },
        ));
    }
    plan
}

fn apply(spec: EmitSpec) {
    match spec {
        EmitSpec::Burst { x, y, kind, count } => emit_radial_burst(x, y, kind, count),
        EmitSpec::Plain { x, y, kind, count } => emit(x, y, kind, count, &Overrides::default()),
    }
}

/// Composite celebration: immediate bursts plus a drip-feed scheduled on the
/// caller's [`Sequence`] so it cancels with the owning screen routine.
pub fn emit_celebration(seq: &mut Sequence) {
    let Some((w, h)) = canvas_size() else { return };
    let mut rng = fastrand::f64;
    for (delay, spec) in celebration_plan(w, h, &mut rng) {
        if delay == 0 {
            apply(spec);
        } else {
            seq.at(delay, move || apply(spec));
        }
    }
}

/// Tick decision shared by the frame closure: step the simulation, report
/// whether anything is left to animate.
fn frame_core(particles: &mut Vec<Particle>) -> bool {
    model::step(particles);
    !particles.is_empty()
}

impl ParticleEngine {
    fn resize(&self) {
        if let Some(win) = window() {
            let w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            let h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            self.canvas.set_width(w as u32);
            self.canvas.set_height(h as u32);
        }
    }

    fn clear_surface(&self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }

    /// Tick then render. Returns false once the set is empty, which parks
    /// the loop until the next emission.
    fn frame(&mut self) -> bool {
        let alive = frame_core(&mut self.particles);
        self.render();
        if !alive {
            self.running = false;
        }
        alive
    }

    fn render(&self) {
        self.clear_surface();
        for p in &self.particles {
            self.ctx.save();
            self.ctx.set_global_alpha(p.life);
            match p.kind {
                ParticleKind::Sparkle | ParticleKind::Star => self.draw_star(p),
                ParticleKind::Confetti => self.draw_confetti(p),
                ParticleKind::Heart => self.draw_heart(p),
                ParticleKind::Dust => self.draw_dust(p),
                ParticleKind::Plain => self.draw_circle(p),
            }
            self.ctx.restore();
        }
    }

    fn draw_star(&self, p: &Particle) {
        let spikes = 4_u32;
        let outer = p.size;
        let inner = p.size / 2.0;
        if p.glow {
            self.ctx.set_shadow_blur(10.0);
            self.ctx.set_shadow_color(&p.color);
        }
        self.ctx.begin_path();
        self.ctx.set_fill_style_str(&p.color);
        for i in 0..spikes * 2 {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = PI * i as f64 / spikes as f64 - PI / 2.0;
            let x = p.x + angle.cos() * radius;
            let y = p.y + angle.sin() * radius;
            if i == 0 {
                self.ctx.move_to(x, y);
            } else {
                self.ctx.line_to(x, y);
            }
        }
        self.ctx.close_path();
        self.ctx.fill();
        self.ctx.set_shadow_blur(0.0);
    }

    fn draw_confetti(&self, p: &Particle) {
        self.ctx.translate(p.x, p.y).ok();
        self.ctx.rotate(p.rotation * PI / 180.0).ok();
        self.ctx.set_fill_style_str(&p.color);
        self.ctx
            .fill_rect(-p.size / 2.0, -p.size / 4.0, p.size, p.size / 2.0);
    }

    fn draw_heart(&self, p: &Particle) {
        let (x, y, s) = (p.x, p.y, p.size);
        self.ctx.set_fill_style_str(&p.color);
        self.ctx.begin_path();
        // Two mirrored lobes anchored at the top notch.
        self.ctx.move_to(x, y + s / 4.0);
        self.ctx
            .bezier_curve_to(x, y, x - s / 2.0, y, x - s / 2.0, y + s / 4.0);
        self.ctx
            .bezier_curve_to(x - s / 2.0, y + s / 2.0, x, y + s * 0.75, x, y + s);
        self.ctx
            .bezier_curve_to(x, y + s * 0.75, x + s / 2.0, y + s / 2.0, x + s / 2.0, y + s / 4.0);
        self.ctx.bezier_curve_to(x + s / 2.0, y, x, y, x, y + s / 4.0);
        self.ctx.fill();
    }

    fn draw_dust(&self, p: &Particle) {
        self.ctx.begin_path();
        self.ctx.arc(p.x, p.y, p.size, 0.0, TAU).ok();
        self.ctx.set_fill_style_str(&p.color);
        self.ctx.set_shadow_blur(5.0);
        self.ctx.set_shadow_color(&p.color);
        self.ctx.fill();
        self.ctx.set_shadow_blur(0.0);
    }

    fn draw_circle(&self, p: &Particle) {
        self.ctx.begin_path();
        self.ctx.arc(p.x, p.y, p.size, 0.0, TAU).ok();
        self.ctx.set_fill_style_str(&p.color);
        self.ctx.fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_idle_once_set_empties() {
        let mut rng = || 0.5;
        let mut particles = vec![model::spawn(
            0.0,
            0.0,
            ParticleKind::Sparkle,
            &Overrides {
                decay: Some(0.6),
                ..Default::default()
            },
            &mut rng,
        )];
        assert!(frame_core(&mut particles)); // life 0.4
        assert!(!frame_core(&mut particles)); // life crossed zero, set empty
        assert!(particles.is_empty());
        // No particles: further ticks stay idle.
        assert!(!frame_core(&mut particles));
    }

    #[test]
    fn celebration_plan_drips_for_about_a_second_and_a_half() {
        let mut rng = || 0.5;
        let plan = celebration_plan(800.0, 600.0, &mut rng);

        let immediate: Vec<_> = plan.iter().filter(|(d, _)| *d == 0).collect();
        assert!(immediate.iter().any(|(_, s)| matches!(
            s,
            EmitSpec::Burst { kind: ParticleKind::Confetti, count: 50, .. }
        )));
        assert!(immediate.iter().any(|(_, s)| matches!(
            s,
            EmitSpec::Burst { kind: ParticleKind::Star, count: 20, .. }
        )));

        // 30 confetti emissions at 50 ms spacing: the last fires at 1450 ms
        let last = plan.iter().map(|(d, _)| *d).max().unwrap();
        assert!((1400..=3000).contains(&last), "drip ends at {last} ms");

        // Steady cadence: hearts every 100 ms, confetti every 50 ms.
        let hearts: Vec<i32> = plan
            .iter()
            .filter(|(_, s)| matches!(s, EmitSpec::Plain { kind: ParticleKind::Heart, .. }))
            .map(|(d, _)| *d)
            .collect();
        assert_eq!(hearts.len(), 15);
        for w in hearts.windows(2) {
            assert_eq!(w[1] - w[0], 100);
        }
        let confetti: Vec<i32> = plan
            .iter()
            .filter(|(_, s)| matches!(s, EmitSpec::Plain { kind: ParticleKind::Confetti, .. }))
            .map(|(d, _)| *d)
            .collect();
        assert_eq!(confetti.len(), 30);
        for w in confetti.windows(2) {
            assert_eq!(w[1] - w[0], 50);
        }
    }

    #[test]
    fn drip_feed_positions_hug_the_edges() {
        let mut rng = || 0.25;
        let plan = celebration_plan(1000.0, 500.0, &mut rng);
        for (_, spec) in &plan {
            if let EmitSpec::Plain { y, kind, .. } = spec {
                match kind {
                    ParticleKind::Heart => assert_eq!(*y, 520.0),
                    ParticleKind::Confetti => assert_eq!(*y, -10.0),
                    _ => {}
                }
            }
        }
    }
}
