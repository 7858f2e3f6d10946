//! Particle kinds, default distributions and the per-tick physics step.
//!
//! Everything in this file is pure Rust with no browser dependency so the
//! simulation can be exercised under `cargo test` on the host. Randomness is
//! injected as an `FnMut() -> f64` yielding values in `[0, 1)`; the engine
//! passes `fastrand::f64`, tests pass fixed sequences.

use std::f64::consts::PI;

/// Closed set of particle kinds. `Plain` is the fallback for names the
/// renderer does not recognize: sparkle physics, generic filled circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    Sparkle,
    Confetti,
    Heart,
    Star,
    Dust,
    Plain,
}

impl ParticleKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "sparkle" => Self::Sparkle,
            "confetti" => Self::Confetti,
            "heart" => Self::Heart,
            "star" => Self::Star,
            "dust" => Self::Dust,
            _ => Self::Plain,
        }
    }

    /// Default kinematic / visual distributions for this kind. Adding a kind
    /// is one entry here plus one arm in the renderer.
    pub fn defaults(self) -> &'static KindDefaults {
        match self {
            Self::Sparkle | Self::Plain => &SPARKLE_DEFAULTS,
            Self::Confetti => &CONFETTI_DEFAULTS,
            Self::Heart => &HEART_DEFAULTS,
            Self::Star => &STAR_DEFAULTS,
            Self::Dust => &DUST_DEFAULTS,
        }
    }
}

/// Per-kind attribute distributions. Velocity and size are uniform ranges,
/// the rest are fixed scalars / flags.
pub struct KindDefaults {
    pub vx: (f64, f64),
    pub vy: (f64, f64),
    pub size: (f64, f64),
    pub decay: f64,
    pub gravity: f64,
    /// Tumbling rectangle (confetti): rotation in [0,360), speed in [-5,5).
    pub spin: bool,
    pub glow: bool,
    pub palette: &'static [&'static str],
}

static SPARKLE_DEFAULTS: KindDefaults = KindDefaults {
    vx: (-2.0, 2.0),
    vy: (-2.0, 2.0),
    size: (2.0, 6.0),
    decay: 0.02,
    gravity: 0.0,
    spin: false,
    glow: false,
    palette: &["#EAB308", "#FCD34D"],
};

static CONFETTI_DEFAULTS: KindDefaults = KindDefaults {
    vx: (-4.0, 4.0),
    vy: (-7.0, -2.0),
    size: (4.0, 12.0),
    decay: 0.005,
    gravity: 0.1,
    spin: true,
    glow: false,
    palette: &["#EAB308", "#7C2D12", "#FCD34D", "#9A3412"],
};

static HEART_DEFAULTS: KindDefaults = KindDefaults {
    vx: (-1.0, 1.0),
    vy: (-3.0, -1.0),
    size: (10.0, 25.0),
    decay: 0.008,
    gravity: -0.02,
    spin: false,
    glow: false,
    palette: &["#FF6B6B", "#EE5A5A", "#FF8E8E", "#FFB3B3"],
};

static STAR_DEFAULTS: KindDefaults = KindDefaults {
    vx: (-3.0, 3.0),
    vy: (-3.0, 3.0),
    size: (4.0, 10.0),
    decay: 0.015,
    gravity: 0.0,
    spin: false,
    glow: true,
    palette: &["#FFFFFF"],
};

static DUST_DEFAULTS: KindDefaults = KindDefaults {
    vx: (-1.0, 1.0),
    vy: (-1.0, 1.0),
    size: (1.0, 4.0),
    decay: 0.025,
    gravity: 0.0,
    spin: false,
    glow: false,
    palette: &["rgba(234, 179, 8, 0.8)"],
};

/// A live particle. Created only by [`spawn`]; mutated only by [`step`].
#[derive(Clone, Debug)]
pub struct Particle {
    pub kind: ParticleKind,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    /// Opaque color token handed straight to the drawing surface.
    pub color: String,
    /// 1.0 at birth, dead the instant it reaches <= 0.
    pub life: f64,
    pub decay: f64,
    pub gravity: f64,
    pub rotation: f64,
    pub rotation_speed: f64,
    pub glow: bool,
}

/// Explicit attribute overrides for one emission. Any `Some` field beats the
/// kind default for every particle of that emission.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub size: Option<f64>,
    pub color: Option<String>,
    pub decay: Option<f64>,
    pub gravity: Option<f64>,
}

fn sample(range: (f64, f64), r: f64) -> f64 {
    range.0 + (range.1 - range.0) * r
}

/// Build one fully-populated particle at `(x, y)`.
pub fn spawn(
    x: f64,
    y: f64,
    kind: ParticleKind,
    overrides: &Overrides,
    rng: &mut impl FnMut() -> f64,
) -> Particle {
    let d = kind.defaults();
    let color = overrides.color.clone().unwrap_or_else(|| {
        let idx = ((rng)() * d.palette.len() as f64) as usize;
        d.palette[idx.min(d.palette.len() - 1)].to_string()
    });
    let (rotation, rotation_speed) = if d.spin {
        ((rng)() * 360.0, ((rng)() - 0.5) * 10.0)
    } else {
        (0.0, 0.0)
    };
    Particle {
        kind,
        x,
        y,
        vx: overrides.vx.unwrap_or_else(|| sample(d.vx, (rng)())),
        vy: overrides.vy.unwrap_or_else(|| sample(d.vy, (rng)())),
        size: overrides.size.unwrap_or_else(|| sample(d.size, (rng)())),
        color,
        life: 1.0,
        decay: overrides.decay.unwrap_or(d.decay),
        gravity: overrides.gravity.unwrap_or(d.gravity),
        rotation,
        rotation_speed,
        glow: d.glow,
    }
}

/// Initial velocity of the i-th particle of an N-particle radial burst:
/// directions evenly spaced by `2π/N`, magnitude `speed`.
pub fn radial_velocity(i: usize, count: usize, speed: f64) -> (f64, f64) {
    let angle = 2.0 * PI * i as f64 / count.max(1) as f64;
    (angle.cos() * speed, angle.sin() * speed)
}

/// One physics tick: integrate position, gravity, spin, then life. Particles
/// whose life crossed zero are removed and never rendered again.
pub fn step(particles: &mut Vec<Particle>) {
    particles.retain_mut(|p| {
        p.x += p.vx;
        p.y += p.vy;
        if p.gravity != 0.0 {
            p.vy += p.gravity;
        }
        if p.rotation_speed != 0.0 {
            p.rotation += p.rotation_speed;
        }
        p.life -= p.decay;
        p.life > 0.0
    });
}

/// Bound the live set: drop the oldest particles (front of the vector) when
/// an emission pushes the count past `max`.
pub fn evict_overflow(particles: &mut Vec<Particle>, max: usize) {
    if particles.len() > max {
        let excess = particles.len() - max;
        particles.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic rng: cycles through the given fractions.
    fn seq_rng(values: Vec<f64>) -> impl FnMut() -> f64 {
        let mut i = 0;
        move || {
            let v = values[i % values.len()];
            i += 1;
            v
        }
    }

    #[test]
    fn spawned_particle_starts_at_full_life() {
        let mut rng = seq_rng(vec![0.5]);
        for kind in [
            ParticleKind::Sparkle,
            ParticleKind::Confetti,
            ParticleKind::Heart,
            ParticleKind::Star,
            ParticleKind::Dust,
            ParticleKind::Plain,
        ] {
            let p = spawn(0.0, 0.0, kind, &Overrides::default(), &mut rng);
            assert_eq!(p.life, 1.0, "kind {:?}", kind);
            assert_eq!(p.decay, kind.defaults().decay);
        }
    }

    #[test]
    fn defaults_stay_inside_declared_ranges() {
        for frac in [0.0, 0.25, 0.5, 0.999] {
            let mut rng = seq_rng(vec![frac]);
            let p = spawn(10.0, 20.0, ParticleKind::Confetti, &Overrides::default(), &mut rng);
            let d = ParticleKind::Confetti.defaults();
            assert!(p.vx >= d.vx.0 && p.vx <= d.vx.1);
            assert!(p.vy >= d.vy.0 && p.vy <= d.vy.1);
            assert!(p.size >= d.size.0 && p.size <= d.size.1);
            assert!(p.rotation >= 0.0 && p.rotation < 360.0);
            assert!(p.rotation_speed >= -5.0 && p.rotation_speed <= 5.0);
        }
    }

    #[test]
    fn overrides_beat_kind_defaults() {
        let mut rng = seq_rng(vec![0.5]);
        let ov = Overrides {
            vx: Some(9.0),
            vy: Some(-9.0),
            size: Some(42.0),
            color: Some("teal".into()),
            decay: Some(0.5),
            gravity: Some(1.25),
        };
        let p = spawn(0.0, 0.0, ParticleKind::Heart, &ov, &mut rng);
        assert_eq!(p.vx, 9.0);
        assert_eq!(p.vy, -9.0);
        assert_eq!(p.size, 42.0);
        assert_eq!(p.color, "teal");
        assert_eq!(p.decay, 0.5);
        assert_eq!(p.gravity, 1.25);
    }

    #[test]
    fn unknown_kind_falls_back_to_plain_with_sparkle_physics() {
        let kind = ParticleKind::from_name("galaxy");
        assert_eq!(kind, ParticleKind::Plain);
        assert!(std::ptr::eq(kind.defaults(), ParticleKind::Sparkle.defaults()));
    }

    #[test]
    fn life_decreases_by_exactly_decay_each_tick_until_removal() {
        let mut rng = seq_rng(vec![0.5]);
        let mut particles = vec![spawn(0.0, 0.0, ParticleKind::Dust, &Overrides::default(), &mut rng)];
        let decay = particles[0].decay;
        let mut expected = 1.0;
        let mut ticks = 0;
        while !particles.is_empty() {
            step(&mut particles);
            expected -= decay;
            ticks += 1;
            if let Some(p) = particles.first() {
                assert!((p.life - expected).abs() < 1e-12);
            } else {
                assert!(expected <= 0.0 + decay);
            }
            assert!(ticks < 10_000, "particle never died");
        }
        // dust decay 0.025 => dead within a tick of the 40-tick nominal span
        assert!((40..=41).contains(&ticks), "ticks = {ticks}");
    }

    #[test]
    fn gravity_and_spin_integrate_each_tick() {
        let mut rng = seq_rng(vec![0.0]);
        let ov = Overrides {
            vx: Some(1.0),
            vy: Some(0.0),
            ..Default::default()
        };
        let mut particles = vec![spawn(0.0, 0.0, ParticleKind::Confetti, &ov, &mut rng)];
        let g = particles[0].gravity;
        let spin = particles[0].rotation_speed;
        let rot0 = particles[0].rotation;
        step(&mut particles);
        let p = &particles[0];
        assert_eq!(p.x, 1.0);
        // velocity applied before gravity: first tick moves by the initial vy
        assert_eq!(p.y, 0.0);
        assert!((p.vy - g).abs() < 1e-12);
        assert!((p.rotation - (rot0 + spin)).abs() < 1e-12);
    }

    #[test]
    fn radial_burst_directions_are_evenly_spaced() {
        let count = 12;
        let speed = 4.0;
        let mut prev_angle = None;
        for i in 0..count {
            let (vx, vy) = radial_velocity(i, count, speed);
            assert!((vx.hypot(vy) - speed).abs() < 1e-9);
            let angle = vy.atan2(vx);
            if let Some(prev) = prev_angle {
                let mut delta: f64 = angle - prev;
                while delta < 0.0 {
                    delta += 2.0 * PI;
                }
                assert!((delta - 2.0 * PI / count as f64).abs() < 1e-9);
            }
            prev_angle = Some(angle);
        }
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut rng = seq_rng(vec![0.5]);
        let mut particles: Vec<Particle> = (0..10)
            .map(|i| spawn(i as f64, 0.0, ParticleKind::Sparkle, &Overrides::default(), &mut rng))
            .collect();
        evict_overflow(&mut particles, 6);
        assert_eq!(particles.len(), 6);
        // survivors are the newest emissions
        assert_eq!(particles[0].x, 4.0);
        assert_eq!(particles[5].x, 9.0);
    }
}
