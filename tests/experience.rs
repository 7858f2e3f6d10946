// Integration tests (native) for the `owl-post` crate.
// These tests avoid wasm-specific functionality and exercise pure Rust logic so
// they can run under `cargo test` on the host.

use owl_post::config::ExperienceConfig;
use owl_post::countdown::{pad2, parts_until};
use owl_post::particles::model::{self, Overrides, ParticleKind};
use owl_post::particles::{EmitSpec, celebration_plan};
use owl_post::scenes::{FlowState, Screen, gate_open, initial_flow};

#[test]
fn missing_or_broken_config_falls_back_to_defaults() {
    let defaults = ExperienceConfig::default();
    assert_eq!(ExperienceConfig::from_json(None), defaults);
    assert_eq!(ExperienceConfig::from_json(Some("")), defaults);
    assert_eq!(ExperienceConfig::from_json(Some("{not json")), defaults);
    assert!(!defaults.bypass_lock_screen);
    assert!(!defaults.debug_mode);
}

#[test]
fn config_overrides_apply_and_omissions_keep_defaults() {
    let cfg = ExperienceConfig::from_json(Some(
        r#"{"BYPASS_LOCK_SCREEN": true, "DINNER_DATE": "2026-12-24T19:00:00+01:00"}"#,
    ));
    assert!(cfg.bypass_lock_screen);
    assert_eq!(cfg.dinner_date, "2026-12-24T19:00:00+01:00");
    assert_eq!(cfg.unlock_time, ExperienceConfig::default().unlock_time);
}

#[test]
fn countdown_cells_render_as_zero_padded_pairs() {
    let now = 0.0;
    let target = ((5 * 3600 + 7 * 60 + 9) * 1000) as f64;
    let parts = parts_until(target, now);
    let cells = [pad2(parts.hours), pad2(parts.minutes), pad2(parts.seconds)];
    assert_eq!(cells, ["05".to_string(), "07".into(), "09".into()]);
}

#[test]
fn lock_gate_respects_time_bypass_and_stickiness() {
    let unlock_at = 1_000_000.0;
    assert!(!gate_open(false, false, unlock_at - 1.0, Some(unlock_at)));
    assert!(gate_open(false, false, unlock_at, Some(unlock_at)));
    assert!(gate_open(false, true, 0.0, Some(unlock_at)));

    let mut flow = FlowState::new(Screen::Lock);
    flow.note_unlock();
    assert!(gate_open(flow.unlocked, false, 0.0, Some(unlock_at)));
}

#[test]
fn startup_screen_tracks_the_gate_condition() {
    let unlock_at = 1_000_000.0;
    assert_eq!(initial_flow(false, unlock_at - 1.0, Some(unlock_at)).screen, Screen::Lock);

    let open = initial_flow(false, unlock_at, Some(unlock_at));
    assert_eq!(open.screen, Screen::Intro);
    assert!(open.unlocked, "already-open gate implies unlocked");

    let bypassed = initial_flow(true, 0.0, Some(unlock_at));
    assert_eq!(bypassed.screen, Screen::Intro);
    assert!(bypassed.unlocked);
}

#[test]
fn only_one_transition_runs_at_a_time() {
    let mut flow = FlowState::new(Screen::Intro);
    assert!(flow.try_begin());
    assert!(!flow.try_begin());
    assert!(!flow.try_begin());
    flow.land(Screen::Owl);
    assert_eq!(flow.screen, Screen::Owl);
    assert!(flow.try_begin());
}

#[test]
fn celebration_plan_stays_inside_the_horizontal_span() {
    let (w, h) = (1280.0, 720.0);
    let mut rng = {
        let mut seed = 0.1_f64;
        move || {
            seed = (seed * 31.0) % 1.0;
            seed
        }
    };
    for (delay, spec) in celebration_plan(w, h, &mut rng) {
        assert!(delay >= 0);
        let (EmitSpec::Burst { x, .. } | EmitSpec::Plain { x, .. }) = spec;
        assert!((0.0..=w).contains(&x), "emission at x = {x}");
    }
}

#[test]
fn radial_burst_momentum_cancels_out() {
    let count = 30;
    let speed = 4.0;
    let (mut sum_x, mut sum_y) = (0.0_f64, 0.0_f64);
    for i in 0..count {
        let (vx, vy) = model::radial_velocity(i, count, speed);
        sum_x += vx;
        sum_y += vy;
    }
    assert!(sum_x.abs() < 1e-9);
    assert!(sum_y.abs() < 1e-9);
}

#[test]
fn unknown_kind_names_fall_back_to_a_plain_particle() {
    assert_eq!(ParticleKind::from_name("sparkle"), ParticleKind::Sparkle);
    assert_eq!(ParticleKind::from_name("glitterbomb"), ParticleKind::Plain);
    let mut rng = || 0.5;
    let p = model::spawn(1.0, 2.0, ParticleKind::Plain, &Overrides::default(), &mut rng);
    assert_eq!(p.life, 1.0);
}
