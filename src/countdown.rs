//! Wall-clock countdown arithmetic for the lock gate and the dinner timer.
//! Pure time-difference-to-display computation; the 1 Hz tickers that feed
//! it live in the orchestrator.

/// Hours/minutes/seconds remaining, clamped at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountdownParts {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub finished: bool,
}

impl CountdownParts {
    pub const ZERO: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
        finished: true,
    };
}

/// Split `target - now` (milliseconds) into display units. At or past the
/// target this is all zeros with `finished` set.
pub fn parts_until(target_ms: f64, now_ms: f64) -> CountdownParts {
    let diff = target_ms - now_ms;
    if !diff.is_finite() || diff <= 0.0 {
        return CountdownParts::ZERO;
    }
    let total_seconds = (diff / 1000.0).floor() as u64;
    CountdownParts {
        hours: total_seconds / 3600,
        minutes: (total_seconds % 3600) / 60,
        seconds: total_seconds % 60,
        finished: false,
    }
}

/// Two-digit zero-padded display cell.
pub fn pad2(value: u64) -> String {
    format!("{value:02}")
}

/// The dinner timer pulses during its last minute.
pub fn in_final_minute(target_ms: f64, now_ms: f64) -> bool {
    let diff = target_ms - now_ms;
    diff > 0.0 && diff < 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_difference_into_display_units() {
        // 2h 3m 4s ahead
        let target = 1_000_000.0 + (2 * 3600 + 3 * 60 + 4) as f64 * 1000.0;
        let parts = parts_until(target, 1_000_000.0);
        assert_eq!(parts.hours, 2);
        assert_eq!(parts.minutes, 3);
        assert_eq!(parts.seconds, 4);
        assert!(!parts.finished);
    }

    #[test]
    fn sub_second_remainders_floor_to_whole_seconds() {
        let parts = parts_until(1_999.0, 0.0);
        assert_eq!(parts.seconds, 1);
        let parts = parts_until(999.0, 0.0);
        assert_eq!(parts.seconds, 0);
        assert!(!parts.finished);
    }

    #[test]
    fn at_or_past_target_clamps_to_zero_and_finishes() {
        assert_eq!(parts_until(5_000.0, 5_000.0), CountdownParts::ZERO);
        assert_eq!(parts_until(5_000.0, 9_000.0), CountdownParts::ZERO);
    }

    #[test]
    fn invalid_instants_count_as_already_reached() {
        assert_eq!(parts_until(f64::NAN, 0.0), CountdownParts::ZERO);
    }

    #[test]
    fn display_cells_are_zero_padded() {
        assert_eq!(pad2(0), "00");
        assert_eq!(pad2(7), "07");
        assert_eq!(pad2(59), "59");
        assert_eq!(pad2(120), "120");
    }

    #[test]
    fn final_minute_window_is_exclusive_of_zero() {
        assert!(in_final_minute(59_000.0, 0.0));
        assert!(!in_final_minute(60_000.0, 0.0));
        assert!(!in_final_minute(0.0, 0.0));
    }
}
