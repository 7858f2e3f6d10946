//! Startup configuration: unlock/dinner instants and debug switches.
//!
//! The hosting page passes one JSON document to `start_experience`; keys
//! are SCREAMING_SNAKE_CASE to match the page's config block. Parsing happens exactly once
//! and any malformed input falls back to the built-in defaults with a
//! warning, never an error.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExperienceConfig {
    /// Skip the lock screen entirely (testing aid).
    pub bypass_lock_screen: bool,
    /// ISO-8601 instant before which the lock screen blocks progress.
    pub unlock_time: String,
    /// ISO-8601 instant the dinner countdown runs toward.
    pub dinner_date: String,
    /// Verbose console logging.
    pub debug_mode: bool,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            bypass_lock_screen: false,
            unlock_time: "2026-02-01T18:45:00+01:00".to_string(),
            dinner_date: "2026-02-01T19:15:00+01:00".to_string(),
            debug_mode: false,
        }
    }
}

impl ExperienceConfig {
    /// Parse the startup JSON; `None`, empty or malformed input yields the
    /// defaults.
    pub fn from_json(json: Option<&str>) -> Self {
        let Some(raw) = json.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str(raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("bad config JSON ({e}); using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_input_yields_defaults() {
        assert_eq!(ExperienceConfig::from_json(None), ExperienceConfig::default());
        assert_eq!(ExperienceConfig::from_json(Some("  ")), ExperienceConfig::default());
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        let cfg = ExperienceConfig::from_json(Some("{not json"));
        assert_eq!(cfg, ExperienceConfig::default());
    }

    #[test]
    fn original_config_keys_are_honored() {
        let cfg = ExperienceConfig::from_json(Some(
            r#"{
                "BYPASS_LOCK_SCREEN": true,
                "UNLOCK_TIME": "2027-01-01T00:00:00Z",
                "DINNER_DATE": "2027-01-01T01:00:00Z",
                "DEBUG_MODE": true
            }"#,
        ));
        assert!(cfg.bypass_lock_screen);
        assert!(cfg.debug_mode);
        assert_eq!(cfg.unlock_time, "2027-01-01T00:00:00Z");
        assert_eq!(cfg.dinner_date, "2027-01-01T01:00:00Z");
    }

    #[test]
    fn partial_documents_keep_remaining_defaults() {
        let cfg = ExperienceConfig::from_json(Some(r#"{"BYPASS_LOCK_SCREEN": true}"#));
        assert!(cfg.bypass_lock_screen);
        assert_eq!(cfg.unlock_time, ExperienceConfig::default().unlock_time);
    }
}
