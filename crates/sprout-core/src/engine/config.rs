// ── Engine configuration ───────────────────────────────────────────────────
// Every tunable threshold in one serde struct with per-field defaults.
// Loaded from a TOML file; a missing file or a bad value falls back to the
// documented defaults with a logged warning, never a crash.

use std::path::Path;

use chrono::Duration;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::atoms::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Substituted for `{name}` in message templates.
    pub user_name: String,

    // ── Reminder intervals (minutes) ──────────────────────────────
    pub hydration_interval_min: i64,
    pub movement_interval_min: i64,
    pub posture_interval_min: i64,

    // ── Escalation thresholds (minutes, ascending) ────────────────
    pub inactivity_thresholds_min: [i64; 3],

    // ── Presence and sleep ────────────────────────────────────────
    pub presence_timeout_min: i64,
    pub auto_sleep: bool,
    pub sleep_after_min: i64,

    // ── Response pacing ───────────────────────────────────────────
    pub response_cooldown_secs: i64,

    // ── Classification ────────────────────────────────────────────
    pub posture_confidence_threshold: f32,
    pub good_posture_threshold: f32,
    pub activity_window_samples: usize,
    pub max_sedentary_min: i64,

    // ── Adaptation ────────────────────────────────────────────────
    pub learning_enabled: bool,
    pub learning_rate: f32,
    pub escalation_enabled: bool,
    pub celebration_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            hydration_interval_min: HYDRATION_INTERVAL_MIN,
            movement_interval_min: MOVEMENT_INTERVAL_MIN,
            posture_interval_min: POSTURE_INTERVAL_MIN,
            inactivity_thresholds_min: [
                NORMAL_INACTIVITY_MIN,
                CONCERNED_INACTIVITY_MIN,
                URGENT_INACTIVITY_MIN,
            ],
            presence_timeout_min: PRESENCE_TIMEOUT_MIN,
            auto_sleep: true,
            sleep_after_min: SLEEP_AFTER_MIN,
            response_cooldown_secs: RESPONSE_COOLDOWN_SECS,
            posture_confidence_threshold: POSTURE_CONFIDENCE_THRESHOLD,
            good_posture_threshold: GOOD_POSTURE_THRESHOLD,
            activity_window_samples: ACTIVITY_WINDOW_SAMPLES,
            max_sedentary_min: MAX_SEDENTARY_MIN,
            learning_enabled: true,
            learning_rate: LEARNING_RATE,
            escalation_enabled: true,
            celebration_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<EngineConfig>(&text) {
                Ok(config) => {
                    info!("[config] Loaded {}", path.display());
                    config.sanitized()
                }
                Err(e) => {
                    warn!(
                        "[config] {} is not valid TOML ({e}); using defaults",
                        path.display()
                    );
                    EngineConfig::default()
                }
            },
            Err(e) => {
                info!(
                    "[config] No config at {} ({e}); using defaults",
                    path.display()
                );
                EngineConfig::default()
            }
        }
    }

    /// Clamp out-of-range values rather than erroring on them.
    fn sanitized(mut self) -> Self {
        if self.user_name.trim().is_empty() {
            warn!("[config] Empty user_name; using \"{DEFAULT_USER_NAME}\"");
            self.user_name = DEFAULT_USER_NAME.to_string();
        }
        self.learning_rate = self.learning_rate.clamp(0.0, 1.0);
        self.posture_confidence_threshold = self.posture_confidence_threshold.clamp(0.0, 1.0);
        self.good_posture_threshold = self.good_posture_threshold.clamp(0.0, 1.0);
        if self.activity_window_samples == 0 {
            self.activity_window_samples = ACTIVITY_WINDOW_SAMPLES;
        }
        self
    }

    // Duration views. Config stores plain integers so the TOML stays flat.

    pub fn hydration_interval(&self) -> Duration {
        Duration::minutes(self.hydration_interval_min)
    }

    pub fn movement_interval(&self) -> Duration {
        Duration::minutes(self.movement_interval_min)
    }

    pub fn posture_interval(&self) -> Duration {
        Duration::minutes(self.posture_interval_min)
    }

    pub fn presence_timeout(&self) -> Duration {
        Duration::minutes(self.presence_timeout_min)
    }

    pub fn sleep_after(&self) -> Duration {
        Duration::minutes(self.sleep_after_min)
    }

    pub fn response_cooldown(&self) -> Duration {
        Duration::seconds(self.response_cooldown_secs)
    }

    pub fn max_sedentary(&self) -> Duration {
        Duration::minutes(self.max_sedentary_min)
    }

    pub fn inactivity_thresholds(&self) -> [Duration; 3] {
        self.inactivity_thresholds_min.map(Duration::minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = EngineConfig::default();
        assert_eq!(c.user_name, "friend");
        assert_eq!(c.hydration_interval_min, 45);
        assert_eq!(c.inactivity_thresholds_min, [30, 60, 120]);
        assert_eq!(c.response_cooldown_secs, 5);
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let config: EngineConfig =
            toml::from_str("user_name = \"sam\"\nhydration_interval_min = 20\n").unwrap();
        assert_eq!(config.user_name, "sam");
        assert_eq!(config.hydration_interval_min, 20);
        assert_eq!(config.movement_interval_min, 60);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = EngineConfig::load(Path::new("/nonexistent/sprout.toml"));
        assert_eq!(config.user_name, "friend");
    }

    #[test]
    fn sanitize_rejects_empty_name_and_bad_rate() {
        let config = EngineConfig {
            user_name: "  ".into(),
            learning_rate: 3.0,
            ..EngineConfig::default()
        }
        .sanitized();
        assert_eq!(config.user_name, "friend");
        assert!((config.learning_rate - 1.0).abs() < f32::EPSILON);
    }
}
