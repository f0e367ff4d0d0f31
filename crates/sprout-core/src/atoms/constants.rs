// ── Sprout Atoms: Constants ────────────────────────────────────────────────
// All named tunables for the crate live here.
// Rationale: collecting constants in one place eliminates magic numbers,
// makes auditing easier, and keeps the engine code self-documenting.
// `EngineConfig` defaults read from these; runtime code reads the config,
// not these constants, so a config file can override every one of them.

// ── Inactivity escalation thresholds (minutes) ─────────────────────────────
// Crossing each threshold raises the care level by one step, one step per
// tick at most. Three thresholds, four care levels.
pub const NORMAL_INACTIVITY_MIN: i64 = 30;
pub const CONCERNED_INACTIVITY_MIN: i64 = 60;
pub const URGENT_INACTIVITY_MIN: i64 = 120;

// ── Reminder intervals (minutes) ───────────────────────────────────────────
pub const HYDRATION_INTERVAL_MIN: i64 = 45;
pub const MOVEMENT_INTERVAL_MIN: i64 = 60;
pub const POSTURE_INTERVAL_MIN: i64 = 30;

// ── Presence and sleep ─────────────────────────────────────────────────────
// A user with no motion, posture, or presence signal for this long is Away.
pub const PRESENCE_TIMEOUT_MIN: i64 = 5;
// With auto-sleep enabled, this much continuous Away time puts the
// companion to sleep until motion returns.
pub const SLEEP_AFTER_MIN: i64 = 30;

// ── Response pacing ────────────────────────────────────────────────────────
// Minimum wall-clock gap between any two emitted messages.
pub const RESPONSE_COOLDOWN_SECS: i64 = 5;
// Recency bonus in message scoring saturates at this many minutes.
pub const RECENCY_BONUS_CAP_MIN: i64 = 30;

// ── Classification ─────────────────────────────────────────────────────────
// Posture labels below this confidence are treated as Unknown and raise
// no posture-based need.
pub const POSTURE_CONFIDENCE_THRESHOLD: f32 = 0.7;
// Posture quality below this counts as degraded for the posture need.
pub const GOOD_POSTURE_THRESHOLD: f32 = 0.7;
// Rolling window length (samples) for the activity level average.
pub const ACTIVITY_WINDOW_SAMPLES: usize = 50;
// Continuous sitting beyond this many minutes raises the break need.
pub const MAX_SEDENTARY_MIN: i64 = 60;

// ── Adaptation ─────────────────────────────────────────────────────────────
// EMA learning rate for per-category response effectiveness.
pub const LEARNING_RATE: f32 = 0.1;
// Preferences start neutral.
pub const NEUTRAL_EFFECTIVENESS: f32 = 0.5;
// This many consecutive ignored reminders escalate the care level.
pub const IGNORED_ESCALATION_STREAK: u32 = 3;

// ── Personalization ────────────────────────────────────────────────────────
pub const DEFAULT_USER_NAME: &str = "friend";

// ── Persistence ────────────────────────────────────────────────────────────
// Key under which the engine state blob is stored in the key/value table.
pub(crate) const STATE_KEY: &str = "companion_state";
// Bump when `PersistedState` changes shape incompatibly.
pub(crate) const STATE_VERSION: u32 = 1;
