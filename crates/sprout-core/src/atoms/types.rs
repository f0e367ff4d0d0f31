// ── Sprout Atoms: Pure Data Types ──────────────────────────────────────────
// All plain struct/enum definitions with no logic beyond small pure helpers.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::atoms::constants::{NEUTRAL_EFFECTIVENESS, STATE_VERSION};

// ═════════════════════════════════════════════════════════════════════════════
// Activity observation
// ═════════════════════════════════════════════════════════════════════════════

/// Whether a user is at the desk. Exactly one variant holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Away,
    Unknown,
}

/// Confirmed posture, mapped from an external confidence-scored label.
/// Labels below the confidence threshold become `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    Sitting,
    Standing,
    LeaningForward,
    Unknown,
}

/// A posture estimate from the external pose collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureReading {
    pub label: Posture,
    /// Estimator confidence in [0, 1].
    pub confidence: f32,
}

/// One periodic observation from the sensor collaborators.
/// Every field except `motion_detected` and `at` may be missing; missing
/// input degrades to Unknown/neutral, never to an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensorSample {
    pub motion_detected: bool,
    pub posture: Option<PostureReading>,
    /// External face/presence hint; `Some(true)` counts as a presence signal.
    pub presence_hint: Option<bool>,
    /// Ambient light in [0, 1], if the host has a light sensor.
    pub light_level: Option<f32>,
    pub at: DateTime<Utc>,
}

impl SensorSample {
    /// A bare sample carrying only a timestamp — every sensor missing.
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            motion_detected: false,
            posture: None,
            presence_hint: None,
            light_level: None,
            at,
        }
    }
}

/// Structured assessment of the user's current activity and needs.
/// Ephemeral: recomputed on every tick, never persisted.
///
/// `posture_quality` is only meaningful when `posture != Unknown`.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorSnapshot {
    /// Time since the last observed motion.
    pub inactivity: Duration,
    pub presence: Presence,
    pub posture: Posture,
    /// 1.0 = upright, stepping down as a poor-posture streak grows.
    pub posture_quality: f32,
    /// Rolling average of recent motion samples, in [0, 1].
    pub activity_level: f32,

    // Derived needs. Each is true only when the matching reminder timer has
    // elapsed AND the activity state satisfies its precondition.
    pub needs_hydration: bool,
    pub needs_movement: bool,
    pub needs_posture: bool,
    pub needs_break: bool,
    pub needs_support: bool,

    /// One-shot: the user just did something worth celebrating
    /// (stood up after sitting, acted on a reminder).
    pub has_positive_behavior: bool,
}

impl BehaviorSnapshot {
    /// A neutral snapshot: nothing known, nothing needed.
    pub fn idle() -> Self {
        Self {
            inactivity: Duration::zero(),
            presence: Presence::Unknown,
            posture: Posture::Unknown,
            posture_quality: 1.0,
            activity_level: 0.0,
            needs_hydration: false,
            needs_movement: false,
            needs_posture: false,
            needs_break: false,
            needs_support: false,
            has_positive_behavior: false,
        }
    }

    /// Whether any unmet care need is raised.
    pub fn has_unmet_need(&self) -> bool {
        self.needs_hydration || self.needs_movement || self.needs_posture || self.needs_break
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Mood and care level
// ═════════════════════════════════════════════════════════════════════════════

/// The externally displayed emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Caring,
    Concerned,
    Worried,
    Sleeping,
    Celebrating,
}

/// Ordered urgency tier, independent of the displayed mood.
/// Drives message tone and escalation; moves at most one step per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CareLevel {
    Gentle,
    Encouraging,
    Concerned,
    Worried,
}

impl CareLevel {
    /// One step up, saturating at `Worried`.
    pub fn escalated(self) -> CareLevel {
        match self {
            CareLevel::Gentle => CareLevel::Encouraging,
            CareLevel::Encouraging => CareLevel::Concerned,
            CareLevel::Concerned | CareLevel::Worried => CareLevel::Worried,
        }
    }

    /// One step down, flooring at `Gentle`.
    pub fn reduced(self) -> CareLevel {
        match self {
            CareLevel::Worried => CareLevel::Concerned,
            CareLevel::Concerned => CareLevel::Encouraging,
            CareLevel::Encouraging | CareLevel::Gentle => CareLevel::Gentle,
        }
    }

    /// Display intensity for the renderer, in (0, 1].
    pub fn intensity(self) -> f32 {
        match self {
            CareLevel::Gentle => 0.25,
            CareLevel::Encouraging => 0.5,
            CareLevel::Concerned => 0.75,
            CareLevel::Worried => 1.0,
        }
    }

    /// Speech urgency corresponding to this tier.
    pub fn urgency(self) -> Urgency {
        match self {
            CareLevel::Gentle => Urgency::Calm,
            CareLevel::Encouraging => Urgency::Raised,
            CareLevel::Concerned => Urgency::Insistent,
            CareLevel::Worried => Urgency::Urgent,
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Response categories
// ═════════════════════════════════════════════════════════════════════════════

/// Partition key for the message catalog and the preference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Hydration,
    Movement,
    Posture,
    Encouragement,
    Celebration,
    Concern,
    Greeting,
}

impl ResponseType {
    /// Every category, catalog order.
    pub const ALL: [ResponseType; 7] = [
        ResponseType::Hydration,
        ResponseType::Movement,
        ResponseType::Posture,
        ResponseType::Encouragement,
        ResponseType::Celebration,
        ResponseType::Concern,
        ResponseType::Greeting,
    ];

    /// Categories backed by a reminder timer.
    pub const TIMED: [ResponseType; 3] = [
        ResponseType::Hydration,
        ResponseType::Movement,
        ResponseType::Posture,
    ];

    /// Emission priority when several categories are due in one tick:
    /// urgent physical needs first.
    pub const PRIORITY: [ResponseType; 4] = [
        ResponseType::Posture,
        ResponseType::Movement,
        ResponseType::Hydration,
        ResponseType::Encouragement,
    ];

    pub fn is_timed(self) -> bool {
        Self::TIMED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Hydration => "hydration",
            ResponseType::Movement => "movement",
            ResponseType::Posture => "posture",
            ResponseType::Encouragement => "encouragement",
            ResponseType::Celebration => "celebration",
            ResponseType::Concern => "concern",
            ResponseType::Greeting => "greeting",
        }
    }
}

impl std::str::FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hydration" => Ok(ResponseType::Hydration),
            "movement" => Ok(ResponseType::Movement),
            "posture" => Ok(ResponseType::Posture),
            "encouragement" => Ok(ResponseType::Encouragement),
            "celebration" => Ok(ResponseType::Celebration),
            "concern" => Ok(ResponseType::Concern),
            "greeting" => Ok(ResponseType::Greeting),
            other => Err(format!("unknown response category: {other}")),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Inbound events
// ═════════════════════════════════════════════════════════════════════════════

/// Feedback from the response-detection collaborator: did the user act on
/// the last reminder of this category?
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub category: ResponseType,
    pub effective: bool,
}

/// Host-issued control commands, serialized into the tick boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlEvent {
    Sleep,
    Wake,
    Snooze {
        category: ResponseType,
        minutes: i64,
    },
    SetUserName {
        name: String,
    },
    SetCareLevel {
        level: CareLevel,
    },
}

// ═════════════════════════════════════════════════════════════════════════════
// Outbound commands
// ═════════════════════════════════════════════════════════════════════════════

/// Speech delivery tone for the audio/TTS collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Calm,
    Raised,
    Insistent,
    Urgent,
}

/// Symbolic command for the LED/animation collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DisplayCommand {
    pub mood: Mood,
    /// Animation intensity in (0, 1], derived from the care level.
    pub intensity: f32,
}

/// Symbolic command for the audio/TTS collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechCommand {
    pub text: String,
    pub urgency: Urgency,
}

/// Everything one tick produces. `speech` is `None` on most ticks.
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub display: DisplayCommand,
    pub speech: Option<SpeechCommand>,
}

/// Diagnostics view of the engine, for status commands and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub mood: Mood,
    pub care_level: CareLevel,
    pub presence: Presence,
    pub posture: Posture,
    pub inactivity_secs: i64,
    pub activity_level: f32,
    pub consecutive_ignored: u32,
    pub user_name: String,
    pub reminders_sent: u32,
    pub total_sitting_secs: i64,
    pub total_standing_secs: i64,
}

// ═════════════════════════════════════════════════════════════════════════════
// Persisted state
// ═════════════════════════════════════════════════════════════════════════════

/// The minimal state that survives restarts. Loadable/saveable idempotently:
/// `save(); load()` reproduces an identical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub care_level: CareLevel,
    pub mood: Mood,
    pub consecutive_ignored: u32,
    pub user_name: String,
    /// Per-category reminder timer anchors.
    pub last_fired: BTreeMap<ResponseType, DateTime<Utc>>,
    /// Learned per-category effectiveness, in [0, 1].
    pub preferences: BTreeMap<ResponseType, f32>,
    /// Reminders emitted since the last daily reset.
    pub reminders_sent_today: u32,
    pub reminders_by_category: BTreeMap<ResponseType, u32>,
    pub last_stats_reset: Option<DateTime<Utc>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        let preferences = ResponseType::ALL
            .iter()
            .map(|&rt| (rt, NEUTRAL_EFFECTIVENESS))
            .collect();
        Self {
            version: STATE_VERSION,
            care_level: CareLevel::Gentle,
            mood: Mood::Happy,
            consecutive_ignored: 0,
            user_name: crate::atoms::constants::DEFAULT_USER_NAME.to_string(),
            last_fired: BTreeMap::new(),
            preferences,
            reminders_sent_today: 0,
            reminders_by_category: BTreeMap::new(),
            last_stats_reset: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn care_level_saturates_at_both_ends() {
        assert_eq!(CareLevel::Worried.escalated(), CareLevel::Worried);
        assert_eq!(CareLevel::Gentle.reduced(), CareLevel::Gentle);
        assert_eq!(CareLevel::Gentle.escalated(), CareLevel::Encouraging);
        assert_eq!(CareLevel::Concerned.reduced(), CareLevel::Encouraging);
    }

    #[test]
    fn care_level_ordering_matches_escalation() {
        assert!(CareLevel::Gentle < CareLevel::Encouraging);
        assert!(CareLevel::Encouraging < CareLevel::Concerned);
        assert!(CareLevel::Concerned < CareLevel::Worried);
    }

    #[test]
    fn default_state_has_neutral_preferences() {
        let state = PersistedState::default();
        assert_eq!(state.care_level, CareLevel::Gentle);
        assert_eq!(state.mood, Mood::Happy);
        for rt in ResponseType::ALL {
            assert_eq!(state.preferences[&rt], 0.5);
        }
    }

    #[test]
    fn persisted_state_json_round_trip() {
        let mut state = PersistedState::default();
        state.care_level = CareLevel::Concerned;
        state.preferences.insert(ResponseType::Movement, 0.8);

        let json = serde_json::to_string(&state).unwrap();
        let back: PersistedState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn response_type_parses_from_str() {
        assert_eq!(
            "hydration".parse::<ResponseType>().unwrap(),
            ResponseType::Hydration
        );
        assert!("coffee".parse::<ResponseType>().is_err());
    }
}
