// ── Companion Engine ───────────────────────────────────────────────────────
// The adaptive response core: classifier → scheduler → escalation →
// selector → learner, invoked synchronously in sequence every tick.
//
// No hidden globals: everything session-scoped lives in this context struct,
// so independent sessions can run side by side in one process. Hosts that
// call in from more than one thread must wrap the engine in a single mutex
// around the full tick (see `SharedEngine` in lib.rs) — the design assumes
// sequential consistency.
//
// Nothing here blocks on I/O and nothing is fatal: every tick produces a
// valid (possibly speechless) output.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod escalation;
pub mod learner;
pub mod renderer;
pub mod scheduler;
pub mod selector;
pub mod store;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::info;

use crate::atoms::constants::STATE_VERSION;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{
    BehaviorSnapshot, CareLevel, ControlEvent, DisplayCommand, Mood, OutcomeEvent, PersistedState,
    Presence, ResponseType, SensorSample, SpeechCommand, StatusSnapshot, TickOutput,
};

use catalog::MessageCatalog;
use classifier::ActivityClassifier;
use config::EngineConfig;
use escalation::{CareState, SleepSource};
use learner::PreferenceTable;
use scheduler::ReminderTimers;
use selector::ResponseSelector;
use store::StateStore;

pub struct CompanionEngine {
    config: EngineConfig,
    classifier: ActivityClassifier,
    timers: ReminderTimers,
    care: CareState,
    selector: ResponseSelector,
    prefs: PreferenceTable,

    user_name: String,
    away_since: Option<DateTime<Utc>>,
    /// Greet on the next possible tick (session start, wake).
    pending_greeting: bool,
    last_snapshot: BehaviorSnapshot,

    // Daily stats, reset when the UTC date rolls over.
    reminders_sent_today: u32,
    reminders_by_category: BTreeMap<ResponseType, u32>,
    last_stats_reset: Option<DateTime<Utc>>,
}

impl CompanionEngine {
    pub fn new(config: EngineConfig, now: DateTime<Utc>) -> Self {
        let user_name = config.user_name.clone();
        Self {
            classifier: ActivityClassifier::new(&config),
            timers: ReminderTimers::new(&config, now),
            care: CareState::new(&config),
            selector: ResponseSelector::new(MessageCatalog::builtin(), &config),
            prefs: PreferenceTable::new(&config),
            config,
            user_name,
            away_since: None,
            pending_greeting: true,
            last_snapshot: BehaviorSnapshot::idle(),
            reminders_sent_today: 0,
            reminders_by_category: BTreeMap::new(),
            last_stats_reset: Some(now),
        }
    }

    /// Restore a previous session's state and build the engine around it.
    pub fn with_state(config: EngineConfig, state: &PersistedState, now: DateTime<Utc>) -> Self {
        let mut engine = Self::new(config, now);
        engine.restore(state);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── The tick ───────────────────────────────────────────────────

    /// One update cycle. Always returns a valid output; `speech` is `None`
    /// on the vast majority of ticks.
    pub fn tick(&mut self, sample: &SensorSample) -> TickOutput {
        let now = sample.at;
        self.maybe_reset_daily_stats(now);

        let snapshot = self.classifier.classify(sample, &self.timers);

        // ── Auto sleep / wake ────────────────────────────────────
        if snapshot.presence == Presence::Away {
            self.away_since.get_or_insert(now);
        } else {
            self.away_since = None;
        }
        if self.config.auto_sleep && !self.care.is_sleeping() {
            if let Some(since) = self.away_since {
                if now - since >= self.config.sleep_after() {
                    self.care.sleep(SleepSource::Auto);
                }
            }
        }
        if self.care.sleep_source() == Some(SleepSource::Auto) && sample.motion_detected {
            self.care.wake();
            self.pending_greeting = true;
        }

        if snapshot.has_positive_behavior {
            self.care.celebrate();
        }

        let escalated = self.care.evaluate(&snapshot);

        // ── Emission: at most one message per tick ───────────────
        let speech = if self.care.is_sleeping() {
            None
        } else {
            self.compose(now, &snapshot, escalated)
        };

        let display = DisplayCommand {
            mood: self.care.mood(),
            intensity: self.care.care_level().intensity(),
        };
        self.care.mark_mood_displayed();
        self.last_snapshot = snapshot;

        TickOutput { display, speech }
    }

    /// Pick the single category worth speaking about this tick, then run it
    /// through the selector. Greeting and celebration outrank reminders;
    /// among reminders, urgent physical needs come first.
    fn compose(
        &mut self,
        now: DateTime<Utc>,
        snapshot: &BehaviorSnapshot,
        escalated: bool,
    ) -> Option<SpeechCommand> {
        let category = if self.pending_greeting {
            Some(ResponseType::Greeting)
        } else if self.care.mood() == Mood::Celebrating {
            Some(ResponseType::Celebration)
        } else {
            let due = self.timers.tick(now, snapshot);
            ResponseType::PRIORITY
                .iter()
                .copied()
                .find(|c| due.contains(c))
                .or_else(|| {
                    // Escalation commentary only reaches someone at the desk.
                    (escalated && snapshot.presence == Presence::Present).then(|| {
                        match self.care.care_level() {
                            CareLevel::Concerned | CareLevel::Worried => ResponseType::Concern,
                            _ => ResponseType::Encouragement,
                        }
                    })
                })
        };
        let category = category?;

        let text = self.selector.select(
            category,
            now,
            self.care.mood(),
            self.care.care_level(),
            self.prefs.effectiveness(category),
            &self.user_name,
        )?;

        if category == ResponseType::Greeting {
            self.pending_greeting = false;
        }
        if category.is_timed() {
            self.reminders_sent_today += 1;
            *self.reminders_by_category.entry(category).or_insert(0) += 1;
        }
        info!("[engine] {}: {}", category.as_str(), text);
        Some(SpeechCommand {
            text,
            urgency: self.care.care_level().urgency(),
        })
    }

    // ── Feedback and control ───────────────────────────────────────

    /// Fold in one outcome observation from the response-detection
    /// collaborator. Serialized into the tick boundary by the host.
    pub fn record_outcome(&mut self, event: &OutcomeEvent, now: DateTime<Utc>) {
        self.prefs.record(event.category, event.effective);
        if event.effective {
            self.care.record_effective();
            self.timers.mark_satisfied(event.category, now);
        } else {
            self.care.record_ignored();
        }
    }

    /// Apply a host control event. Invalid events are rejected with the
    /// engine state unchanged.
    pub fn apply_control(&mut self, event: &ControlEvent, now: DateTime<Utc>) -> EngineResult<()> {
        match event {
            ControlEvent::Sleep => {
                self.care.sleep(SleepSource::Manual);
                Ok(())
            }
            ControlEvent::Wake => {
                if self.care.is_sleeping() {
                    self.care.wake();
                    self.pending_greeting = true;
                }
                Ok(())
            }
            ControlEvent::Snooze { category, minutes } => {
                self.timers
                    .snooze(*category, chrono::Duration::minutes(*minutes), now)
            }
            ControlEvent::SetUserName { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(EngineError::invalid_control("user name must not be empty"));
                }
                self.user_name = name.to_string();
                info!("[engine] User name set to {name}");
                Ok(())
            }
            ControlEvent::SetCareLevel { level } => {
                self.care.force_care_level(*level);
                Ok(())
            }
        }
    }

    /// Disable or re-enable message emission (display keeps updating).
    pub fn set_responses_enabled(&mut self, enabled: bool) {
        self.selector.set_enabled(enabled);
    }

    // ── Diagnostics ────────────────────────────────────────────────

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            mood: self.care.mood(),
            care_level: self.care.care_level(),
            presence: self.last_snapshot.presence,
            posture: self.last_snapshot.posture,
            inactivity_secs: self.last_snapshot.inactivity.num_seconds(),
            activity_level: self.last_snapshot.activity_level,
            consecutive_ignored: self.care.consecutive_ignored(),
            user_name: self.user_name.clone(),
            reminders_sent: self.reminders_sent_today,
            total_sitting_secs: self.classifier.total_sitting().num_seconds(),
            total_standing_secs: self.classifier.total_standing().num_seconds(),
        }
    }

    // ── Persistence ────────────────────────────────────────────────

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            version: STATE_VERSION,
            care_level: self.care.care_level(),
            mood: self.care.mood(),
            consecutive_ignored: self.care.consecutive_ignored(),
            user_name: self.user_name.clone(),
            last_fired: self.timers.export_anchors(),
            preferences: self.prefs.export(),
            reminders_sent_today: self.reminders_sent_today,
            reminders_by_category: self.reminders_by_category.clone(),
            last_stats_reset: self.last_stats_reset,
        }
    }

    pub fn restore(&mut self, state: &PersistedState) {
        self.care
            .restore(state.care_level, state.mood, state.consecutive_ignored);
        self.timers.restore_anchors(&state.last_fired);
        self.prefs.restore(&state.preferences);
        self.user_name = state.user_name.clone();
        self.reminders_sent_today = state.reminders_sent_today;
        self.reminders_by_category = state.reminders_by_category.clone();
        self.last_stats_reset = state.last_stats_reset.or(self.last_stats_reset);
    }

    pub fn save(&self, store: &StateStore) -> EngineResult<()> {
        store.save_state(&self.persisted_state())
    }

    pub fn restore_from(&mut self, store: &StateStore) {
        let state = store.load_state();
        self.restore(&state);
    }

    fn maybe_reset_daily_stats(&mut self, now: DateTime<Utc>) {
        let last = self.last_stats_reset.get_or_insert(now);
        if now.date_naive() > last.date_naive() {
            self.reminders_sent_today = 0;
            self.reminders_by_category.clear();
            self.last_stats_reset = Some(now);
            info!("[engine] Daily stats reset");
        }
    }
}
