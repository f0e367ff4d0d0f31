// ── Escalation State Machine ───────────────────────────────────────────────
// Tracks the session's CareState: an ordered care level (urgency tone) and a
// displayed mood. The two are updated together but remain distinct axes.
//
// Transition rules:
//   - Inactivity crossing a threshold raises the care level by exactly one
//     step per tick, even when several thresholds were crossed at once; the
//     next tick takes the next step.
//   - Three consecutive ignored reminders raise it one step and re-arm the
//     counter.
//   - An effective response lowers it one step (floor Gentle) and zeroes the
//     ignored counter.
//   - Mood is recomputed each tick from (care level, positive behavior,
//     support need). Celebrating is a one-shot that reverts after display.
//   - Sleep overrides everything; wake returns to the need-derived mood.
//     While asleep the machine neither escalates nor recomputes mood.

use chrono::Duration;
use log::info;

use crate::atoms::constants::IGNORED_ESCALATION_STREAK;
use crate::atoms::types::{BehaviorSnapshot, CareLevel, Mood};
use crate::engine::config::EngineConfig;

/// Why the companion is asleep. Auto sleep lifts on returning motion;
/// manual sleep only lifts on an explicit wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepSource {
    Manual,
    Auto,
}

pub struct CareState {
    mood: Mood,
    care_level: CareLevel,
    consecutive_ignored: u32,
    last_response_effective: bool,
    sleep: Option<SleepSource>,
    celebration_pending: bool,

    thresholds: [Duration; 3],
    escalation_enabled: bool,
    celebration_enabled: bool,
}

impl CareState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mood: Mood::Happy,
            care_level: CareLevel::Gentle,
            consecutive_ignored: 0,
            last_response_effective: false,
            sleep: None,
            celebration_pending: false,
            thresholds: config.inactivity_thresholds(),
            escalation_enabled: config.escalation_enabled,
            celebration_enabled: config.celebration_enabled,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn care_level(&self) -> CareLevel {
        self.care_level
    }

    pub fn consecutive_ignored(&self) -> u32 {
        self.consecutive_ignored
    }

    pub fn last_response_effective(&self) -> bool {
        self.last_response_effective
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleep.is_some()
    }

    pub fn sleep_source(&self) -> Option<SleepSource> {
        self.sleep
    }

    // ── Per-tick evaluation ────────────────────────────────────────

    /// Re-evaluate care level and mood against the latest snapshot.
    /// Returns true when the care level escalated this tick.
    pub fn evaluate(&mut self, snapshot: &BehaviorSnapshot) -> bool {
        if self.is_sleeping() {
            // Sleep takes priority: no escalation, no mood churn.
            self.mood = Mood::Sleeping;
            return false;
        }

        let target = self.level_for_inactivity(snapshot.inactivity);
        let mut escalated = false;
        if self.escalation_enabled && self.care_level < target {
            // One step per tick, re-evaluated next tick.
            self.set_care_level(self.care_level.escalated());
            escalated = true;
        }

        self.mood = self.computed_mood(snapshot);
        escalated
    }

    fn level_for_inactivity(&self, inactivity: Duration) -> CareLevel {
        let crossed = self
            .thresholds
            .iter()
            .filter(|&&t| inactivity >= t)
            .count();
        match crossed {
            0 => CareLevel::Gentle,
            1 => CareLevel::Encouraging,
            2 => CareLevel::Concerned,
            _ => CareLevel::Worried,
        }
    }

    fn computed_mood(&self, snapshot: &BehaviorSnapshot) -> Mood {
        if self.celebration_pending && self.celebration_enabled {
            return Mood::Celebrating;
        }
        if snapshot.has_unmet_need() {
            match self.care_level {
                CareLevel::Worried => return Mood::Worried,
                CareLevel::Concerned => return Mood::Concerned,
                _ => {}
            }
        }
        if snapshot.needs_support {
            Mood::Caring
        } else {
            Mood::Happy
        }
    }

    // ── Outcome feedback ───────────────────────────────────────────

    /// The user acted on a reminder: step down, reset the ignored streak,
    /// and queue a celebration.
    pub fn record_effective(&mut self) {
        self.set_care_level(self.care_level.reduced());
        self.consecutive_ignored = 0;
        self.last_response_effective = true;
        if self.celebration_enabled {
            self.celebration_pending = true;
        }
    }

    /// The user ignored a reminder. Every third consecutive ignore
    /// escalates one step and re-arms the counter.
    pub fn record_ignored(&mut self) {
        self.consecutive_ignored += 1;
        self.last_response_effective = false;
        if self.consecutive_ignored >= IGNORED_ESCALATION_STREAK {
            if self.escalation_enabled {
                self.set_care_level(self.care_level.escalated());
            }
            self.consecutive_ignored = 0;
        }
    }

    /// Positive behavior observed outside an outcome event (the user stood
    /// up on their own).
    pub fn celebrate(&mut self) {
        if self.celebration_enabled {
            self.celebration_pending = true;
        }
    }

    /// The Celebrating mood was shown; it reverts on the next evaluation.
    pub fn mark_mood_displayed(&mut self) {
        if self.mood == Mood::Celebrating {
            self.celebration_pending = false;
        }
    }

    // ── Sleep / wake ───────────────────────────────────────────────

    pub fn sleep(&mut self, source: SleepSource) {
        // A manual sleep request upgrades an auto one; never the reverse.
        if self.sleep == Some(SleepSource::Manual) {
            return;
        }
        if self.sleep.is_none() {
            info!("[escalation] Going to sleep ({source:?})");
        }
        self.sleep = Some(source);
        self.mood = Mood::Sleeping;
    }

    pub fn wake(&mut self) {
        if self.sleep.take().is_some() {
            info!("[escalation] Waking up");
        }
        // Immediate baseline from the care level; the next tick's
        // evaluation folds the live needs back in.
        self.mood = match self.care_level {
            CareLevel::Worried => Mood::Worried,
            CareLevel::Concerned => Mood::Concerned,
            _ => Mood::Happy,
        };
    }

    // ── Administrative ─────────────────────────────────────────────

    /// Operator override from a SetCareLevel control event.
    pub fn force_care_level(&mut self, level: CareLevel) {
        info!("[escalation] Care level forced to {level:?}");
        self.care_level = level;
    }

    /// Restore persisted care state on startup.
    pub fn restore(&mut self, care_level: CareLevel, mood: Mood, consecutive_ignored: u32) {
        self.care_level = care_level;
        self.mood = mood;
        self.consecutive_ignored = consecutive_ignored;
        self.sleep = if mood == Mood::Sleeping {
            Some(SleepSource::Auto)
        } else {
            None
        };
    }

    fn set_care_level(&mut self, level: CareLevel) {
        if level != self.care_level {
            info!(
                "[escalation] Care level {:?} -> {:?}",
                self.care_level, level
            );
            self.care_level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn care() -> CareState {
        CareState::new(&EngineConfig::default())
    }

    fn inactive_for(minutes: i64) -> BehaviorSnapshot {
        BehaviorSnapshot {
            inactivity: Duration::minutes(minutes),
            needs_hydration: true,
            ..BehaviorSnapshot::idle()
        }
    }

    #[test]
    fn escalates_one_step_per_threshold() {
        let mut c = care();
        assert!(c.evaluate(&inactive_for(35)));
        assert_eq!(c.care_level(), CareLevel::Encouraging);

        // Same tick state again: target already reached, no movement.
        assert!(!c.evaluate(&inactive_for(35)));
        assert_eq!(c.care_level(), CareLevel::Encouraging);
    }

    #[test]
    fn never_jumps_two_levels_in_one_tick() {
        let mut c = care();
        // 130 min crosses all three thresholds at once.
        c.evaluate(&inactive_for(130));
        assert_eq!(c.care_level(), CareLevel::Encouraging);
        c.evaluate(&inactive_for(130));
        assert_eq!(c.care_level(), CareLevel::Concerned);
        c.evaluate(&inactive_for(130));
        assert_eq!(c.care_level(), CareLevel::Worried);
        c.evaluate(&inactive_for(130));
        assert_eq!(c.care_level(), CareLevel::Worried);
    }

    #[test]
    fn third_consecutive_ignore_escalates_and_rearms() {
        let mut c = care();
        c.record_ignored();
        c.record_ignored();
        assert_eq!(c.care_level(), CareLevel::Gentle);
        c.record_ignored();
        assert_eq!(c.care_level(), CareLevel::Encouraging);
        assert_eq!(c.consecutive_ignored(), 0);
    }

    #[test]
    fn effective_response_deescalates_and_resets() {
        let mut c = care();
        c.force_care_level(CareLevel::Worried);
        c.record_ignored();
        c.record_effective();
        assert_eq!(c.care_level(), CareLevel::Concerned);
        assert_eq!(c.consecutive_ignored(), 0);
        assert!(c.last_response_effective());
    }

    #[test]
    fn deescalation_floors_at_gentle() {
        let mut c = care();
        c.record_effective();
        c.record_effective();
        assert_eq!(c.care_level(), CareLevel::Gentle);
    }

    #[test]
    fn mood_tracks_care_level_under_unmet_needs() {
        let mut c = care();
        c.force_care_level(CareLevel::Concerned);
        c.evaluate(&inactive_for(5));
        assert_eq!(c.mood(), Mood::Concerned);

        c.force_care_level(CareLevel::Worried);
        c.evaluate(&inactive_for(5));
        assert_eq!(c.mood(), Mood::Worried);
    }

    #[test]
    fn support_need_without_escalated_care_is_caring() {
        let mut c = care();
        let snapshot = BehaviorSnapshot {
            needs_support: true,
            ..BehaviorSnapshot::idle()
        };
        c.evaluate(&snapshot);
        assert_eq!(c.mood(), Mood::Caring);
    }

    #[test]
    fn celebration_is_one_shot() {
        let mut c = care();
        c.celebrate();
        c.evaluate(&BehaviorSnapshot::idle());
        assert_eq!(c.mood(), Mood::Celebrating);

        c.mark_mood_displayed();
        c.evaluate(&BehaviorSnapshot::idle());
        assert_eq!(c.mood(), Mood::Happy);
    }

    #[test]
    fn sleep_overrides_mood_and_pauses_escalation() {
        let mut c = care();
        c.force_care_level(CareLevel::Worried);
        c.sleep(SleepSource::Manual);
        assert_eq!(c.mood(), Mood::Sleeping);

        // Deep inactivity while asleep changes nothing.
        assert!(!c.evaluate(&inactive_for(500)));
        assert_eq!(c.mood(), Mood::Sleeping);
        assert_eq!(c.care_level(), CareLevel::Worried);

        c.wake();
        assert_eq!(c.mood(), Mood::Worried);
    }

    #[test]
    fn auto_sleep_does_not_downgrade_manual_sleep() {
        let mut c = care();
        c.sleep(SleepSource::Manual);
        c.sleep(SleepSource::Auto);
        assert_eq!(c.sleep_source(), Some(SleepSource::Manual));
    }
}
