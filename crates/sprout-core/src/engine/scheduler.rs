// ── Need Scheduler ─────────────────────────────────────────────────────────
// One ReminderTimer per timed category (hydration, movement, posture).
// A timer fires when its interval has elapsed, it is not snoozed, and the
// classifier's matching need flag is set. Firing resets the anchor
// immediately (pessimistic reset) so the same tick cannot fire twice.
//
// Timers are created at engine init and never destroyed during a session.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{BehaviorSnapshot, ResponseType};
use crate::engine::config::EngineConfig;

#[derive(Debug, Clone)]
pub struct ReminderTimer {
    pub last_fired_at: DateTime<Utc>,
    pub interval: Duration,
    pub snoozed_until: Option<DateTime<Utc>>,
}

impl ReminderTimer {
    fn new(interval: Duration, now: DateTime<Utc>) -> Self {
        Self {
            last_fired_at: now,
            interval,
            snoozed_until: None,
        }
    }

    fn elapsed(&self, now: DateTime<Utc>) -> bool {
        now - self.last_fired_at >= self.interval
    }

    fn snoozed(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| now < until)
    }
}

pub struct ReminderTimers {
    timers: BTreeMap<ResponseType, ReminderTimer>,
}

impl ReminderTimers {
    pub fn new(config: &EngineConfig, now: DateTime<Utc>) -> Self {
        let mut timers = BTreeMap::new();
        timers.insert(
            ResponseType::Hydration,
            ReminderTimer::new(config.hydration_interval(), now),
        );
        timers.insert(
            ResponseType::Movement,
            ReminderTimer::new(config.movement_interval(), now),
        );
        timers.insert(
            ResponseType::Posture,
            ReminderTimer::new(config.posture_interval(), now),
        );
        Self { timers }
    }

    /// Read-only dueness check, used by the classifier to derive need flags.
    /// Ignores snooze; snooze is applied at fire time.
    pub fn elapsed(&self, category: ResponseType, now: DateTime<Utc>) -> bool {
        self.timers.get(&category).is_some_and(|t| t.elapsed(now))
    }

    /// Return every category due this tick and reset their anchors.
    /// The caller emits at most one of them per tick.
    pub fn tick(&mut self, now: DateTime<Utc>, snapshot: &BehaviorSnapshot) -> Vec<ResponseType> {
        let mut due = Vec::new();
        for (&category, timer) in &mut self.timers {
            let need = match category {
                ResponseType::Hydration => snapshot.needs_hydration,
                ResponseType::Movement => snapshot.needs_movement,
                ResponseType::Posture => snapshot.needs_posture,
                _ => false,
            };
            if need && timer.elapsed(now) && !timer.snoozed(now) {
                timer.last_fired_at = now;
                due.push(category);
                debug!("[scheduler] {} reminder due", category.as_str());
            }
        }
        due
    }

    /// Push the category's snooze window forward. Takes effect on the next
    /// tick; non-positive durations and non-timed categories are rejected
    /// with the state unchanged.
    pub fn snooze(
        &mut self,
        category: ResponseType,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        if duration <= Duration::zero() {
            return Err(EngineError::invalid_control(format!(
                "snooze duration must be positive, got {} min",
                duration.num_minutes()
            )));
        }
        let timer = self.timers.get_mut(&category).ok_or_else(|| {
            EngineError::invalid_control(format!(
                "{} has no reminder timer to snooze",
                category.as_str()
            ))
        })?;
        let until = now + duration;
        timer.snoozed_until = Some(timer.snoozed_until.map_or(until, |u| u.max(until)));
        info!(
            "[scheduler] {} snoozed for {} min",
            category.as_str(),
            duration.num_minutes()
        );
        Ok(())
    }

    /// The user acted on this category: restart its interval from now.
    pub fn mark_satisfied(&mut self, category: ResponseType, now: DateTime<Utc>) {
        if let Some(timer) = self.timers.get_mut(&category) {
            timer.last_fired_at = now;
        }
    }

    // ── Persistence views ──────────────────────────────────────────

    pub fn export_anchors(&self) -> BTreeMap<ResponseType, DateTime<Utc>> {
        self.timers
            .iter()
            .map(|(&rt, t)| (rt, t.last_fired_at))
            .collect()
    }

    pub fn restore_anchors(&mut self, anchors: &BTreeMap<ResponseType, DateTime<Utc>>) {
        for (&rt, &at) in anchors {
            if let Some(timer) = self.timers.get_mut(&rt) {
                timer.last_fired_at = at;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn timers_at(now: DateTime<Utc>) -> ReminderTimers {
        ReminderTimers::new(&EngineConfig::default(), now)
    }

    fn needy() -> BehaviorSnapshot {
        BehaviorSnapshot {
            needs_hydration: true,
            needs_movement: true,
            needs_posture: true,
            ..BehaviorSnapshot::idle()
        }
    }

    #[test]
    fn nothing_due_before_interval() {
        let mut t = timers_at(t0());
        let due = t.tick(t0() + Duration::minutes(10), &needy());
        assert!(due.is_empty());
    }

    #[test]
    fn due_timers_fire_and_reset() {
        let mut t = timers_at(t0());
        let later = t0() + Duration::minutes(90);

        let due = t.tick(later, &needy());
        assert!(due.contains(&ResponseType::Hydration));
        assert!(due.contains(&ResponseType::Movement));
        assert!(due.contains(&ResponseType::Posture));

        // Pessimistic reset: an immediate re-tick fires nothing.
        let due = t.tick(later, &needy());
        assert!(due.is_empty());
    }

    #[test]
    fn need_flag_gates_firing() {
        let mut t = timers_at(t0());
        let snapshot = BehaviorSnapshot {
            needs_hydration: true,
            ..BehaviorSnapshot::idle()
        };
        let due = t.tick(t0() + Duration::minutes(90), &snapshot);
        assert_eq!(due, vec![ResponseType::Hydration]);
    }

    #[test]
    fn snooze_suppresses_until_expiry() {
        let mut t = timers_at(t0());
        let later = t0() + Duration::minutes(60);
        t.snooze(ResponseType::Hydration, Duration::minutes(30), later)
            .unwrap();

        let due = t.tick(later + Duration::minutes(10), &needy());
        assert!(!due.contains(&ResponseType::Hydration));

        let due = t.tick(later + Duration::minutes(31), &needy());
        assert!(due.contains(&ResponseType::Hydration));
    }

    #[test]
    fn negative_snooze_is_rejected_unchanged() {
        let mut t = timers_at(t0());
        let err = t
            .snooze(ResponseType::Hydration, Duration::minutes(-5), t0())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidControl(_)));

        // Still fires normally afterwards.
        let due = t.tick(t0() + Duration::minutes(50), &needy());
        assert!(due.contains(&ResponseType::Hydration));
    }

    #[test]
    fn snoozing_untimed_category_is_rejected() {
        let mut t = timers_at(t0());
        let err = t
            .snooze(ResponseType::Greeting, Duration::minutes(5), t0())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidControl(_)));
    }

    #[test]
    fn satisfied_need_restarts_interval() {
        let mut t = timers_at(t0());
        let later = t0() + Duration::minutes(40);
        t.mark_satisfied(ResponseType::Hydration, later);

        // 45 minutes from t0 but only 5 from the reset: not due.
        let due = t.tick(t0() + Duration::minutes(45), &needy());
        assert!(!due.contains(&ResponseType::Hydration));
    }

    #[test]
    fn anchors_round_trip() {
        let mut t = timers_at(t0());
        let later = t0() + Duration::minutes(90);
        t.tick(later, &needy());

        let anchors = t.export_anchors();
        let mut fresh = timers_at(t0());
        fresh.restore_anchors(&anchors);
        assert_eq!(fresh.export_anchors(), anchors);
    }
}
