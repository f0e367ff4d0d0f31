// ── Activity Classifier ────────────────────────────────────────────────────
// Turns raw periodic sensor observations into a structured BehaviorSnapshot:
// presence, posture, inactivity, activity level, and derived care needs.
//
// Key properties:
//   - Stateful only in the small: a bounded rolling motion window, last-seen
//     timestamps, and a poor-posture streak. The snapshot itself is
//     recomputed from scratch every tick.
//   - Missing sensor input degrades to Unknown/neutral; it never errors and
//     never halts the tick loop.
//   - Need flags combine timer dueness (read-only view of the scheduler)
//     with the activity precondition, so a due hydration timer raises no
//     need while the user is away.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::atoms::types::{BehaviorSnapshot, Posture, Presence, ResponseType, SensorSample};
use crate::engine::config::EngineConfig;
use crate::engine::scheduler::ReminderTimers;

pub struct ActivityClassifier {
    posture_confidence_threshold: f32,
    good_posture_threshold: f32,
    presence_timeout: Duration,
    max_sedentary: Duration,
    /// Inactivity beyond this raises the emotional-support need.
    support_threshold: Duration,

    /// Rolling motion window for the activity level average.
    window: VecDeque<f32>,
    window_capacity: usize,

    started_at: Option<DateTime<Utc>>,
    last_update: Option<DateTime<Utc>>,
    last_motion_at: Option<DateTime<Utc>>,
    /// Last motion, confident posture, or positive presence hint.
    last_signal_at: Option<DateTime<Utc>>,

    posture: Posture,
    seated_since: Option<DateTime<Utc>>,
    poor_posture_streak: u32,
    /// One-shot: user left a seated posture for Standing since last tick.
    stood_up: bool,

    total_sitting: Duration,
    total_standing: Duration,
}

impl ActivityClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            posture_confidence_threshold: config.posture_confidence_threshold,
            good_posture_threshold: config.good_posture_threshold,
            presence_timeout: config.presence_timeout(),
            max_sedentary: config.max_sedentary(),
            support_threshold: config.inactivity_thresholds()[0],
            window: VecDeque::with_capacity(config.activity_window_samples),
            window_capacity: config.activity_window_samples,
            started_at: None,
            last_update: None,
            last_motion_at: None,
            last_signal_at: None,
            posture: Posture::Unknown,
            seated_since: None,
            poor_posture_streak: 0,
            stood_up: false,
            total_sitting: Duration::zero(),
            total_standing: Duration::zero(),
        }
    }

    /// Classify the latest sample. Pure with respect to outputs: the returned
    /// snapshot is a value; only the classifier's rolling history mutates.
    pub fn classify(&mut self, sample: &SensorSample, timers: &ReminderTimers) -> BehaviorSnapshot {
        let now = sample.at;
        self.started_at.get_or_insert(now);
        self.accumulate_posture_time(now);

        // ── Rolling activity window ──────────────────────────────
        if self.window.len() >= self.window_capacity {
            self.window.pop_front();
        }
        self.window
            .push_back(if sample.motion_detected { 1.0 } else { 0.0 });
        let activity_level = self.window.iter().sum::<f32>() / self.window.len() as f32;

        // ── Signals ──────────────────────────────────────────────
        if sample.motion_detected {
            self.last_motion_at = Some(now);
            self.last_signal_at = Some(now);
        }
        if sample.presence_hint == Some(true) {
            self.last_signal_at = Some(now);
        }
        if let Some(reading) = sample.posture {
            if reading.confidence >= self.posture_confidence_threshold {
                self.last_signal_at = Some(now);
                self.apply_posture(reading.label, now);
            } else {
                // Below-threshold estimates are not trusted: posture becomes
                // Unknown so no posture-based need can fire on noise.
                self.apply_posture(Posture::Unknown, now);
            }
        }

        // ── Presence ─────────────────────────────────────────────
        let presence = match self.last_signal_at {
            None => Presence::Unknown,
            Some(t) if now - t > self.presence_timeout => Presence::Away,
            Some(_) => Presence::Present,
        };

        let inactivity = now - self.last_motion_at.or(self.started_at).unwrap_or(now);
        let posture_quality = self.posture_quality();
        let seated = matches!(self.posture, Posture::Sitting | Posture::LeaningForward);
        let seated_for = self.seated_since.map(|s| now - s);

        // ── Derived needs: timer dueness AND activity precondition ──
        let present = presence == Presence::Present;
        let needs_hydration = present && timers.elapsed(ResponseType::Hydration, now);
        let needs_movement = present && seated && timers.elapsed(ResponseType::Movement, now);
        let needs_posture = seated
            && posture_quality < self.good_posture_threshold
            && timers.elapsed(ResponseType::Posture, now);
        let needs_break = present && seated_for.is_some_and(|d| d >= self.max_sedentary);
        let needs_support = present && inactivity >= self.support_threshold;

        let has_positive_behavior = std::mem::take(&mut self.stood_up);
        if has_positive_behavior {
            debug!("[classifier] User stood up after sitting");
        }

        BehaviorSnapshot {
            inactivity,
            presence,
            posture: self.posture,
            posture_quality,
            activity_level,
            needs_hydration,
            needs_movement,
            needs_posture,
            needs_break,
            needs_support,
            has_positive_behavior,
        }
    }

    fn apply_posture(&mut self, label: Posture, now: DateTime<Utc>) {
        let was_seated = matches!(self.posture, Posture::Sitting | Posture::LeaningForward);
        let is_seated = matches!(label, Posture::Sitting | Posture::LeaningForward);

        if label == Posture::LeaningForward {
            self.poor_posture_streak += 1;
        } else {
            self.poor_posture_streak = 0;
        }

        if is_seated && !was_seated {
            self.seated_since = Some(now);
        } else if !is_seated {
            self.seated_since = None;
        }

        if was_seated && label == Posture::Standing {
            self.stood_up = true;
        }

        if label != self.posture {
            debug!("[classifier] Posture: {:?} -> {:?}", self.posture, label);
        }
        self.posture = label;
    }

    /// Attribute elapsed time since the previous tick to the posture that
    /// was held during it.
    fn accumulate_posture_time(&mut self, now: DateTime<Utc>) {
        if let Some(prev) = self.last_update {
            let dt = now - prev;
            if dt > Duration::zero() {
                match self.posture {
                    Posture::Sitting | Posture::LeaningForward => self.total_sitting += dt,
                    Posture::Standing => self.total_standing += dt,
                    Posture::Unknown => {}
                }
            }
        }
        self.last_update = Some(now);
    }

    /// Stepped quality score driven by the consecutive poor-posture streak:
    /// 1.0 upright, degrading toward 0.0 as the streak grows.
    fn posture_quality(&self) -> f32 {
        match self.poor_posture_streak {
            0 => 1.0,
            1..=2 => 0.7,
            3..=4 => 0.4,
            _ => 0.0,
        }
    }

    pub fn total_sitting(&self) -> Duration {
        self.total_sitting
    }

    pub fn total_standing(&self) -> Duration {
        self.total_standing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::PostureReading;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn classifier() -> ActivityClassifier {
        ActivityClassifier::new(&EngineConfig::default())
    }

    fn timers() -> ReminderTimers {
        ReminderTimers::new(&EngineConfig::default(), t0())
    }

    fn sample_at(secs: i64, motion: bool) -> SensorSample {
        SensorSample {
            motion_detected: motion,
            ..SensorSample::empty(t0() + Duration::seconds(secs))
        }
    }

    fn sitting(secs: i64, confidence: f32) -> SensorSample {
        SensorSample {
            posture: Some(PostureReading {
                label: Posture::Sitting,
                confidence,
            }),
            ..sample_at(secs, false)
        }
    }

    #[test]
    fn no_signal_yet_is_unknown_presence() {
        let mut c = classifier();
        let snap = c.classify(&sample_at(0, false), &timers());
        assert_eq!(snap.presence, Presence::Unknown);
        assert_eq!(snap.posture, Posture::Unknown);
    }

    #[test]
    fn motion_marks_present_then_timeout_marks_away() {
        let mut c = classifier();
        let t = timers();
        let snap = c.classify(&sample_at(0, true), &t);
        assert_eq!(snap.presence, Presence::Present);

        // 4 minutes later, still inside the 5-minute timeout.
        let snap = c.classify(&sample_at(240, false), &t);
        assert_eq!(snap.presence, Presence::Present);

        // 6 minutes of silence crosses it.
        let snap = c.classify(&sample_at(360, false), &t);
        assert_eq!(snap.presence, Presence::Away);
    }

    #[test]
    fn low_confidence_posture_becomes_unknown() {
        let mut c = classifier();
        let t = timers();
        let snap = c.classify(&sitting(0, 0.9), &t);
        assert_eq!(snap.posture, Posture::Sitting);

        let snap = c.classify(&sitting(10, 0.3), &t);
        assert_eq!(snap.posture, Posture::Unknown);
        assert!(!snap.needs_posture);
    }

    #[test]
    fn activity_level_is_rolling_average() {
        let mut c = classifier();
        let t = timers();
        c.classify(&sample_at(0, true), &t);
        c.classify(&sample_at(1, true), &t);
        let snap = c.classify(&sample_at(2, false), &t);
        assert!((snap.activity_level - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn standing_after_sitting_is_positive_once() {
        let mut c = classifier();
        let t = timers();
        c.classify(&sitting(0, 0.9), &t);

        let stand = SensorSample {
            posture: Some(PostureReading {
                label: Posture::Standing,
                confidence: 0.9,
            }),
            ..sample_at(10, true)
        };
        let snap = c.classify(&stand, &t);
        assert!(snap.has_positive_behavior);

        // One-shot: the next tick no longer reports it.
        let snap = c.classify(&sample_at(11, false), &t);
        assert!(!snap.has_positive_behavior);
    }

    #[test]
    fn poor_posture_streak_degrades_quality() {
        let mut c = classifier();
        let t = timers();
        let lean = |secs| SensorSample {
            posture: Some(PostureReading {
                label: Posture::LeaningForward,
                confidence: 0.9,
            }),
            ..sample_at(secs, false)
        };

        let snap = c.classify(&lean(0), &t);
        assert!((snap.posture_quality - 0.7).abs() < f32::EPSILON);
        c.classify(&lean(1), &t);
        let snap = c.classify(&lean(2), &t);
        assert!((snap.posture_quality - 0.4).abs() < f32::EPSILON);

        // Sitting upright again resets the streak.
        let snap = c.classify(&sitting(3, 0.9), &t);
        assert!((snap.posture_quality - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn sitting_time_accumulates_across_ticks() {
        let mut c = classifier();
        let t = timers();
        c.classify(&sitting(0, 0.9), &t);
        c.classify(&sample_at(60, false), &t);
        c.classify(&sample_at(120, false), &t);
        assert_eq!(c.total_sitting(), Duration::seconds(120));
    }

    #[test]
    fn away_user_raises_no_needs_even_when_timers_due() {
        let mut c = classifier();
        // Timers anchored far in the past: everything has elapsed.
        let t = ReminderTimers::new(&EngineConfig::default(), t0() - Duration::hours(6));

        // Motion once, then silence well past the presence timeout.
        c.classify(&sample_at(0, true), &t);
        let snap = c.classify(&sample_at(3600, false), &t);
        assert_eq!(snap.presence, Presence::Away);
        assert!(!snap.needs_hydration);
        assert!(!snap.needs_movement);
    }
}
