// ── Preference Learner ─────────────────────────────────────────────────────
// Per-category effectiveness scores, updated by exponential moving average
// from observed outcomes. Acted-on reminders pull the score toward 1.0,
// ignored ones toward 0.0. Scores start neutral (0.5) and are never removed.
//
// The score feeds back into message scoring (selector bonus) and, through
// the outcome path, into escalation.

use std::collections::BTreeMap;

use log::debug;

use crate::atoms::constants::NEUTRAL_EFFECTIVENESS;
use crate::atoms::types::ResponseType;
use crate::engine::config::EngineConfig;

pub struct PreferenceTable {
    scores: BTreeMap<ResponseType, f32>,
    rate: f32,
    enabled: bool,
}

impl PreferenceTable {
    pub fn new(config: &EngineConfig) -> Self {
        let scores = ResponseType::ALL
            .iter()
            .map(|&rt| (rt, NEUTRAL_EFFECTIVENESS))
            .collect();
        Self {
            scores,
            rate: config.learning_rate,
            enabled: config.learning_enabled,
        }
    }

    /// Fold one observed outcome into the category's score.
    pub fn record(&mut self, category: ResponseType, effective: bool) {
        if !self.enabled {
            return;
        }
        let target = if effective { 1.0 } else { 0.0 };
        let score = self.scores.entry(category).or_insert(NEUTRAL_EFFECTIVENESS);
        *score = *score * (1.0 - self.rate) + target * self.rate;
        debug!(
            "[learner] {} effectiveness now {:.3}",
            category.as_str(),
            score
        );
    }

    /// Learned effectiveness in [0, 1]; neutral for untracked categories.
    pub fn effectiveness(&self, category: ResponseType) -> f32 {
        self.scores
            .get(&category)
            .copied()
            .unwrap_or(NEUTRAL_EFFECTIVENESS)
    }

    // ── Persistence views ──────────────────────────────────────────

    pub fn export(&self) -> BTreeMap<ResponseType, f32> {
        self.scores.clone()
    }

    pub fn restore(&mut self, scores: &BTreeMap<ResponseType, f32>) {
        for (&rt, &score) in scores {
            self.scores.insert(rt, score.clamp(0.0, 1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PreferenceTable {
        PreferenceTable::new(&EngineConfig::default())
    }

    #[test]
    fn starts_neutral() {
        let t = table();
        for rt in ResponseType::ALL {
            assert!((t.effectiveness(rt) - 0.5).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn effective_outcome_raises_score_by_rate() {
        let mut t = table();
        t.record(ResponseType::Hydration, true);
        // 0.5 * 0.9 + 1.0 * 0.1 = 0.55
        assert!((t.effectiveness(ResponseType::Hydration) - 0.55).abs() < 1e-6);
    }

    #[test]
    fn ignored_outcome_lowers_score() {
        let mut t = table();
        t.record(ResponseType::Movement, false);
        assert!((t.effectiveness(ResponseType::Movement) - 0.45).abs() < 1e-6);
    }

    #[test]
    fn repeated_outcomes_converge_but_stay_bounded() {
        let mut t = table();
        for _ in 0..200 {
            t.record(ResponseType::Posture, true);
        }
        let score = t.effectiveness(ResponseType::Posture);
        assert!(score > 0.95 && score <= 1.0);
    }

    #[test]
    fn disabled_learning_freezes_scores() {
        let mut t = PreferenceTable::new(&EngineConfig {
            learning_enabled: false,
            ..EngineConfig::default()
        });
        t.record(ResponseType::Hydration, true);
        assert!((t.effectiveness(ResponseType::Hydration) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn restore_clamps_out_of_range_values() {
        let mut t = table();
        let mut saved = BTreeMap::new();
        saved.insert(ResponseType::Concern, 7.0);
        t.restore(&saved);
        assert!((t.effectiveness(ResponseType::Concern) - 1.0).abs() < f32::EPSILON);
    }
}
