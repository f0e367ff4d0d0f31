// ── Response Selector ──────────────────────────────────────────────────────
// Picks one message from a catalog partition for a due category.
//
// Scoring is a weighted sum, computed per candidate:
//   1. Care-level match           (+0.4 exact, else 0)
//   2. Mood match                 (+0.3 exact, else 0)
//   3. Recency bonus              (+0.2 scaled by minutes since last use,
//                                  saturating at RECENCY_BONUS_CAP_MIN)
//   4. Inverse-frequency bonus    (+0.1 scaled by 10/(use_count+1))
//   5. Learned effectiveness      (+0.2 × category preference)
//
// The immediately previous pick of a partition with ≥2 entries is excluded
// outright, so two consecutive selections never return the same text.
// Ties prefer the lowest use count, then catalog order. No randomness:
// given the same catalog state and clock, selection is fully deterministic.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::atoms::constants::RECENCY_BONUS_CAP_MIN;
use crate::atoms::types::{CareLevel, Mood, ResponseType};
use crate::engine::catalog::MessageCatalog;
use crate::engine::config::EngineConfig;

const SCORE_EPSILON: f32 = 1e-6;

pub struct ResponseSelector {
    catalog: MessageCatalog,
    cooldown: Duration,
    enabled: bool,
    /// Last emission across all categories; gates the global cooldown.
    last_emitted_at: Option<DateTime<Utc>>,
    /// Per-partition index of the previous pick, for the no-repeat guard.
    last_choice: BTreeMap<ResponseType, usize>,
}

impl ResponseSelector {
    pub fn new(catalog: MessageCatalog, config: &EngineConfig) -> Self {
        Self {
            catalog,
            cooldown: config.response_cooldown(),
            enabled: true,
            last_emitted_at: None,
            last_choice: BTreeMap::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the global response cooldown is still running.
    pub fn cooldown_active(&self, now: DateTime<Utc>) -> bool {
        self.last_emitted_at
            .is_some_and(|at| now - at < self.cooldown)
    }

    /// Select, personalize, and mark one message for the category.
    /// Returns `None` — not an error — when disabled, cooling down, or the
    /// partition is empty; the caller simply skips emission this tick.
    pub fn select(
        &mut self,
        category: ResponseType,
        now: DateTime<Utc>,
        mood: Mood,
        care_level: CareLevel,
        effectiveness: f32,
        user_name: &str,
    ) -> Option<String> {
        if !self.enabled || self.cooldown_active(now) {
            return None;
        }

        let previous = self.last_choice.get(&category).copied();
        let partition_len = self.catalog.len(category);
        let entries = self.catalog.partition_mut(category)?;
        if entries.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f32, u32)> = None;
        for (idx, entry) in entries.iter().enumerate() {
            // No-repeat guard: with ≥2 entries, the previous pick sits out.
            if partition_len >= 2 && previous == Some(idx) {
                continue;
            }

            let mut score = 0.0f32;
            if entry.care_level == care_level {
                score += 0.4;
            }
            if entry.mood == mood {
                score += 0.3;
            }
            let recency = match entry.last_used_at {
                // Never used counts as maximally stale.
                None => 1.0,
                Some(at) => {
                    let minutes = (now - at).num_minutes().max(0);
                    minutes.min(RECENCY_BONUS_CAP_MIN) as f32 / RECENCY_BONUS_CAP_MIN as f32
                }
            };
            score += 0.2 * recency;
            score += 0.1 * (10.0 / (entry.use_count as f32 + 1.0));
            score += 0.2 * effectiveness.clamp(0.0, 1.0);

            let better = match best {
                None => true,
                Some((_, best_score, best_uses)) => {
                    score > best_score + SCORE_EPSILON
                        || ((score - best_score).abs() <= SCORE_EPSILON
                            && entry.use_count < best_uses)
                }
            };
            if better {
                best = Some((idx, score, entry.use_count));
            }
        }

        let (idx, score, _) = best?;
        let entry = &mut entries[idx];
        entry.use_count += 1;
        entry.last_used_at = Some(now);
        let text = entry.text.replace("{name}", user_name);

        self.last_emitted_at = Some(now);
        self.last_choice.insert(category, idx);
        debug!(
            "[selector] {} #{idx} scored {score:.3}: {text}",
            category.as_str()
        );
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::ResponseType::Hydration;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn selector() -> ResponseSelector {
        ResponseSelector::new(MessageCatalog::builtin(), &EngineConfig::default())
    }

    fn pick(s: &mut ResponseSelector, secs: i64) -> Option<String> {
        s.select(
            Hydration,
            t0() + Duration::seconds(secs),
            Mood::Caring,
            CareLevel::Gentle,
            0.5,
            "friend",
        )
    }

    #[test]
    fn selection_is_deterministic() {
        let first = pick(&mut selector(), 0).unwrap();
        let again = pick(&mut selector(), 0).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn cooldown_suppresses_second_message() {
        let mut s = selector();
        assert!(pick(&mut s, 0).is_some());
        assert!(pick(&mut s, 2).is_none());
        assert!(pick(&mut s, 6).is_some());
    }

    #[test]
    fn consecutive_selections_never_repeat() {
        let mut s = selector();
        let mut previous: Option<String> = None;
        for i in 0..20 {
            let text = pick(&mut s, i * 10).unwrap();
            if let Some(prev) = &previous {
                assert_ne!(&text, prev, "repeat at iteration {i}");
            }
            previous = Some(text);
        }
    }

    #[test]
    fn matching_care_level_wins() {
        let mut s = selector();
        let text = s
            .select(
                Hydration,
                t0(),
                Mood::Worried,
                CareLevel::Worried,
                0.5,
                "friend",
            )
            .unwrap();
        // The only Worried-tier hydration entry.
        assert!(text.contains("I'm worried about you"), "got: {text}");
    }

    #[test]
    fn name_placeholder_is_substituted() {
        let mut s = selector();
        let text = s
            .select(Hydration, t0(), Mood::Caring, CareLevel::Gentle, 0.5, "Sam")
            .unwrap();
        assert!(!text.contains("{name}"));
    }

    #[test]
    fn empty_partition_yields_none() {
        let mut s = ResponseSelector::new(MessageCatalog::empty(), &EngineConfig::default());
        assert!(pick(&mut s, 0).is_none());
    }

    #[test]
    fn disabled_selector_yields_none() {
        let mut s = selector();
        s.set_enabled(false);
        assert!(pick(&mut s, 0).is_none());
    }

    #[test]
    fn usage_stats_update_on_selection() {
        let mut s = selector();
        pick(&mut s, 0).unwrap();
        let used: u32 = s
            .catalog
            .partition(Hydration)
            .iter()
            .map(|e| e.use_count)
            .sum();
        assert_eq!(used, 1);
    }

    #[test]
    fn single_entry_partition_may_repeat() {
        let mut catalog = MessageCatalog::empty();
        catalog.add(
            ResponseType::Greeting,
            "Hello!",
            Mood::Happy,
            CareLevel::Gentle,
        );
        let mut s = ResponseSelector::new(catalog, &EngineConfig::default());

        let a = s.select(
            ResponseType::Greeting,
            t0(),
            Mood::Happy,
            CareLevel::Gentle,
            0.5,
            "friend",
        );
        let b = s.select(
            ResponseType::Greeting,
            t0() + Duration::seconds(10),
            Mood::Happy,
            CareLevel::Gentle,
            0.5,
            "friend",
        );
        assert_eq!(a, b);
        assert!(a.is_some());
    }
}
