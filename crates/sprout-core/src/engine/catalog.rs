// ── Message Catalog ────────────────────────────────────────────────────────
// The built-in bank of caring messages, partitioned by response category.
// Texts are immutable; per-entry usage stats mutate as messages are picked.
// Entries may carry a `{name}` placeholder, substituted at selection time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::atoms::types::{CareLevel, Mood, ResponseType};

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub text: &'static str,
    pub mood: Mood,
    pub care_level: CareLevel,
    pub use_count: u32,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    const fn new(text: &'static str, mood: Mood, care_level: CareLevel) -> Self {
        Self {
            text,
            mood,
            care_level,
            use_count: 0,
            last_used_at: None,
        }
    }
}

// Shorthand so the banks below stay readable.
use CareLevel::{Concerned as LConcerned, Encouraging, Gentle, Worried as LWorried};
use Mood::{Caring, Celebrating, Concerned, Happy, Worried};

const HYDRATION: &[CatalogEntry] = &[
    CatalogEntry::new("Hey there! Time to hydrate!", Caring, Gentle),
    CatalogEntry::new(
        "How about some water, {name}? Your body will thank you!",
        Caring,
        Gentle,
    ),
    CatalogEntry::new("A refreshing drink sounds good right now!", Happy, Gentle),
    CatalogEntry::new("Thirsty? I bet you are. Take a sip for me!", Caring, Gentle),
    CatalogEntry::new(
        "Water break! Your cells will thank you!",
        Happy,
        Gentle,
    ),
    CatalogEntry::new(
        "I noticed you haven't had water in a while. How about it?",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new(
        "Hydration is self-care, {name}. Let's keep that energy up!",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new(
        "Hey {name}, I'm getting a bit worried about your hydration. Please drink something!",
        Concerned,
        LConcerned,
    ),
    CatalogEntry::new(
        "It's been quite a while since your last drink. I'm concerned!",
        Concerned,
        LConcerned,
    ),
    CatalogEntry::new(
        "Please, {name} — you really need to drink some water now. I'm worried about you!",
        Worried,
        LWorried,
    ),
];

const MOVEMENT: &[CatalogEntry] = &[
    CatalogEntry::new(
        "How about a stretch? Take a walk! Shake it out!",
        Caring,
        Gentle,
    ),
    CatalogEntry::new(
        "Time to get those muscles moving, {name}! Even a little stretch helps!",
        Happy,
        Gentle,
    ),
    CatalogEntry::new(
        "Your body is asking for some movement. Listen to it!",
        Caring,
        Gentle,
    ),
    CatalogEntry::new(
        "Let's get the blood flowing! A quick walk does wonders.",
        Happy,
        Gentle,
    ),
    CatalogEntry::new(
        "You've been sitting for a while. How about a movement break?",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new(
        "I know you're focused, but your body needs some love too. Stretch time!",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new(
        "Even champions take movement breaks, {name}. You've got this!",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new(
        "You've been still for quite some time. Please move around a bit!",
        Concerned,
        LConcerned,
    ),
    CatalogEntry::new(
        "I'm really getting worried, {name}. Stand up and move for me, please?",
        Worried,
        LWorried,
    ),
];

const POSTURE: &[CatalogEntry] = &[
    CatalogEntry::new("Time to adjust that posture! Stretch it out!", Caring, Gentle),
    CatalogEntry::new(
        "Roll those shoulders back, {name}! Your spine will thank you!",
        Caring,
        Gentle,
    ),
    CatalogEntry::new(
        "Posture check! Sit up tall like the amazing person you are!",
        Happy,
        Gentle,
    ),
    CatalogEntry::new(
        "I see some slouching. Time for a posture reset!",
        Caring,
        Gentle,
    ),
    CatalogEntry::new(
        "Gentle reminder: your future self will thank you for good posture now.",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new(
        "That lean is sticking around, {name}. Straighten up for me?",
        Concerned,
        LConcerned,
    ),
];

const ENCOURAGEMENT: &[CatalogEntry] = &[
    CatalogEntry::new("You're doing great! Keep up the good work!", Happy, Gentle),
    CatalogEntry::new("Aw, it's not so bad. Give yourself a hug!", Caring, Gentle),
    CatalogEntry::new("Every small step counts. You're making progress!", Caring, Gentle),
    CatalogEntry::new("I believe in you, {name}! You've got this!", Happy, Encouraging),
    CatalogEntry::new(
        "Remember: you're braver than you believe and stronger than you seem.",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new(
        "Tough moments don't last, but resilient people like you do.",
        Caring,
        Encouraging,
    ),
    CatalogEntry::new("One step at a time, {name}. Be kind to yourself!", Caring, Gentle),
];

const CELEBRATION: &[CatalogEntry] = &[
    CatalogEntry::new(
        "Wonderful! You took care of yourself! I'm so proud!",
        Celebrating,
        Gentle,
    ),
    CatalogEntry::new("Yes! That's what I love to see!", Celebrating, Gentle),
    CatalogEntry::new(
        "You listened to your body. That's what self-care looks like!",
        Happy,
        Gentle,
    ),
    CatalogEntry::new("Happy dance! Well done, {name}!", Celebrating, Gentle),
    CatalogEntry::new("That's the spirit! Keep up the great work!", Happy, Gentle),
    CatalogEntry::new(
        "Proud of you for listening to your body, {name}!",
        Celebrating,
        Gentle,
    ),
];

const CONCERN: &[CatalogEntry] = &[
    CatalogEntry::new(
        "I'm getting a bit worried about you. Everything okay?",
        Concerned,
        LConcerned,
    ),
    CatalogEntry::new(
        "You matter, {name}, and your wellbeing matters. Can we take a break?",
        Concerned,
        LConcerned,
    ),
    CatalogEntry::new(
        "I'm here for you, but I'm getting concerned...",
        Concerned,
        LConcerned,
    ),
    CatalogEntry::new(
        "I'm really worried now. Please take a moment for yourself!",
        Worried,
        LWorried,
    ),
    CatalogEntry::new(
        "This is your caring companion speaking: you need attention right now, {name}!",
        Worried,
        LWorried,
    ),
];

const GREETING: &[CatalogEntry] = &[
    CatalogEntry::new("Hello there! Your caring companion is here!", Happy, Gentle),
    CatalogEntry::new(
        "Good to see you, {name}! Ready to take great care of yourself today?",
        Happy,
        Gentle,
    ),
    CatalogEntry::new("Welcome back! I missed you!", Happy, Gentle),
    CatalogEntry::new(
        "Hi, {name}! Let's have a wonderful day together!",
        Happy,
        Gentle,
    ),
    CatalogEntry::new("Hey! Great to have you here!", Happy, Gentle),
];

pub struct MessageCatalog {
    partitions: BTreeMap<ResponseType, Vec<CatalogEntry>>,
}

impl MessageCatalog {
    /// The built-in bank. Every category has at least two entries so the
    /// no-repeat guarantee holds everywhere.
    pub fn builtin() -> Self {
        let mut partitions = BTreeMap::new();
        partitions.insert(ResponseType::Hydration, HYDRATION.to_vec());
        partitions.insert(ResponseType::Movement, MOVEMENT.to_vec());
        partitions.insert(ResponseType::Posture, POSTURE.to_vec());
        partitions.insert(ResponseType::Encouragement, ENCOURAGEMENT.to_vec());
        partitions.insert(ResponseType::Celebration, CELEBRATION.to_vec());
        partitions.insert(ResponseType::Concern, CONCERN.to_vec());
        partitions.insert(ResponseType::Greeting, GREETING.to_vec());
        Self { partitions }
    }

    /// An empty catalog, for hosts that load their own bank.
    pub fn empty() -> Self {
        Self {
            partitions: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, category: ResponseType, entry: CatalogEntry) {
        self.partitions.entry(category).or_default().push(entry);
    }

    pub fn add(&mut self, category: ResponseType, text: &'static str, mood: Mood, level: CareLevel) {
        self.push(category, CatalogEntry::new(text, mood, level));
    }

    pub fn partition(&self, category: ResponseType) -> &[CatalogEntry] {
        self.partitions.get(&category).map_or(&[], Vec::as_slice)
    }

    pub fn partition_mut(&mut self, category: ResponseType) -> Option<&mut Vec<CatalogEntry>> {
        self.partitions.get_mut(&category)
    }

    pub fn len(&self, category: ResponseType) -> usize {
        self.partition(category).len()
    }

    pub fn is_empty(&self, category: ResponseType) -> bool {
        self.partition(category).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_at_least_two_messages() {
        let catalog = MessageCatalog::builtin();
        for rt in ResponseType::ALL {
            assert!(
                catalog.len(rt) >= 2,
                "{} partition too small for the no-repeat guarantee",
                rt.as_str()
            );
        }
    }

    #[test]
    fn fresh_entries_have_no_usage() {
        let catalog = MessageCatalog::builtin();
        for rt in ResponseType::ALL {
            for entry in catalog.partition(rt) {
                assert_eq!(entry.use_count, 0);
                assert!(entry.last_used_at.is_none());
            }
        }
    }

    #[test]
    fn timed_categories_cover_all_care_levels_or_more() {
        // Hydration and movement span Gentle through Worried so escalated
        // reminders always have a matching-tone candidate.
        let catalog = MessageCatalog::builtin();
        for rt in [ResponseType::Hydration, ResponseType::Movement] {
            let levels: Vec<CareLevel> =
                catalog.partition(rt).iter().map(|e| e.care_level).collect();
            assert!(levels.contains(&CareLevel::Gentle));
            assert!(levels.contains(&CareLevel::Encouraging));
            assert!(levels.contains(&CareLevel::Concerned));
            assert!(levels.contains(&CareLevel::Worried));
        }
    }
}
