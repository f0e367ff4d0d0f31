// ── sprout-core ────────────────────────────────────────────────────────────
// The adaptive response engine behind the Sprout desk companion.
//
// The engine pairs a behavior classifier (sensor signal → structured
// activity/need assessment) with a personality layer (assessment → mood,
// care level, and a non-repetitive caring message), learning which response
// categories work for a given user. Everything upstream (sensor polling,
// pose estimation) and downstream (LED animation, TTS playback) is an
// external collaborator: the engine consumes `SensorSample`s and emits
// symbolic `DisplayCommand`/`SpeechCommand` values.
//
// Layering:
//   atoms/   — pure constants, data types, errors; no I/O
//   engine/  — classifier, scheduler, escalation, selector, learner,
//              persistence, renderer seam

pub mod atoms;
pub mod engine;

pub use atoms::constants;
pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::*;

pub use engine::catalog::{CatalogEntry, MessageCatalog};
pub use engine::classifier::ActivityClassifier;
pub use engine::config::EngineConfig;
pub use engine::escalation::{CareState, SleepSource};
pub use engine::learner::PreferenceTable;
pub use engine::renderer::{LogRenderer, RecordingRenderer, Renderer};
pub use engine::scheduler::{ReminderTimer, ReminderTimers};
pub use engine::selector::ResponseSelector;
pub use engine::store::StateStore;
pub use engine::CompanionEngine;

use std::sync::Arc;

use parking_lot::Mutex;

/// The engine behind one mutex, for hosts that tick from one thread and
/// deliver outcome/control events from another. Lock around the full call —
/// the core assumes sequential consistency.
pub type SharedEngine = Arc<Mutex<CompanionEngine>>;

impl CompanionEngine {
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }
}

/// Forward one tick's output to a renderer.
pub fn render_output(output: &TickOutput, renderer: &mut dyn Renderer) {
    renderer.display(&output.display);
    if let Some(speech) = &output.speech {
        renderer.speak(speech);
    }
}
