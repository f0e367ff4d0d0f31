// ── Renderer capability ────────────────────────────────────────────────────
// The engine emits symbolic commands; how they become pixels or sound is a
// platform concern. Each platform implements this small trait and the core
// never names a concrete renderer type.

use log::info;

use crate::atoms::types::{DisplayCommand, SpeechCommand};

pub trait Renderer {
    fn display(&mut self, cmd: &DisplayCommand);
    fn speak(&mut self, cmd: &SpeechCommand);
}

/// Renders to the log stream. Useful headless and as a debugging tap.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn display(&mut self, cmd: &DisplayCommand) {
        info!(
            "[render] mood={:?} intensity={:.2}",
            cmd.mood, cmd.intensity
        );
    }

    fn speak(&mut self, cmd: &SpeechCommand) {
        info!("[render] say ({:?}): {}", cmd.urgency, cmd.text);
    }
}

/// Records every command it receives. For tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub displayed: Vec<DisplayCommand>,
    pub spoken: Vec<SpeechCommand>,
}

impl Renderer for RecordingRenderer {
    fn display(&mut self, cmd: &DisplayCommand) {
        self.displayed.push(*cmd);
    }

    fn speak(&mut self, cmd: &SpeechCommand) {
        self.spoken.push(cmd.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::{Mood, Urgency};

    #[test]
    fn recording_renderer_captures_commands() {
        let mut r = RecordingRenderer::default();
        r.display(&DisplayCommand {
            mood: Mood::Happy,
            intensity: 0.25,
        });
        r.speak(&SpeechCommand {
            text: "hello".into(),
            urgency: Urgency::Calm,
        });
        assert_eq!(r.displayed.len(), 1);
        assert_eq!(r.spoken[0].text, "hello");
    }
}
