//! Dialogue playback — sequences timed lines on screen.
//!
//! The player is a small state machine driven by the host's frame loop via
//! [`DialoguePlayer::advance`]; it never sleeps or spawns. Display output
//! goes through the [`DialogueDisplay`] seam so the UI layer stays outside
//! this crate.

use std::time::Duration;

/// One line of dialogue: who says it, what they say, how long it stays up.
#[derive(Debug, Clone)]
pub struct DialogueLine {
    /// Display name shown as the speaker.
    pub speaker: String,
    /// The spoken text.
    pub text: String,
    /// How long the line remains on screen.
    pub duration: Duration,
}

impl DialogueLine {
    /// Create a line with a duration in seconds.
    #[must_use]
    pub fn new(speaker: impl Into<String>, text: impl Into<String>, duration_secs: f32) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            duration: Duration::from_secs_f32(duration_secs.max(0.0)),
        }
    }
}

/// An ordered sequence of lines.
#[derive(Debug, Clone, Default)]
pub struct Dialogue {
    /// The lines, played front to back.
    pub lines: Vec<DialogueLine>,
}

impl Dialogue {
    /// A one-line dialogue.
    #[must_use]
    pub fn single(speaker: impl Into<String>, text: impl Into<String>, duration_secs: f32) -> Self {
        Self {
            lines: vec![DialogueLine::new(speaker, text, duration_secs)],
        }
    }
}

/// Sink for the on-screen dialogue panel. Implemented by the UI layer;
/// this crate only pushes strings through it.
pub trait DialogueDisplay {
    /// Show (or replace) the current line.
    fn show(&mut self, speaker: &str, text: &str);
    /// Hide the panel.
    fn hide(&mut self);
}

/// A display that goes nowhere — headless runs and tests.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl DialogueDisplay for NullDisplay {
    fn show(&mut self, _speaker: &str, _text: &str) {}
    fn hide(&mut self) {}
}

#[derive(Debug)]
enum PlayerState {
    Idle,
    Playing {
        npc_id: String,
        lines: Vec<DialogueLine>,
        index: usize,
        elapsed: Duration,
    },
}

/// The playback state machine.
///
/// `play` for the NPC that is already speaking is a no-op (prevents
/// restart spam from repeated triggers); any other `play` interrupts the
/// in-flight sequence. After the last line's duration the player returns
/// to idle and hides the display on its own.
#[derive(Debug)]
pub struct DialoguePlayer {
    state: PlayerState,
}

impl Default for DialoguePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl DialoguePlayer {
    /// Create an idle player.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PlayerState::Idle,
        }
    }

    /// The NPC currently speaking, if any.
    #[must_use]
    pub fn current_speaker(&self) -> Option<&str> {
        match &self.state {
            PlayerState::Idle => None,
            PlayerState::Playing { npc_id, .. } => Some(npc_id),
        }
    }

    /// Whether a sequence is in flight.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlayerState::Playing { .. })
    }

    /// Start playing `dialogue` attributed to `npc_id`.
    ///
    /// No-op if that NPC is already the current speaker; otherwise stops
    /// whatever was playing and starts from line 0.
    pub fn play(&mut self, npc_id: &str, dialogue: Dialogue, display: &mut dyn DialogueDisplay) {
        if let PlayerState::Playing { npc_id: current, .. } = &self.state {
            if current == npc_id {
                return;
            }
        }
        self.stop(display);

        let Some(first) = dialogue.lines.first() else {
            return;
        };
        display.show(&first.speaker, &first.text);
        self.state = PlayerState::Playing {
            npc_id: npc_id.to_string(),
            lines: dialogue.lines,
            index: 0,
            elapsed: Duration::ZERO,
        };
    }

    /// Advance playback by one frame's delta time.
    pub fn advance(&mut self, dt: Duration, display: &mut dyn DialogueDisplay) {
        let PlayerState::Playing {
            lines,
            index,
            elapsed,
            ..
        } = &mut self.state
        else {
            return;
        };

        *elapsed += dt;
        let mut finished = false;
        while *elapsed >= lines[*index].duration {
            *elapsed -= lines[*index].duration;
            *index += 1;
            if *index >= lines.len() {
                finished = true;
                break;
            }
            let line = &lines[*index];
            display.show(&line.speaker, &line.text);
        }

        if finished {
            self.state = PlayerState::Idle;
            display.hide();
        }
    }

    /// Cancel the in-flight sequence and hide the display. Idempotent.
    pub fn stop(&mut self, display: &mut dyn DialogueDisplay) {
        if self.is_playing() {
            self.state = PlayerState::Idle;
        }
        display.hide();
    }

    /// Stop only if `npc_id` is the current speaker — used when that NPC
    /// leaves interaction range.
    pub fn stop_if_current_speaker(&mut self, npc_id: &str, display: &mut dyn DialogueDisplay) {
        if self.current_speaker() == Some(npc_id) {
            self.stop(display);
        }
    }
}
