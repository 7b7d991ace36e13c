//! Game-state machines for the three play modes.
//!
//! Single player and multiplayer share the two pieces that carry real timing
//! and matching logic: [`Playback`] paces the demonstration of a sequence
//! against the tick clock, and [`Attempt`] checks a player's activations
//! against it. Each mode wraps them in its own state enum and decides whose
//! turn comes next.

pub mod ledger;
pub mod multiplayer;
pub mod playground;
pub mod snapshot;
pub mod solo;

use std::time::Duration;

use serde::Serialize;

use crate::{sound::SoundBank, FrameInput, Result, TimingConfig};

pub use ledger::{ScoreEntry, ScoreLedger};
pub use multiplayer::{MultiplayerSession, MultiplayerState};
pub use playground::{PlayedNote, PlaygroundSession};
pub use snapshot::{Role, SessionSnapshot, StateTag};
pub use solo::{GameSession, SessionState};

/// Common surface the front end drives once per frame.
pub trait Session {
    /// Advances timers, feeds the input through the selector and applies the
    /// resulting activation, if any.
    fn tick(&mut self, input: &FrameInput) -> Result<Option<Feedback>>;

    /// Read-only view for rendering.
    fn snapshot(&self) -> SessionSnapshot;
}

/// Last correctness signal, kept for transient on-screen messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// Right instrument, more to go.
    Correct { instrument: usize, remaining: usize },
    /// Right instrument and the sequence is done.
    Completed { instrument: usize },
    /// Wrong instrument at `position` (zero based).
    Mismatch {
        instrument: usize,
        expected: usize,
        position: usize,
    },
    /// The creator added an instrument to the sequence being composed.
    Composed { instrument: usize, remaining: usize },
    /// Free play note.
    Played { instrument: usize },
}

/// Result of delivering one activation to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Accepted(Feedback),
    /// Delivered while the session was not taking input. Dropped.
    Ignored,
}

impl Activation {
    pub fn feedback(self) -> Option<Feedback> {
        match self {
            Activation::Accepted(feedback) => Some(feedback),
            Activation::Ignored => None,
        }
    }
}

/// Non-blocking pacing of a sequence demonstration.
///
/// Each step plays its instrument once, keeps it lit for the clip length and
/// then waits out the showing pause with nothing lit. Steps only advance when
/// [`Playback::advance`] sees enough time has passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playback {
    display_index: usize,
    step_started_at: Option<Duration>,
    step_clip: Duration,
    lit: bool,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_index(&self) -> usize {
        self.display_index
    }

    /// Instrument lit as of the last advance.
    pub fn highlighted(&self, sequence: &[usize]) -> Option<usize> {
        if self.lit {
            sequence.get(self.display_index).copied()
        } else {
            None
        }
    }

    /// Moves the demonstration forward to `now`. Returns true once every step
    /// has been shown.
    pub(crate) fn advance(
        &mut self,
        now: Duration,
        sequence: &[usize],
        sound: &mut dyn SoundBank,
        timing: &TimingConfig,
    ) -> bool {
        let Some(&instrument) = sequence.get(self.display_index) else {
            self.lit = false;
            return true;
        };

        let Some(started_at) = self.step_started_at else {
            sound.play(instrument);
            self.step_clip = sound
                .duration(instrument)
                .unwrap_or_else(|| timing.highlight_fallback());
            self.step_started_at = Some(now);
            self.lit = true;
            return false;
        };

        let elapsed = now.saturating_sub(started_at);
        if elapsed >= self.step_clip + timing.showing_pause() {
            self.display_index += 1;
            self.step_started_at = None;
            self.lit = false;
            // The next step starts on this same tick.
            return self.advance(now, sequence, sound, timing);
        }

        self.lit = elapsed < self.step_clip;
        false
    }
}

/// Outcome of checking one activation against the target sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Judgement {
    Correct { remaining: usize },
    Complete,
    Mismatch { expected: usize, position: usize },
}

/// A player's progress through the target sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attempt {
    progress_index: usize,
    history: Vec<usize>,
}

impl Attempt {
    pub fn progress_index(&self) -> usize {
        self.progress_index
    }

    /// Every instrument the player activated, right or wrong.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    pub(crate) fn judge(&mut self, instrument: usize, sequence: &[usize]) -> Judgement {
        self.history.push(instrument);
        match sequence.get(self.progress_index) {
            Some(&expected) if expected == instrument => {
                self.progress_index += 1;
                let remaining = sequence.len() - self.progress_index;
                if remaining == 0 {
                    Judgement::Complete
                } else {
                    Judgement::Correct { remaining }
                }
            }
            Some(&expected) => Judgement::Mismatch {
                expected,
                position: self.progress_index,
            },
            None => Judgement::Complete,
        }
    }
}

/// Short-lived message with an expiry on the tick clock.
#[derive(Debug, Clone, Default)]
pub(crate) struct Announcer {
    current: Option<(String, Duration)>,
}

impl Announcer {
    pub(crate) fn announce(&mut self, text: impl Into<String>, now: Duration, lasting: Duration) {
        self.current = Some((text.into(), now + lasting));
    }

    pub(crate) fn current(&self, now: Duration) -> Option<&str> {
        match &self.current {
            Some((text, until)) if now < *until => Some(text.as_str()),
            _ => None,
        }
    }
}
