//! Core engine for Instrument Echo, a "Simon says" game played on virtual
//! instruments.
//!
//! The crate holds no window, camera or audio device. A front end samples a
//! [`Clock`] and the pointer once per frame, hands the result to a
//! [`Session`] as a [`FrameInput`], and draws whatever the returned
//! [`SessionSnapshot`] says. Sound goes out through the [`SoundBank`] trait.
//!
//! Three modes share that surface: [`GameSession`] (single player),
//! [`MultiplayerSession`] (turn-based composing and guessing) and
//! [`PlaygroundSession`] (free play with a note log).

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod record;
pub mod selector;
pub mod sequence;
pub mod session;
pub mod sound;

pub use catalog::{Instrument, InstrumentCatalog, Point, DEFAULT_RADIUS, MAX_RADIUS, MIN_RADIUS};
pub use clock::{Clock, FrameInput, ManualClock, MonotonicClock};
pub use config::{GameConfig, MultiplayerConfig, PlaygroundConfig, TimingConfig};
pub use error::{GameError, Result};
pub use record::NoteLog;
pub use selector::{ControlMode, DwellSelector, HoverState};
pub use sequence::{generate_with, sequence_length, Sequence, SequenceGenerator, MAX_SEQUENCE_LEN};
pub use session::{
    Activation, Attempt, Feedback, GameSession, MultiplayerSession, MultiplayerState, Playback,
    PlayedNote, PlaygroundSession, Role, ScoreEntry, ScoreLedger, Session, SessionSnapshot,
    SessionState, StateTag,
};
pub use sound::{SilentSoundBank, SoundBank};
