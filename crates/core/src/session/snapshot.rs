use serde::Serialize;

use super::{Feedback, ScoreEntry};
use crate::HoverState;

/// Which state a session is in, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    WaitingForCreator,
    Showing,
    Waiting,
    Success,
    GameOver,
    ShowingScores,
    FreePlay,
}

impl StateTag {
    /// States in which activations are taken.
    pub fn accepts_input(self) -> bool {
        matches!(
            self,
            StateTag::WaitingForCreator | StateTag::Waiting | StateTag::FreePlay
        )
    }
}

/// Whose turn it is and in what capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Solo,
    Creator,
    Guesser,
}

/// Everything the presentation layer reads each frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: StateTag,
    pub highlighted: Option<usize>,
    pub hover: HoverState,
    pub level: u32,
    /// Instruments matched (or composed) so far.
    pub progress: usize,
    /// Length of the sequence being shown, matched or composed.
    pub target_len: usize,
    pub role: Role,
    /// Name of the player whose turn it is. `None` in single player.
    pub player: Option<String>,
    /// Scores in join order. Empty outside multiplayer.
    pub scores: Vec<ScoreEntry>,
    pub feedback: Option<Feedback>,
    pub announcement: Option<String>,
}
