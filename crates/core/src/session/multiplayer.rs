use std::time::Duration;

use super::{
    Activation, Announcer, Attempt, Feedback, Judgement, Playback, Role, ScoreEntry, ScoreLedger,
    Session, SessionSnapshot, StateTag,
};
use crate::{
    sequence::MAX_SEQUENCE_LEN, sound::SoundBank, DwellSelector, FrameInput, GameConfig,
    GameError, InstrumentCatalog, Result, Sequence, TimingConfig,
};

pub const MIN_STARTING_LEVEL: u32 = 2;
pub const MAX_STARTING_LEVEL: u32 = 6;

pub(crate) fn check_starting_level(level: u32) -> Result<()> {
    if (MIN_STARTING_LEVEL..=MAX_STARTING_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(GameError::invalid_config(format!(
            "starting level must be between {MIN_STARTING_LEVEL} and {MAX_STARTING_LEVEL}, got {level}"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiplayerState {
    /// The creator is composing; `created` holds what they picked so far.
    WaitingForCreator { created: Vec<usize> },
    /// The round's sequence is being shown to the current guesser.
    Showing(Playback),
    /// The current guesser is reproducing the sequence.
    Waiting(Attempt),
    /// Guesser got it right; next guesser after the pause.
    Success { since: Duration },
    /// Guesser made a mistake after matching `reached` instruments; next
    /// guesser after the pause.
    GameOver { since: Duration, reached: usize },
    /// A level just finished and the scores are on screen.
    ShowingScores { since: Duration },
}

impl MultiplayerState {
    pub fn tag(&self) -> StateTag {
        match self {
            MultiplayerState::WaitingForCreator { .. } => StateTag::WaitingForCreator,
            MultiplayerState::Showing(_) => StateTag::Showing,
            MultiplayerState::Waiting(_) => StateTag::Waiting,
            MultiplayerState::Success { .. } => StateTag::Success,
            MultiplayerState::GameOver { .. } => StateTag::GameOver,
            MultiplayerState::ShowingScores { .. } => StateTag::ShowingScores,
        }
    }
}

/// Head-to-head mode. Players take turns composing a sequence that every
/// other player then tries to reproduce.
///
/// A guesser who reproduces the whole sequence scores a point. Each failed
/// guess earns the creator a penalty point, credited when the round ends.
/// After every player has composed once, the level (instrument count) rises.
pub struct MultiplayerSession {
    catalog: InstrumentCatalog,
    timing: TimingConfig,
    sound: Box<dyn SoundBank>,
    selector: DwellSelector,
    ledger: ScoreLedger,
    current_level: u32,
    completed_rounds: usize,
    creator_index: usize,
    guesser_index: usize,
    sequence: Option<Sequence>,
    state: MultiplayerState,
    feedback: Option<Feedback>,
    announcer: Announcer,
    last_tick: Duration,
}

impl MultiplayerSession {
    /// Players are given in join order; the first one composes first.
    pub fn new<I, S>(
        players: I,
        catalog: InstrumentCatalog,
        config: &GameConfig,
        sound: Box<dyn SoundBank>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        config.validate()?;
        let ledger = ScoreLedger::new(players)?;
        tracing::info!(
            players = ledger.len(),
            level = config.multiplayer.starting_level,
            "multiplayer game started"
        );

        let mut session = Self {
            catalog,
            timing: config.timing.clone(),
            sound,
            selector: DwellSelector::new(config.control, &config.timing),
            ledger,
            current_level: config.multiplayer.starting_level,
            completed_rounds: 0,
            creator_index: 0,
            guesser_index: 0,
            sequence: None,
            state: MultiplayerState::WaitingForCreator {
                created: Vec::new(),
            },
            feedback: None,
            announcer: Announcer::default(),
            last_tick: Duration::ZERO,
        };
        session.begin_composition(Duration::ZERO);
        Ok(session)
    }

    pub fn state(&self) -> &MultiplayerState {
        &self.state
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn completed_rounds(&self) -> usize {
        self.completed_rounds
    }

    pub fn creator_index(&self) -> usize {
        self.creator_index
    }

    pub fn guesser_index(&self) -> usize {
        self.guesser_index
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    /// Instruments the creator has to pick this round.
    pub fn required_len(&self) -> usize {
        (self.current_level as usize).min(MAX_SEQUENCE_LEN)
    }

    /// Scores from highest to lowest, ties in join order.
    pub fn ranking(&self) -> Vec<ScoreEntry> {
        self.ledger.ranking()
    }

    pub fn accepting_input(&self) -> bool {
        matches!(
            self.state,
            MultiplayerState::WaitingForCreator { .. } | MultiplayerState::Waiting(_)
        )
    }

    /// Applies one activation from the player whose turn it is.
    pub fn activate(&mut self, instrument: usize, now: Duration) -> Result<Activation> {
        self.catalog.check_index(instrument)?;

        let required = self.required_len();
        let tag = self.state.tag();
        let sequence = self.sequence.as_ref().map(Sequence::as_slice).unwrap_or(&[]);

        let step = match &mut self.state {
            MultiplayerState::WaitingForCreator { created } => {
                created.push(instrument);
                let remaining = required.saturating_sub(created.len());
                let finished = (remaining == 0).then(|| std::mem::take(created));
                Step::Composed { remaining, finished }
            }
            MultiplayerState::Waiting(attempt) => Step::Guessed(attempt.judge(instrument, sequence)),
            _ => {
                tracing::debug!(instrument, state = ?tag, "stale activation dropped");
                return Ok(Activation::Ignored);
            }
        };
        self.sound.play(instrument);

        let feedback = match step {
            Step::Composed {
                remaining,
                finished,
            } => {
                tracing::debug!(
                    creator = self.ledger.name(self.creator_index),
                    instrument = self.catalog.name(instrument).unwrap_or("?"),
                    remaining,
                    "instrument added"
                );
                if let Some(indices) = finished {
                    let sequence = Sequence::from_indices(indices, &self.catalog)?;
                    self.start_guessing(sequence, now);
                }
                Feedback::Composed {
                    instrument,
                    remaining,
                }
            }
            Step::Guessed(Judgement::Correct { remaining }) => Feedback::Correct {
                instrument,
                remaining,
            },
            Step::Guessed(Judgement::Complete) => {
                self.ledger.award(self.guesser_index, 1);
                let guesser = self.ledger.name(self.guesser_index).to_string();
                tracing::info!(guesser = %guesser, "sequence reproduced");
                self.announcer.announce(
                    format!("{guesser} got the whole sequence!"),
                    now,
                    self.timing.announcement(),
                );
                self.state = MultiplayerState::Success { since: now };
                Feedback::Completed { instrument }
            }
            Step::Guessed(Judgement::Mismatch { expected, position }) => {
                self.ledger.add_round_penalty();
                let guesser = self.ledger.name(self.guesser_index).to_string();
                tracing::info!(
                    guesser = %guesser,
                    position = position + 1,
                    expected = self.catalog.name(expected).unwrap_or("?"),
                    "wrong instrument"
                );
                self.announcer.announce(
                    format!("{guesser} missed instrument {}!", position + 1),
                    now,
                    self.timing.announcement(),
                );
                self.state = MultiplayerState::GameOver {
                    since: now,
                    reached: position,
                };
                Feedback::Mismatch {
                    instrument,
                    expected,
                    position,
                }
            }
        };

        self.feedback = Some(feedback.clone());
        Ok(Activation::Accepted(feedback))
    }

    fn advance_timers(&mut self, now: Duration) {
        if let MultiplayerState::Showing(playback) = &mut self.state {
            let sequence = self.sequence.as_ref().map(Sequence::as_slice).unwrap_or(&[]);
            if playback.advance(now, sequence, self.sound.as_mut(), &self.timing) {
                self.state = MultiplayerState::Waiting(Attempt::default());
                self.announcer.announce(
                    format!("{}'s turn!", self.ledger.name(self.guesser_index)),
                    now,
                    self.timing.announcement(),
                );
            }
            return;
        }

        let (since, pause) = match self.state {
            MultiplayerState::Success { since } => (since, self.timing.guesser_success()),
            MultiplayerState::GameOver { since, .. } => (since, self.timing.guesser_failure()),
            MultiplayerState::ShowingScores { since } => (since, self.timing.scores()),
            _ => return,
        };
        if now.saturating_sub(since) < pause {
            return;
        }

        if self.state.tag() == StateTag::ShowingScores {
            self.begin_composition(now);
        } else {
            self.next_guesser(now);
        }
    }

    fn start_guessing(&mut self, sequence: Sequence, now: Duration) {
        tracing::info!(
            creator = self.ledger.name(self.creator_index),
            sequence = %sequence.describe(&self.catalog),
            "sequence composed"
        );
        self.sequence = Some(sequence);
        match self.guesser_from(0) {
            Some(guesser) => self.show_to(guesser, now),
            None => self.end_round(now),
        }
    }

    /// First player at or after `start` who is not the creator.
    fn guesser_from(&self, start: usize) -> Option<usize> {
        (start..self.ledger.len()).find(|&player| player != self.creator_index)
    }

    fn show_to(&mut self, guesser: usize, now: Duration) {
        self.guesser_index = guesser;
        self.state = MultiplayerState::Showing(Playback::new());
        self.selector.reset_hover_state();
        self.announcer.announce(
            format!("{}: watch the sequence", self.ledger.name(guesser)),
            now,
            self.timing.announcement(),
        );
    }

    fn next_guesser(&mut self, now: Duration) {
        match self.guesser_from(self.guesser_index + 1) {
            Some(guesser) => self.show_to(guesser, now),
            None => self.end_round(now),
        }
    }

    fn end_round(&mut self, now: Duration) {
        let credited = self.ledger.settle_round(self.creator_index);
        tracing::info!(
            creator = self.ledger.name(self.creator_index),
            credited,
            "round finished"
        );
        self.completed_rounds += 1;

        if self.completed_rounds >= self.ledger.len() {
            self.current_level += 1;
            self.completed_rounds = 0;
            self.creator_index = 0;
            self.sequence = None;
            self.selector.reset_hover_state();
            self.state = MultiplayerState::ShowingScores { since: now };
            self.announcer.announce(
                format!("Level {}!", self.current_level),
                now,
                self.timing.announcement(),
            );
            let standings = self
                .ledger
                .ranking()
                .iter()
                .map(|entry| format!("{}: {}", entry.name, entry.score))
                .collect::<Vec<_>>()
                .join(", ");
            tracing::info!(level = self.current_level, %standings, "level up");
        } else {
            self.creator_index = (self.creator_index + 1) % self.ledger.len();
            self.begin_composition(now);
        }
    }

    fn begin_composition(&mut self, now: Duration) {
        self.sequence = None;
        self.state = MultiplayerState::WaitingForCreator {
            created: Vec::new(),
        };
        self.selector.reset_hover_state();
        let creator = self.ledger.name(self.creator_index).to_string();
        tracing::info!(creator = %creator, instruments = self.required_len(), "composing");
        self.announcer.announce(
            format!("{creator} composes {} instruments", self.required_len()),
            now,
            self.timing.announcement(),
        );
    }
}

enum Step {
    Composed {
        remaining: usize,
        finished: Option<Vec<usize>>,
    },
    Guessed(Judgement),
}

impl Session for MultiplayerSession {
    fn tick(&mut self, input: &FrameInput) -> Result<Option<Feedback>> {
        self.last_tick = input.now;
        self.advance_timers(input.now);

        let accepting = self.accepting_input();
        match self.selector.update(input, accepting, &self.catalog) {
            Some(instrument) => Ok(self.activate(instrument, input.now)?.feedback()),
            None => Ok(None),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let sequence = self.sequence.as_ref().map(Sequence::as_slice).unwrap_or(&[]);
        let (highlighted, progress, target_len, role, player) = match &self.state {
            MultiplayerState::WaitingForCreator { created } => (
                None,
                created.len(),
                self.required_len(),
                Role::Creator,
                self.creator_index,
            ),
            MultiplayerState::Showing(playback) => (
                playback.highlighted(sequence),
                0,
                sequence.len(),
                Role::Guesser,
                self.guesser_index,
            ),
            MultiplayerState::Waiting(attempt) => (
                None,
                attempt.progress_index(),
                sequence.len(),
                Role::Guesser,
                self.guesser_index,
            ),
            MultiplayerState::Success { .. } => (
                None,
                sequence.len(),
                sequence.len(),
                Role::Guesser,
                self.guesser_index,
            ),
            MultiplayerState::GameOver { reached, .. } => (
                None,
                *reached,
                sequence.len(),
                Role::Guesser,
                self.guesser_index,
            ),
            MultiplayerState::ShowingScores { .. } => (
                None,
                0,
                self.required_len(),
                Role::Creator,
                self.creator_index,
            ),
        };

        SessionSnapshot {
            state: self.state.tag(),
            highlighted,
            hover: self.selector.hover(),
            level: self.current_level,
            progress,
            target_len,
            role,
            player: Some(self.ledger.name(player).to_string()),
            scores: self.ledger.entries().to_vec(),
            feedback: self.feedback.clone(),
            announcement: self
                .announcer
                .current(self.last_tick)
                .map(str::to_string),
        }
    }
}

impl std::fmt::Debug for MultiplayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplayerSession")
            .field("ledger", &self.ledger)
            .field("current_level", &self.current_level)
            .field("completed_rounds", &self.completed_rounds)
            .field("creator_index", &self.creator_index)
            .field("guesser_index", &self.guesser_index)
            .field("state", &self.state)
            .finish()
    }
}
