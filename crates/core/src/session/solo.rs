use std::time::Duration;

use super::{
    Activation, Announcer, Attempt, Feedback, Judgement, Playback, Role, Session, SessionSnapshot,
    StateTag,
};
use crate::{
    sequence_length, sound::SoundBank, DwellSelector, FrameInput, GameConfig, GameError,
    InstrumentCatalog, Result, Sequence, SequenceGenerator, TimingConfig,
};

/// Single-player state. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The sequence is being demonstrated.
    Showing(Playback),
    /// The player is reproducing the sequence.
    Waiting(Attempt),
    /// Sequence reproduced; the next level starts once the pause elapses.
    Success {
        waiting_for_next_level: bool,
        completed_at: Duration,
    },
    /// Terminal. `reached` is how many instruments were matched before the
    /// mistake. A new session has to be built to play again.
    GameOver { reached: usize },
}

impl SessionState {
    pub fn tag(&self) -> StateTag {
        match self {
            SessionState::Showing(_) => StateTag::Showing,
            SessionState::Waiting(_) => StateTag::Waiting,
            SessionState::Success { .. } => StateTag::Success,
            SessionState::GameOver { .. } => StateTag::GameOver,
        }
    }
}

/// Single-player challenge: watch, repeat, level up, until the first mistake.
pub struct GameSession {
    catalog: InstrumentCatalog,
    timing: TimingConfig,
    generator: SequenceGenerator,
    sound: Box<dyn SoundBank>,
    selector: DwellSelector,
    level: u32,
    sequence: Sequence,
    state: SessionState,
    feedback: Option<Feedback>,
    announcer: Announcer,
    last_tick: Duration,
}

impl GameSession {
    /// Starts at level 1 with a generator seeded from `config.seed`.
    pub fn new(
        catalog: InstrumentCatalog,
        config: &GameConfig,
        sound: Box<dyn SoundBank>,
    ) -> Result<Self> {
        let generator = SequenceGenerator::for_catalog(&catalog, config.seed)?;
        Self::with_generator(catalog, config, generator, sound, 1)
    }

    /// Starts at `level` (at least 1) with the given generator.
    pub fn with_generator(
        catalog: InstrumentCatalog,
        config: &GameConfig,
        generator: SequenceGenerator,
        sound: Box<dyn SoundBank>,
        level: u32,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(catalog, config, generator, sound, level))
    }

    fn build(
        catalog: InstrumentCatalog,
        config: &GameConfig,
        mut generator: SequenceGenerator,
        sound: Box<dyn SoundBank>,
        level: u32,
    ) -> Self {
        let level = level.max(1);
        let sequence = generator.generate(level);
        tracing::info!(level, sequence = %sequence.describe(&catalog), "new sequence");
        Self {
            selector: DwellSelector::new(config.control, &config.timing),
            timing: config.timing.clone(),
            catalog,
            generator,
            sound,
            level,
            sequence,
            state: SessionState::Showing(Playback::new()),
            feedback: None,
            announcer: Announcer::default(),
            last_tick: Duration::ZERO,
        }
    }

    /// Replaces the current level's sequence and restarts its demonstration.
    /// The length has to match the level.
    pub fn with_sequence(mut self, sequence: Sequence) -> Result<Self> {
        let expected = sequence_length(self.level);
        if sequence.len() != expected {
            return Err(GameError::invalid_input(format!(
                "level {} needs a sequence of {expected} instruments, got {}",
                self.level,
                sequence.len()
            )));
        }
        for &index in sequence.as_slice() {
            self.catalog.check_index(index)?;
        }
        self.sequence = sequence;
        self.state = SessionState::Showing(Playback::new());
        self.selector.reset_hover_state();
        Ok(self)
    }

    /// Builds a fresh session after a game over, at level 1 or at the level
    /// that was lost. The generator keeps its random stream.
    pub fn restart(self, keep_level: bool) -> Self {
        let level = if keep_level { self.level } else { 1 };
        let config = GameConfig {
            control: self.selector.mode(),
            timing: self.timing,
            ..GameConfig::default()
        };
        tracing::info!(level, "restarting session");
        Self::build(self.catalog, &config, self.generator, self.sound, level)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, SessionState::GameOver { .. })
    }

    pub fn accepting_input(&self) -> bool {
        matches!(self.state, SessionState::Waiting(_))
    }

    /// Applies one activation at time `now`.
    ///
    /// Indices outside the catalog are rejected with
    /// [`GameError::InvalidInput`]. Activations outside `Waiting` are dropped.
    pub fn activate(&mut self, instrument: usize, now: Duration) -> Result<Activation> {
        self.catalog.check_index(instrument)?;

        let tag = self.state.tag();
        let judgement = match &mut self.state {
            SessionState::Waiting(attempt) => attempt.judge(instrument, self.sequence.as_slice()),
            _ => {
                tracing::debug!(instrument, state = ?tag, "stale activation dropped");
                return Ok(Activation::Ignored);
            }
        };
        self.sound.play(instrument);

        let feedback = match judgement {
            Judgement::Correct { remaining } => {
                tracing::debug!(instrument, remaining, "correct");
                Feedback::Correct {
                    instrument,
                    remaining,
                }
            }
            Judgement::Complete => {
                tracing::info!(level = self.level, "level complete");
                self.state = SessionState::Success {
                    waiting_for_next_level: true,
                    completed_at: now,
                };
                self.announcer.announce(
                    format!("Level {} complete!", self.level),
                    now,
                    self.timing.solo_success(),
                );
                Feedback::Completed { instrument }
            }
            Judgement::Mismatch { expected, position } => {
                tracing::info!(
                    level = self.level,
                    played = self.catalog.name(instrument).unwrap_or("?"),
                    expected = self.catalog.name(expected).unwrap_or("?"),
                    "wrong instrument, game over"
                );
                self.state = SessionState::GameOver { reached: position };
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
        if let SessionState::Showing(playback) = &mut self.state {
            let finished = playback.advance(
                now,
                self.sequence.as_slice(),
                self.sound.as_mut(),
                &self.timing,
            );
            if finished {
                tracing::debug!(level = self.level, "sequence shown, waiting for player");
                self.state = SessionState::Waiting(Attempt::default());
                self.announcer
                    .announce("Your turn!", now, self.timing.announcement());
            }
            return;
        }

        if let SessionState::Success {
            waiting_for_next_level: true,
            completed_at,
        } = self.state
        {
            if now.saturating_sub(completed_at) >= self.timing.solo_success() {
                self.next_level();
            }
        }
    }

    fn next_level(&mut self) {
        self.level += 1;
        self.sequence = self.generator.generate(self.level);
        self.state = SessionState::Showing(Playback::new());
        self.selector.reset_hover_state();
        tracing::info!(
            level = self.level,
            sequence = %self.sequence.describe(&self.catalog),
            "new sequence"
        );
    }
}

impl Session for GameSession {
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
        let sequence = self.sequence.as_slice();
        let (highlighted, progress) = match &self.state {
            SessionState::Showing(playback) => (playback.highlighted(sequence), 0),
            SessionState::Waiting(attempt) => (None, attempt.progress_index()),
            SessionState::Success { .. } => (None, sequence.len()),
            SessionState::GameOver { reached } => (None, *reached),
        };

        SessionSnapshot {
            state: self.state.tag(),
            highlighted,
            hover: self.selector.hover(),
            level: self.level,
            progress,
            target_len: sequence.len(),
            role: Role::Solo,
            player: None,
            scores: Vec::new(),
            feedback: self.feedback.clone(),
            announcement: self
                .announcer
                .current(self.last_tick)
                .map(str::to_string),
        }
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("level", &self.level)
            .field("sequence", &self.sequence)
            .field("state", &self.state)
            .field("selector", &self.selector)
            .finish()
    }
}
