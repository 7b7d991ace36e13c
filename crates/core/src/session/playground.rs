use std::{
    collections::VecDeque,
    fs::File,
    io::{BufWriter, Write},
    time::Duration,
};

use chrono::NaiveTime;
use serde::Serialize;

use super::{Announcer, Feedback, Role, Session, SessionSnapshot, StateTag};
use crate::{
    sound::SoundBank, DwellSelector, FrameInput, GameConfig, GameError, InstrumentCatalog,
    NoteLog, Result,
};

/// One note as shown in the recent-notes list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayedNote {
    pub timestamp: String,
    pub instrument: usize,
    pub name: String,
}

fn local_time() -> NaiveTime {
    chrono::Local::now().time()
}

/// Free play: every activation sounds the instrument and lands in the note
/// log. Nothing is ever wrong and input is always taken.
pub struct PlaygroundSession<W: Write = BufWriter<File>> {
    catalog: InstrumentCatalog,
    sound: Box<dyn SoundBank>,
    selector: DwellSelector,
    log: NoteLog<W>,
    recent: VecDeque<PlayedNote>,
    history_limit: usize,
    notes_played: usize,
    wall_clock: fn() -> NaiveTime,
    announcement: Duration,
    announcer: Announcer,
    feedback: Option<Feedback>,
    last_tick: Duration,
}

impl PlaygroundSession<BufWriter<File>> {
    /// Opens (or continues) the note log at the configured path.
    pub fn new(
        catalog: InstrumentCatalog,
        config: &GameConfig,
        sound: Box<dyn SoundBank>,
    ) -> Result<Self> {
        let log = NoteLog::open(&config.playground.log_path)?;
        tracing::info!(log = %config.playground.log_path.display(), "playground opened");
        Self::with_log(catalog, config, sound, log)
    }
}

impl<W: Write> PlaygroundSession<W> {
    pub fn with_log(
        catalog: InstrumentCatalog,
        config: &GameConfig,
        sound: Box<dyn SoundBank>,
        log: NoteLog<W>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            sound,
            selector: DwellSelector::new(config.control, &config.timing),
            log,
            recent: VecDeque::with_capacity(config.playground.history_limit),
            history_limit: config.playground.history_limit,
            notes_played: 0,
            wall_clock: local_time,
            announcement: config.timing.announcement(),
            announcer: Announcer::default(),
            feedback: None,
            last_tick: Duration::ZERO,
        })
    }

    /// Replaces the source of log timestamps.
    pub fn with_wall_clock(mut self, wall_clock: fn() -> NaiveTime) -> Self {
        self.wall_clock = wall_clock;
        self
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    /// Most recent notes, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &PlayedNote> {
        self.recent.iter()
    }

    pub fn notes_played(&self) -> usize {
        self.notes_played
    }

    pub fn log(&self) -> &NoteLog<W> {
        &self.log
    }

    pub fn into_log(self) -> NoteLog<W> {
        self.log
    }

    pub fn activate(&mut self, instrument: usize, now: Duration) -> Result<Feedback> {
        self.catalog.check_index(instrument)?;
        let name = self.catalog.name(instrument).unwrap_or("?").to_string();
        self.sound.play(instrument);

        let time = (self.wall_clock)();
        if let Err(err) = self.log.record(time, &name) {
            tracing::warn!(%err, instrument = %name, "could not write note log");
        }
        tracing::debug!(instrument = %name, "note played");

        if self.recent.len() == self.history_limit {
            self.recent.pop_front();
        }
        self.recent.push_back(PlayedNote {
            timestamp: time.format("%H:%M:%S%.3f").to_string(),
            instrument,
            name: name.clone(),
        });
        self.notes_played += 1;
        self.announcer.announce(name, now, self.announcement);

        let feedback = Feedback::Played { instrument };
        self.feedback = Some(feedback.clone());
        Ok(feedback)
    }

    /// Sets one hit-zone radius, clamped. Returns the radius applied.
    pub fn set_zone_radius(&mut self, instrument: usize, radius: f32) -> Result<f32> {
        let applied = self.catalog.set_radius(instrument, radius)?;
        self.selector.reset_hover_state();
        Ok(applied)
    }

    /// Grows or shrinks one hit-zone by `delta` pixels.
    pub fn nudge_zone(&mut self, instrument: usize, delta: f32) -> Result<f32> {
        let current = self
            .catalog
            .get(instrument)
            .map(|entry| entry.radius)
            .ok_or_else(|| {
                GameError::invalid_input(format!("no instrument at index {instrument}"))
            })?;
        self.set_zone_radius(instrument, current + delta)
    }

    pub fn scale_zones(&mut self, factor: f32) -> Result<()> {
        self.catalog.scale_radii(factor)?;
        self.selector.reset_hover_state();
        Ok(())
    }
}

impl<W: Write> Session for PlaygroundSession<W> {
    fn tick(&mut self, input: &FrameInput) -> Result<Option<Feedback>> {
        self.last_tick = input.now;
        match self.selector.update(input, true, &self.catalog) {
            Some(instrument) => self.activate(instrument, input.now).map(Some),
            None => Ok(None),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: StateTag::FreePlay,
            highlighted: self.recent.back().map(|note| note.instrument),
            hover: self.selector.hover(),
            level: 0,
            progress: self.notes_played,
            target_len: 0,
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

impl<W: Write> std::fmt::Debug for PlaygroundSession<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaygroundSession")
            .field("notes_played", &self.notes_played)
            .field("recent", &self.recent)
            .field("selector", &self.selector)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sound::testing::RecordingSoundBank, ControlMode, Point, MAX_RADIUS, MIN_RADIUS};

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_milli_opt(12, 0, 0, 250).unwrap()
    }

    fn playground(history_limit: usize) -> (PlaygroundSession<Vec<u8>>, RecordingSoundBank) {
        let mut config = GameConfig::default();
        config.playground.history_limit = history_limit;
        let sound = RecordingSoundBank::new(None);
        let session = PlaygroundSession::with_log(
            InstrumentCatalog::default(),
            &config,
            Box::new(sound.clone()),
            NoteLog::new(Vec::new()).unwrap(),
        )
        .unwrap()
        .with_wall_clock(noon);
        (session, sound)
    }

    #[test]
    fn every_activation_is_played_and_logged() {
        let (mut session, sound) = playground(10);
        session.activate(0, Duration::ZERO).unwrap();
        session.activate(4, Duration::ZERO).unwrap();

        assert_eq!(*sound.played.borrow(), vec![0, 4]);
        let names: Vec<_> = session.recent().map(|note| note.name.as_str()).collect();
        assert_eq!(names, ["Piano", "Drums"]);
        assert_eq!(session.recent().next().unwrap().timestamp, "12:00:00.250");

        let text = String::from_utf8(session.into_log().into_inner()).unwrap();
        assert_eq!(
            text,
            "Timestamp,Instrument\n12:00:00.250,Piano\n12:00:00.250,Drums\n"
        );
    }

    #[test]
    fn recent_notes_are_capped() {
        let (mut session, _) = playground(3);
        for instrument in [0, 1, 2, 3, 4] {
            session.activate(instrument, Duration::ZERO).unwrap();
        }
        let kept: Vec<_> = session.recent().map(|note| note.instrument).collect();
        assert_eq!(kept, [2, 3, 4]);
        assert_eq!(session.notes_played(), 5);
        assert_eq!(session.log().rows(), 5);
    }

    #[test]
    fn out_of_range_activation_is_rejected() {
        let (mut session, sound) = playground(10);
        assert!(matches!(
            session.activate(6, Duration::ZERO),
            Err(GameError::InvalidInput(_))
        ));
        assert!(sound.played.borrow().is_empty());
        assert_eq!(session.log().rows(), 0);
    }

    #[test]
    fn dwell_plays_repeatedly_while_hovering() {
        let (mut session, sound) = playground(10);
        let harp = Point::new(550.0, 120.0);
        for millis in (0..=2_200).step_by(100) {
            session
                .tick(&FrameInput::hover(Duration::from_millis(millis), harp))
                .unwrap();
        }
        assert_eq!(*sound.played.borrow(), vec![2, 2]);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, StateTag::FreePlay);
        assert_eq!(snapshot.highlighted, Some(2));
        assert_eq!(snapshot.announcement.as_deref(), Some("Harp"));
    }

    #[test]
    fn zones_are_adjustable_and_clamped() {
        let (mut session, _) = playground(10);
        assert_eq!(session.set_zone_radius(0, 500.0).unwrap(), MAX_RADIUS);
        assert_eq!(session.nudge_zone(0, -20.0).unwrap(), MAX_RADIUS - 20.0);
        assert_eq!(session.nudge_zone(1, -100.0).unwrap(), MIN_RADIUS);
        assert!(session.nudge_zone(9, 5.0).is_err());

        session.scale_zones(0.5).unwrap();
        assert_eq!(session.catalog().get(0).unwrap().radius, (MAX_RADIUS - 20.0) * 0.5);
    }

    #[test]
    fn resizing_resets_hover_progress() {
        let mut config = GameConfig {
            control: ControlMode::Dwell,
            ..GameConfig::default()
        };
        config.playground.history_limit = 5;
        let mut session = PlaygroundSession::with_log(
            InstrumentCatalog::default(),
            &config,
            Box::new(RecordingSoundBank::new(None)),
            NoteLog::append_to(Vec::new()),
        )
        .unwrap();

        let piano = Point::new(150.0, 100.0);
        session.tick(&FrameInput::hover(Duration::ZERO, piano)).unwrap();
        session
            .tick(&FrameInput::hover(Duration::from_millis(600), piano))
            .unwrap();
        assert!(session.snapshot().hover.progress > 0.5);

        session.set_zone_radius(0, 60.0).unwrap();
        assert_eq!(session.snapshot().hover.candidate, None);
        assert_eq!(session.snapshot().hover.progress, 0.0);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = GameConfig::default();
        config.timing.dwell_secs = f64::NAN;
        let result = PlaygroundSession::with_log(
            InstrumentCatalog::default(),
            &config,
            Box::new(RecordingSoundBank::new(None)),
            NoteLog::append_to(Vec::new()),
        );
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));

        config.timing.dwell_secs = 1.0;
        config.playground.history_limit = 0;
        let result = PlaygroundSession::with_log(
            InstrumentCatalog::default(),
            &config,
            Box::new(RecordingSoundBank::new(None)),
            NoteLog::append_to(Vec::new()),
        );
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn opens_log_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GameConfig::default();
        config.playground.log_path = dir.path().join("notes.csv");

        let mut session = PlaygroundSession::new(
            InstrumentCatalog::default(),
            &config,
            Box::new(RecordingSoundBank::new(None)),
        )
        .unwrap()
        .with_wall_clock(noon);
        session.activate(5, Duration::ZERO).unwrap();
        drop(session);

        let text = std::fs::read_to_string(&config.playground.log_path).unwrap();
        assert_eq!(text, "Timestamp,Instrument\n12:00:00.250,Flute\n");
    }
}
