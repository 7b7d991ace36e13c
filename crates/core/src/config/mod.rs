use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{ControlMode, GameError, Result};

/// Top-level configuration structure for the game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub control: ControlMode,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub multiplayer: MultiplayerConfig,
    #[serde(default)]
    pub playground: PlaygroundConfig,
    /// Fixed seed for sequence generation. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        self.multiplayer.validate()?;
        if self.playground.history_limit == 0 {
            return Err(GameError::invalid_config(
                "playground history limit must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Every timer the sessions use, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_dwell")]
    pub dwell_secs: f64,
    #[serde(default = "TimingConfig::default_click_cooldown")]
    pub click_cooldown_secs: f64,
    /// Gap after each instrument while a sequence is being shown.
    #[serde(default = "TimingConfig::default_showing_pause")]
    pub showing_pause_secs: f64,
    /// Highlight length used when the sound bank cannot report a duration.
    #[serde(default = "TimingConfig::default_highlight_fallback")]
    pub highlight_fallback_secs: f64,
    #[serde(default = "TimingConfig::default_solo_success")]
    pub solo_success_secs: f64,
    #[serde(default = "TimingConfig::default_guesser_success")]
    pub guesser_success_secs: f64,
    #[serde(default = "TimingConfig::default_guesser_failure")]
    pub guesser_failure_secs: f64,
    #[serde(default = "TimingConfig::default_scores")]
    pub scores_secs: f64,
    #[serde(default = "TimingConfig::default_announcement")]
    pub announcement_secs: f64,
}

impl TimingConfig {
    fn default_dwell() -> f64 {
        1.0
    }
    fn default_click_cooldown() -> f64 {
        0.5
    }
    fn default_showing_pause() -> f64 {
        0.5
    }
    fn default_highlight_fallback() -> f64 {
        0.8
    }
    fn default_solo_success() -> f64 {
        1.5
    }
    fn default_guesser_success() -> f64 {
        1.0
    }
    fn default_guesser_failure() -> f64 {
        1.5
    }
    fn default_scores() -> f64 {
        1.0
    }
    fn default_announcement() -> f64 {
        2.0
    }

    pub fn dwell(&self) -> Duration {
        seconds(self.dwell_secs)
    }

    pub fn click_cooldown(&self) -> Duration {
        seconds(self.click_cooldown_secs)
    }

    pub fn showing_pause(&self) -> Duration {
        seconds(self.showing_pause_secs)
    }

    pub fn highlight_fallback(&self) -> Duration {
        seconds(self.highlight_fallback_secs)
    }

    pub fn solo_success(&self) -> Duration {
        seconds(self.solo_success_secs)
    }

    pub fn guesser_success(&self) -> Duration {
        seconds(self.guesser_success_secs)
    }

    pub fn guesser_failure(&self) -> Duration {
        seconds(self.guesser_failure_secs)
    }

    pub fn scores(&self) -> Duration {
        seconds(self.scores_secs)
    }

    pub fn announcement(&self) -> Duration {
        seconds(self.announcement_secs)
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("dwell_secs", self.dwell_secs),
            ("click_cooldown_secs", self.click_cooldown_secs),
            ("showing_pause_secs", self.showing_pause_secs),
            ("highlight_fallback_secs", self.highlight_fallback_secs),
            ("solo_success_secs", self.solo_success_secs),
            ("guesser_success_secs", self.guesser_success_secs),
            ("guesser_failure_secs", self.guesser_failure_secs),
            ("scores_secs", self.scores_secs),
            ("announcement_secs", self.announcement_secs),
        ];
        for (name, value) in fields {
            if value <= 0.0 || Duration::try_from_secs_f64(value).is_err() {
                return Err(GameError::invalid_config(format!(
                    "timing.{name} must be a positive number of seconds, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Unvalidated values saturate instead of panicking.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dwell_secs: Self::default_dwell(),
            click_cooldown_secs: Self::default_click_cooldown(),
            showing_pause_secs: Self::default_showing_pause(),
            highlight_fallback_secs: Self::default_highlight_fallback(),
            solo_success_secs: Self::default_solo_success(),
            guesser_success_secs: Self::default_guesser_success(),
            guesser_failure_secs: Self::default_guesser_failure(),
            scores_secs: Self::default_scores(),
            announcement_secs: Self::default_announcement(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplayerConfig {
    #[serde(default = "MultiplayerConfig::default_starting_level")]
    pub starting_level: u32,
}

impl MultiplayerConfig {
    fn default_starting_level() -> u32 {
        2
    }

    fn validate(&self) -> Result<()> {
        crate::session::multiplayer::check_starting_level(self.starting_level)
    }
}

impl Default for MultiplayerConfig {
    fn default() -> Self {
        Self {
            starting_level: Self::default_starting_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    #[serde(default = "PlaygroundConfig::default_log_path")]
    pub log_path: PathBuf,
    /// Number of recent notes kept in memory for display.
    #[serde(default = "PlaygroundConfig::default_history_limit")]
    pub history_limit: usize,
}

impl PlaygroundConfig {
    fn default_log_path() -> PathBuf {
        PathBuf::from("played_instruments.csv")
    }
    fn default_history_limit() -> usize {
        10
    }
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            log_path: Self::default_log_path(),
            history_limit: Self::default_history_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: GameConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.control, ControlMode::Dwell);
        assert_eq!(config.timing.dwell(), Duration::from_secs(1));
        assert_eq!(config.timing.click_cooldown(), Duration::from_millis(500));
        assert_eq!(config.multiplayer.starting_level, 2);
        assert_eq!(config.playground.history_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_timing_block_keeps_other_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "control": "click", "timing": { "dwell_secs": 0.25 } }"#)
                .unwrap();
        assert_eq!(config.control, ControlMode::Click);
        assert_eq!(config.timing.dwell(), Duration::from_millis(250));
        assert_eq!(config.timing.solo_success(), Duration::from_millis(1500));
    }

    #[test]
    fn rejects_non_positive_durations() {
        let mut config = GameConfig::default();
        config.timing.guesser_failure_secs = 0.0;
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("guesser_failure_secs"));
    }

    #[test]
    fn rejects_durations_too_large_to_represent() {
        let mut config = GameConfig::default();
        config.timing.scores_secs = 1e30;
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfig(_))
        ));
        config.timing.scores_secs = f64::INFINITY;
        assert!(config.validate().is_err());
        assert_eq!(config.timing.scores(), Duration::MAX);
        config.timing.scores_secs = -2.0;
        assert_eq!(config.timing.scores(), Duration::ZERO);
    }

    #[test]
    fn rejects_out_of_range_starting_level() {
        let mut config = GameConfig::default();
        config.multiplayer.starting_level = 9;
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        fs::write(&path, r#"{ "seed": 7, "playground": { "history_limit": 3 } }"#).unwrap();

        let config = GameConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.playground.history_limit, 3);
    }
}
