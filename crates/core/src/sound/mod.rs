use std::{collections::HashSet, time::Duration};

/// Playback collaborator the sessions call into. Audio itself lives outside
/// the engine; implementations wrap whatever mixer the front end uses.
pub trait SoundBank {
    /// Starts playing the instrument's clip. Must be a no-op when the clip is
    /// missing.
    fn play(&mut self, instrument: usize);

    /// Clip length, or `None` when the instrument has no loaded clip.
    fn duration(&self, instrument: usize) -> Option<Duration>;
}

/// Sound bank with known clip lengths and no output device. Plays are logged
/// through `tracing`; instruments without a clip are reported once and then
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct SilentSoundBank {
    clips: Vec<Option<Duration>>,
    reported_missing: HashSet<usize>,
    plays: usize,
}

impl SilentSoundBank {
    /// Every one of `count` instruments gets a clip of `length`.
    pub fn uniform(count: usize, length: Duration) -> Self {
        Self::with_clips(vec![Some(length); count])
    }

    pub fn with_clips(clips: Vec<Option<Duration>>) -> Self {
        Self {
            clips,
            reported_missing: HashSet::new(),
            plays: 0,
        }
    }

    /// Number of clips actually started.
    pub fn plays(&self) -> usize {
        self.plays
    }
}

impl SoundBank for SilentSoundBank {
    fn play(&mut self, instrument: usize) {
        if self.duration(instrument).is_some() {
            self.plays += 1;
            tracing::trace!(instrument, "play");
        } else if self.reported_missing.insert(instrument) {
            tracing::warn!(instrument, "no clip loaded for instrument, playing nothing");
        }
    }

    fn duration(&self, instrument: usize) -> Option<Duration> {
        self.clips.get(instrument).copied().flatten()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_bank_reports_lengths() {
        let bank = SilentSoundBank::uniform(3, Duration::from_millis(600));
        assert_eq!(bank.duration(2), Some(Duration::from_millis(600)));
        assert_eq!(bank.duration(3), None);
    }

    #[test]
    fn missing_clip_is_a_no_op() {
        let mut bank = SilentSoundBank::with_clips(vec![Some(Duration::from_millis(300)), None]);
        bank.play(0);
        bank.play(1);
        bank.play(1);
        bank.play(7);
        assert_eq!(bank.plays(), 1);
    }
}
