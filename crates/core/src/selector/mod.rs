use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FrameInput, InstrumentCatalog, TimingConfig};

/// How the player confirms an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Hand tracking: hold the pointer over an instrument until the dwell
    /// timer fills.
    #[default]
    #[serde(alias = "hand")]
    Dwell,
    /// Mouse: a click on an instrument, debounced by a cooldown.
    #[serde(alias = "mouse")]
    Click,
}

/// Instrument currently under the pointer and how far its dwell timer got.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HoverState {
    pub candidate: Option<usize>,
    pub started_at: Duration,
    /// Fraction of the dwell time elapsed, in `[0, 1]`.
    pub progress: f32,
}

/// Turns the per-tick pointer stream into discrete activations.
#[derive(Debug, Clone)]
pub struct DwellSelector {
    mode: ControlMode,
    dwell: Duration,
    cooldown: Duration,
    hover: HoverState,
    last_activation: Option<Duration>,
}

impl DwellSelector {
    pub fn new(mode: ControlMode, timing: &TimingConfig) -> Self {
        Self {
            mode,
            dwell: timing.dwell(),
            cooldown: timing.click_cooldown(),
            hover: HoverState::default(),
            last_activation: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn reset_hover_state(&mut self) {
        self.hover = HoverState::default();
    }

    /// Evaluates one tick. Returns the instrument to activate, if any.
    ///
    /// While `accepting` is false the selector does nothing except clear its
    /// hover state, so progress from before a pause never carries over.
    pub fn update(
        &mut self,
        input: &FrameInput,
        accepting: bool,
        catalog: &InstrumentCatalog,
    ) -> Option<usize> {
        if !accepting {
            self.reset_hover_state();
            return None;
        }

        match self.mode {
            ControlMode::Dwell => self.update_dwell(input, catalog),
            ControlMode::Click => self.update_click(input, catalog),
        }
    }

    fn update_dwell(&mut self, input: &FrameInput, catalog: &InstrumentCatalog) -> Option<usize> {
        let Some(hit) = input.cursor.and_then(|cursor| catalog.hit_test(cursor)) else {
            self.reset_hover_state();
            return None;
        };

        if self.hover.candidate != Some(hit) {
            self.hover = HoverState {
                candidate: Some(hit),
                started_at: input.now,
                progress: 0.0,
            };
            return None;
        }

        let elapsed = input.now.saturating_sub(self.hover.started_at);
        if elapsed >= self.dwell {
            self.reset_hover_state();
            self.last_activation = Some(input.now);
            return Some(hit);
        }

        let progress = (elapsed.as_secs_f64() / self.dwell.as_secs_f64()).clamp(0.0, 1.0);
        self.hover.progress = progress as f32;
        None
    }

    fn update_click(&mut self, input: &FrameInput, catalog: &InstrumentCatalog) -> Option<usize> {
        self.reset_hover_state();
        if !input.clicked {
            return None;
        }

        let hit = input.cursor.and_then(|cursor| catalog.hit_test(cursor))?;

        if let Some(last) = self.last_activation {
            if input.now.saturating_sub(last) < self.cooldown {
                tracing::debug!(instrument = hit, "click dropped during cooldown");
                return None;
            }
        }

        self.last_activation = Some(input.now);
        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instrument, Point};

    const FRAME: Duration = Duration::from_millis(33);

    fn selector(mode: ControlMode) -> DwellSelector {
        DwellSelector::new(mode, &TimingConfig::default())
    }

    fn piano() -> Point {
        Point::new(150.0, 100.0)
    }

    fn harp() -> Point {
        Point::new(550.0, 120.0)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn dwell_progress_rises_then_fires_exactly_once() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Dwell);
        let mut fired = Vec::new();
        let mut last_progress = 0.0;
        let mut now = Duration::ZERO;

        while now <= ms(1_100) {
            let before = selector.hover();
            if let Some(index) = selector.update(&FrameInput::hover(now, piano()), true, &catalog) {
                fired.push((index, now));
                assert_eq!(selector.hover(), HoverState::default());
            } else if before.candidate.is_some() {
                assert!(selector.hover().progress >= last_progress);
            }
            last_progress = selector.hover().progress;
            now += FRAME;
        }

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 0);
        assert!(fired[0].1 >= Duration::from_secs(1));
    }

    #[test]
    fn held_pointer_starts_a_fresh_dwell_after_firing() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Dwell);

        assert_eq!(selector.update(&FrameInput::hover(ms(0), piano()), true, &catalog), None);
        assert_eq!(selector.update(&FrameInput::hover(ms(1_000), piano()), true, &catalog), Some(0));
        assert_eq!(selector.update(&FrameInput::hover(ms(1_033), piano()), true, &catalog), None);
        assert_eq!(selector.hover().started_at, ms(1_033));
        assert_eq!(selector.update(&FrameInput::hover(ms(1_900), piano()), true, &catalog), None);
        assert_eq!(selector.update(&FrameInput::hover(ms(2_033), piano()), true, &catalog), Some(0));
    }

    #[test]
    fn switching_candidate_restarts_the_timer() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Dwell);

        selector.update(&FrameInput::hover(ms(0), piano()), true, &catalog);
        selector.update(&FrameInput::hover(ms(800), piano()), true, &catalog);
        assert!(selector.hover().progress > 0.7);

        assert_eq!(selector.update(&FrameInput::hover(ms(900), harp()), true, &catalog), None);
        let hover = selector.hover();
        assert_eq!(hover.candidate, Some(2));
        assert_eq!(hover.started_at, ms(900));
        assert_eq!(hover.progress, 0.0);

        assert_eq!(selector.update(&FrameInput::hover(ms(1_500), harp()), true, &catalog), None);
        assert_eq!(selector.update(&FrameInput::hover(ms(1_900), harp()), true, &catalog), Some(2));
    }

    #[test]
    fn losing_the_pointer_resets_hover() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Dwell);

        selector.update(&FrameInput::hover(ms(0), piano()), true, &catalog);
        selector.update(&FrameInput::hover(ms(500), piano()), true, &catalog);
        selector.update(&FrameInput::idle(ms(533)), true, &catalog);
        assert_eq!(selector.hover(), HoverState::default());

        selector.update(&FrameInput::hover(ms(600), piano()), true, &catalog);
        selector.update(&FrameInput::hover(ms(700), Point::new(5.0, 5.0)), true, &catalog);
        assert_eq!(selector.hover().candidate, None);
        assert_eq!(selector.hover().progress, 0.0);
    }

    #[test]
    fn inert_while_not_accepting_and_clears_stale_progress() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Dwell);

        selector.update(&FrameInput::hover(ms(0), piano()), true, &catalog);
        selector.update(&FrameInput::hover(ms(900), piano()), true, &catalog);
        assert_eq!(selector.update(&FrameInput::hover(ms(1_200), piano()), false, &catalog), None);
        assert_eq!(selector.hover(), HoverState::default());

        // Acceptance resumes: the dwell starts over instead of firing at once.
        assert_eq!(selector.update(&FrameInput::hover(ms(1_300), piano()), true, &catalog), None);
        assert_eq!(selector.hover().started_at, ms(1_300));
    }

    #[test]
    fn overlapping_zones_follow_nearest_then_catalog_order() {
        let catalog = InstrumentCatalog::new(vec![
            Instrument::new("Low", Point::new(0.0, 0.0)).with_radius(100.0),
            Instrument::new("High", Point::new(60.0, 0.0)).with_radius(100.0),
        ])
        .unwrap();
        let mut selector = selector(ControlMode::Dwell);

        selector.update(&FrameInput::hover(ms(0), Point::new(50.0, 0.0)), true, &catalog);
        assert_eq!(selector.hover().candidate, Some(1));

        selector.update(&FrameInput::hover(ms(10), Point::new(30.0, 0.0)), true, &catalog);
        assert_eq!(selector.hover().candidate, Some(0));
    }

    #[test]
    fn click_cooldown_drops_the_second_click() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Click);

        assert_eq!(selector.update(&FrameInput::click(ms(100), piano()), true, &catalog), Some(0));
        assert_eq!(selector.update(&FrameInput::click(ms(400), piano()), true, &catalog), None);
        assert_eq!(selector.update(&FrameInput::click(ms(600), harp()), true, &catalog), Some(2));
    }

    #[test]
    fn clicks_outside_instruments_or_without_edge_are_ignored() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Click);

        assert_eq!(
            selector.update(&FrameInput::click(ms(0), Point::new(5.0, 5.0)), true, &catalog),
            None
        );
        assert_eq!(selector.update(&FrameInput::hover(ms(10), piano()), true, &catalog), None);
        // A miss does not start the cooldown.
        assert_eq!(selector.update(&FrameInput::click(ms(20), piano()), true, &catalog), Some(0));
        assert_eq!(selector.hover(), HoverState::default());
    }

    #[test]
    fn click_mode_is_inert_while_not_accepting() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Click);
        assert_eq!(selector.update(&FrameInput::click(ms(0), piano()), false, &catalog), None);
        assert_eq!(selector.update(&FrameInput::click(ms(1), piano()), true, &catalog), Some(0));
    }

    #[test]
    fn reset_hover_state_is_idempotent() {
        let catalog = InstrumentCatalog::default();
        let mut selector = selector(ControlMode::Dwell);
        selector.update(&FrameInput::hover(ms(0), piano()), true, &catalog);
        selector.update(&FrameInput::hover(ms(300), piano()), true, &catalog);

        selector.reset_hover_state();
        let once = selector.hover();
        selector.reset_hover_state();
        assert_eq!(selector.hover(), once);
        assert_eq!(once.candidate, None);
        assert_eq!(once.progress, 0.0);
    }

    #[test]
    fn control_mode_accepts_legacy_names() {
        let hand: ControlMode = serde_json::from_str("\"hand\"").unwrap();
        let mouse: ControlMode = serde_json::from_str("\"mouse\"").unwrap();
        assert_eq!(hand, ControlMode::Dwell);
        assert_eq!(mouse, ControlMode::Click);
    }
}
