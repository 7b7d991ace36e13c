use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::Point;

/// Source of monotonic time for the tick loop. Sessions never read a clock
/// themselves; the driver samples one and passes the value in [`FrameInput`].
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock backed monotonic time, measured from construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for tests and scripted replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock to `time`. Earlier values are ignored so the clock
    /// never runs backwards.
    pub fn set(&self, time: Duration) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }

    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Immutable per-tick input snapshot delivered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub now: Duration,
    /// Fingertip or mouse position. `None` when tracking is lost or the
    /// pointer left the play area.
    pub cursor: Option<Point>,
    /// Edge-triggered: true only on the tick a click happened.
    pub clicked: bool,
}

impl FrameInput {
    /// A tick with no pointer at all.
    pub fn idle(now: Duration) -> Self {
        Self {
            now,
            cursor: None,
            clicked: false,
        }
    }

    pub fn hover(now: Duration, cursor: Point) -> Self {
        Self {
            now,
            cursor: Some(cursor),
            clicked: false,
        }
    }

    pub fn click(now: Duration, cursor: Point) -> Self {
        Self {
            now,
            cursor: Some(cursor),
            clicked: true,
        }
    }

    pub fn sample(clock: &impl Clock, cursor: Option<Point>, clicked: bool) -> Self {
        Self {
            now: clock.now(),
            cursor,
            clicked,
        }
    }
}
