use std::{path::Path, time::Duration};

use instrument_echo_core::{FrameInput, GameError, Point, Result};
use serde::Deserialize;

/// One recorded frame: time in seconds since the start, optional pointer
/// position and whether a click edge happened on this frame.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScriptFrame {
    pub t: f64,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub click: bool,
}

impl ScriptFrame {
    fn to_input(self) -> Result<FrameInput> {
        let now = Duration::try_from_secs_f64(self.t).map_err(|_| {
            GameError::invalid_input(format!(
                "frame time must be a non-negative number of seconds, got {}",
                self.t
            ))
        })?;
        let cursor = match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            (None, None) => None,
            _ => {
                return Err(GameError::invalid_input(format!(
                    "frame at {}s has only one coordinate",
                    self.t
                )))
            }
        };
        Ok(FrameInput {
            now,
            cursor,
            clicked: self.click,
        })
    }
}

/// Parses a JSON array of frames. Times must not go backwards.
pub fn parse(text: &str) -> Result<Vec<FrameInput>> {
    let frames: Vec<ScriptFrame> = serde_json::from_str(text)?;
    let mut inputs = Vec::with_capacity(frames.len());
    let mut last = Duration::ZERO;
    for frame in frames {
        let input = frame.to_input()?;
        if input.now < last {
            return Err(GameError::invalid_input(format!(
                "frame at {}s comes after a later frame",
                frame.t
            )));
        }
        last = input.now;
        inputs.push(input);
    }
    Ok(inputs)
}

pub fn load(path: &Path) -> Result<Vec<FrameInput>> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hover_click_and_idle_frames() {
        let frames = parse(
            r#"[
                { "t": 0.0 },
                { "t": 0.25, "x": 150, "y": 100 },
                { "t": 0.5, "x": 150, "y": 100, "click": true }
            ]"#,
        )
        .unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], FrameInput::idle(Duration::ZERO));
        assert_eq!(
            frames[1],
            FrameInput::hover(Duration::from_millis(250), Point::new(150.0, 100.0))
        );
        assert!(frames[2].clicked);
    }

    #[test]
    fn rejects_bad_frames() {
        assert!(parse(r#"[{ "t": -1 }]"#).is_err());
        assert!(matches!(
            parse(r#"[{ "t": 1e30 }]"#),
            Err(GameError::InvalidInput(_))
        ));
        assert!(parse(r#"[{ "t": 1, "x": 3 }]"#).is_err());
        assert!(parse(r#"[{ "t": 2 }, { "t": 1 }]"#).is_err());
        assert!(parse("not json").is_err());
    }
}
