use std::collections::HashSet;

use serde::Serialize;

use crate::{GameError, Result};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

/// Per-player scores in join order, plus the penalty points a creator has
/// earned during the round in progress.
#[derive(Debug, Clone)]
pub struct ScoreLedger {
    entries: Vec<ScoreEntry>,
    round_penalty: u32,
}

impl ScoreLedger {
    /// Requires 2 to 6 players with distinct, non-empty names.
    pub fn new<I, S>(players: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = players
            .into_iter()
            .map(|name| {
                let name: String = name.into();
                name.trim().to_string()
            })
            .collect();

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
            return Err(GameError::invalid_config(format!(
                "multiplayer needs {MIN_PLAYERS} to {MAX_PLAYERS} players, got {}",
                names.len()
            )));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(GameError::invalid_config("player names must not be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(GameError::invalid_config(format!(
                    "player `{name}` joined twice"
                )));
            }
        }

        Ok(Self {
            entries: names
                .into_iter()
                .map(|name| ScoreEntry { name, score: 0 })
                .collect(),
            round_penalty: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn name(&self, player: usize) -> &str {
        self.entries
            .get(player)
            .map(|entry| entry.name.as_str())
            .unwrap_or("?")
    }

    pub fn score(&self, player: usize) -> u32 {
        self.entries.get(player).map(|entry| entry.score).unwrap_or(0)
    }

    pub fn award(&mut self, player: usize, points: u32) {
        if let Some(entry) = self.entries.get_mut(player) {
            entry.score += points;
        }
    }

    pub fn round_penalty(&self) -> u32 {
        self.round_penalty
    }

    pub fn add_round_penalty(&mut self) {
        self.round_penalty += 1;
    }

    /// Credits the round's penalty points to `creator` and clears the
    /// accumulator. Returns the points credited.
    pub fn settle_round(&mut self, creator: usize) -> u32 {
        let points = std::mem::take(&mut self.round_penalty);
        self.award(creator, points);
        points
    }

    /// Scores from highest to lowest. Ties keep join order.
    pub fn ranking(&self) -> Vec<ScoreEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }
}
