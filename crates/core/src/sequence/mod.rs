use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{GameError, InstrumentCatalog, Result};

/// Longest sequence a round ever asks for.
pub const MAX_SEQUENCE_LEN: usize = 6;

/// Sequence length for a single-player level: `min(level + 1, 6)`.
pub fn sequence_length(level: u32) -> usize {
    (level.max(1) as usize + 1).min(MAX_SEQUENCE_LEN)
}

/// Ordered instrument indices a player has to reproduce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence(Vec<usize>);

impl Sequence {
    /// Builds a sequence from explicit indices, checking each against the
    /// catalog.
    pub fn from_indices(indices: Vec<usize>, catalog: &InstrumentCatalog) -> Result<Self> {
        if indices.is_empty() {
            return Err(GameError::invalid_input("a sequence needs at least one instrument"));
        }
        for &index in &indices {
            catalog.check_index(index)?;
        }
        Ok(Self(indices))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Instrument names joined with arrows, for log lines.
    pub fn describe(&self, catalog: &InstrumentCatalog) -> String {
        self.0
            .iter()
            .map(|&index| catalog.name(index).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Draws `sequence_length(level)` indices uniformly, with replacement, from
/// `[0, catalog_size)`.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, level: u32, catalog_size: usize) -> Sequence {
    let len = sequence_length(level);
    Sequence(
        (0..len)
            .map(|_| rng.random_range(0..catalog_size))
            .collect(),
    )
}

/// Owns the random source used to build each level's sequence.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    rng: ChaCha8Rng,
    catalog_size: usize,
}

impl SequenceGenerator {
    /// Seeded generators are reproducible; `None` draws a seed from the OS.
    pub fn new(catalog_size: usize, seed: Option<u64>) -> Result<Self> {
        if catalog_size == 0 {
            return Err(GameError::invalid_config(
                "cannot generate sequences from an empty catalog",
            ));
        }
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };
        Ok(Self { rng, catalog_size })
    }

    pub fn for_catalog(catalog: &InstrumentCatalog, seed: Option<u64>) -> Result<Self> {
        Self::new(catalog.len(), seed)
    }

    pub fn generate(&mut self, level: u32) -> Sequence {
        generate_with(&mut self.rng, level, self.catalog_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_follows_level_and_caps_at_six() {
        let mut generator = SequenceGenerator::new(6, Some(1)).unwrap();
        for level in 1..=12 {
            let sequence = generator.generate(level);
            assert_eq!(sequence.len(), (level as usize + 1).min(6));
            assert!(sequence.as_slice().iter().all(|&i| i < 6));
        }
    }

    #[test]
    fn level_zero_is_treated_as_level_one() {
        assert_eq!(sequence_length(0), 2);
        assert_eq!(sequence_length(1), 2);
        assert_eq!(sequence_length(5), 6);
        assert_eq!(sequence_length(40), 6);
    }

    #[test]
    fn same_seed_same_sequences() {
        let mut a = SequenceGenerator::new(6, Some(42)).unwrap();
        let mut b = SequenceGenerator::new(6, Some(42)).unwrap();
        for level in 1..=5 {
            assert_eq!(a.generate(level), b.generate(level));
        }
    }

    #[test]
    fn single_instrument_catalog_repeats_it() {
        let mut generator = SequenceGenerator::new(1, Some(3)).unwrap();
        assert_eq!(generator.generate(3).as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(SequenceGenerator::new(0, None).is_err());
    }

    #[test]
    fn from_indices_checks_catalog_range() {
        let catalog = InstrumentCatalog::default();
        assert!(Sequence::from_indices(vec![0, 5], &catalog).is_ok());
        assert!(matches!(
            Sequence::from_indices(vec![0, 6], &catalog),
            Err(GameError::InvalidInput(_))
        ));
        assert!(Sequence::from_indices(Vec::new(), &catalog).is_err());
    }

    #[test]
    fn describe_uses_instrument_names() {
        let catalog = InstrumentCatalog::default();
        let sequence = Sequence::from_indices(vec![0, 2], &catalog).unwrap();
        assert_eq!(sequence.describe(&catalog), "Piano -> Harp");
    }
}
