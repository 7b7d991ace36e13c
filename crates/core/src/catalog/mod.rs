use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// Default activation radius of an instrument hit-zone, in pixels.
pub const DEFAULT_RADIUS: f32 = 40.0;
pub const MIN_RADIUS: f32 = 10.0;
pub const MAX_RADIUS: f32 = 150.0;

/// Cursor or instrument position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A named hit-target on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub position: Point,
    #[serde(default = "default_radius")]
    pub radius: f32,
}

fn default_radius() -> f32 {
    DEFAULT_RADIUS
}

impl Instrument {
    pub fn new(name: impl Into<String>, position: Point) -> Self {
        Self {
            name: name.into(),
            position,
            radius: DEFAULT_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Distance from `point` to the centre when the point lies inside the zone.
    pub fn reach(&self, point: Point) -> Option<f32> {
        let distance = self.position.distance(point);
        (distance <= self.radius).then_some(distance)
    }
}

/// Ordered list of instruments. An instrument's index is its position here,
/// and that order breaks ties between overlapping zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    instruments: Vec<Instrument>,
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        Self {
            instruments: vec![
                Instrument::new("Piano", Point::new(150.0, 100.0)),
                Instrument::new("Trumpet", Point::new(400.0, 150.0)),
                Instrument::new("Harp", Point::new(550.0, 120.0)),
                Instrument::new("Guitar", Point::new(200.0, 300.0)),
                Instrument::new("Drums", Point::new(500.0, 350.0)),
                Instrument::new("Flute", Point::new(350.0, 250.0)),
            ],
        }
    }
}

impl InstrumentCatalog {
    pub fn new(instruments: Vec<Instrument>) -> Result<Self> {
        let catalog = Self { instruments };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads a catalog stored as a JSON array of instruments.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let instruments: Vec<Instrument> = serde_json::from_str(&text)?;
        Self::new(instruments)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instrument> {
        self.instruments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.get(index).map(|instrument| instrument.name.as_str())
    }

    /// Fails with [`GameError::InvalidInput`] when `index` is not in the catalog.
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.instruments.len() {
            Ok(())
        } else {
            Err(GameError::invalid_input(format!(
                "instrument index {index} is outside the catalog of {} instruments",
                self.instruments.len()
            )))
        }
    }

    /// Nearest instrument whose zone contains `point`. Equal distances resolve
    /// to the earlier catalog entry.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (index, instrument) in self.instruments.iter().enumerate() {
            if let Some(distance) = instrument.reach(point) {
                match best {
                    Some((_, best_distance)) if distance >= best_distance => {}
                    _ => best = Some((index, distance)),
                }
            }
        }
        best.map(|(index, _)| index)
    }

    /// Sets one zone's radius, clamped to [`MIN_RADIUS`, `MAX_RADIUS`].
    /// Returns the radius actually applied.
    pub fn set_radius(&mut self, index: usize, radius: f32) -> Result<f32> {
        self.check_index(index)?;
        if !radius.is_finite() {
            return Err(GameError::invalid_input("radius must be finite"));
        }
        let clamped = radius.clamp(MIN_RADIUS, MAX_RADIUS);
        self.instruments[index].radius = clamped;
        Ok(clamped)
    }

    pub fn scale_radii(&mut self, factor: f32) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(GameError::invalid_input(format!(
                "zone scale factor must be positive, got {factor}"
            )));
        }
        for instrument in &mut self.instruments {
            instrument.radius = (instrument.radius * factor).clamp(MIN_RADIUS, MAX_RADIUS);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(GameError::invalid_config("catalog needs at least one instrument"));
        }
        for instrument in &self.instruments {
            if instrument.name.trim().is_empty() {
                return Err(GameError::invalid_config("instrument names must not be empty"));
            }
            if !instrument.radius.is_finite() || instrument.radius <= 0.0 {
                return Err(GameError::invalid_config(format!(
                    "instrument `{}` has a non-positive radius",
                    instrument.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlapping() -> InstrumentCatalog {
        InstrumentCatalog::new(vec![
            Instrument::new("Left", Point::new(0.0, 0.0)).with_radius(60.0),
            Instrument::new("Right", Point::new(50.0, 0.0)).with_radius(60.0),
        ])
        .unwrap()
    }

    #[test]
    fn hit_test_finds_instrument_under_cursor() {
        let catalog = InstrumentCatalog::default();
        assert_eq!(catalog.hit_test(Point::new(155.0, 95.0)), Some(0));
        assert_eq!(catalog.hit_test(Point::new(350.0, 250.0)), Some(5));
        assert_eq!(catalog.hit_test(Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn zone_edge_counts_as_inside() {
        let catalog = InstrumentCatalog::default();
        assert_eq!(catalog.hit_test(Point::new(190.0, 100.0)), Some(0));
        assert_eq!(catalog.hit_test(Point::new(190.5, 100.0)), None);
    }

    #[test]
    fn overlapping_zones_prefer_the_nearest_centre() {
        let catalog = overlapping();
        assert_eq!(catalog.hit_test(Point::new(10.0, 0.0)), Some(0));
        assert_eq!(catalog.hit_test(Point::new(40.0, 0.0)), Some(1));
    }

    #[test]
    fn overlapping_zones_tie_on_catalog_order() {
        let catalog = overlapping();
        assert_eq!(catalog.hit_test(Point::new(25.0, 10.0)), Some(0));
    }

    #[test]
    fn check_index_rejects_out_of_range() {
        let catalog = InstrumentCatalog::default();
        assert!(catalog.check_index(5).is_ok());
        let err = catalog.check_index(6).unwrap_err();
        assert!(matches!(err, GameError::InvalidInput(_)));
    }

    #[test]
    fn radius_adjustments_are_clamped() {
        let mut catalog = InstrumentCatalog::default();
        assert_eq!(catalog.set_radius(2, 500.0).unwrap(), MAX_RADIUS);
        assert_eq!(catalog.set_radius(2, 1.0).unwrap(), MIN_RADIUS);

        catalog.scale_radii(2.0).unwrap();
        assert_eq!(catalog.get(0).unwrap().radius, 80.0);
        assert_eq!(catalog.get(2).unwrap().radius, 20.0);
        assert!(catalog.scale_radii(0.0).is_err());
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(InstrumentCatalog::new(Vec::new()).is_err());
    }

    #[test]
    fn loads_catalog_from_json_with_default_radius() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{ "name": "Bell", "position": { "x": 10.0, "y": 20.0 } }]"#,
        )
        .unwrap();

        let catalog = InstrumentCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.name(0), Some("Bell"));
        assert_eq!(catalog.get(0).unwrap().radius, DEFAULT_RADIUS);
    }
}
