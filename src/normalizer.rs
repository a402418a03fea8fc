//! Sensor normalization with fallback synthesis.
//!
//! Every field is checked on its own. A value that fails its predicate is
//! replaced by a random value drawn from that field's fallback range, so the
//! downstream generation step always receives a complete reading.

use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Number;
use tracing::debug;

use crate::models::{
    NormalizedSensorReading, RawSensorReading, SensorField, SensorValue, SoilFertility,
};

/// Fallback generation ranges for the numeric fields (inclusive).
pub const RANGE_TABLE: [(SensorField, RangeInclusive<i64>); 5] = [
    (SensorField::Nitrogen, 20..=80),
    (SensorField::Phosphorus, 10..=60),
    (SensorField::Potassium, 10..=60),
    (SensorField::Temperature, 15..=35),
    (SensorField::Moisture, 30..=70),
];

/// Lookup into [`RANGE_TABLE`]; `None` for soil fertility.
pub fn fallback_range(field: SensorField) -> Option<RangeInclusive<i64>> {
    RANGE_TABLE
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, range)| range.clone())
}

// ---

/// Validity predicate for a numeric field.
pub fn is_valid_number(field: SensorField, value: f64) -> bool {
    match field {
        SensorField::Nitrogen | SensorField::Phosphorus | SensorField::Potassium => value >= 0.0,
        SensorField::Temperature => true,
        SensorField::Moisture => (0.0..=100.0).contains(&value),
        SensorField::SoilFertility => false,
    }
}

/// Normalize a raw reading, drawing fallbacks from `rng`.
///
/// Never fails: the six-slot shape is already guaranteed by
/// [`RawSensorReading`], and invalid values are replaced.
pub fn normalize<R: Rng>(raw: &RawSensorReading, rng: &mut R) -> NormalizedSensorReading {
    // ---
    let mut synthesized = Vec::new();

    let nitrogen = numeric(SensorField::Nitrogen, &raw.nitrogen, rng, &mut synthesized);
    let phosphorus = numeric(SensorField::Phosphorus, &raw.phosphorus, rng, &mut synthesized);
    let potassium = numeric(SensorField::Potassium, &raw.potassium, rng, &mut synthesized);
    let temperature = numeric(SensorField::Temperature, &raw.temperature, rng, &mut synthesized);
    let soil_fertility = fertility(&raw.soil_fertility, rng, &mut synthesized);
    let moisture = numeric(SensorField::Moisture, &raw.moisture, rng, &mut synthesized);

    NormalizedSensorReading {
        nitrogen,
        phosphorus,
        potassium,
        temperature,
        soil_fertility,
        moisture,
        synthesized,
    }
}

fn numeric<R: Rng>(
    field: SensorField,
    value: &SensorValue,
    rng: &mut R,
    synthesized: &mut Vec<SensorField>,
) -> Number {
    // ---
    if let SensorValue::Number(n) = value {
        if n.as_f64().is_some_and(|v| is_valid_number(field, v)) {
            return n.clone();
        }
    }

    let range = fallback_range(field).unwrap_or(0..=0);
    let fallback = rng.gen_range(range);
    debug!(field = field.label(), supplied = ?value, fallback, "substituting fallback value");
    synthesized.push(field);
    Number::from(fallback)
}

fn fertility<R: Rng>(
    value: &SensorValue,
    rng: &mut R,
    synthesized: &mut Vec<SensorField>,
) -> SoilFertility {
    // ---
    if let SensorValue::Text(label) = value {
        if let Some(fertility) = SoilFertility::from_label(label) {
            return fertility;
        }
    }

    let fallback = *SoilFertility::ALL
        .choose(rng)
        .unwrap_or(&SoilFertility::Medium);
    debug!(field = SensorField::SoilFertility.label(), supplied = ?value, %fallback, "substituting fallback value");
    synthesized.push(SensorField::SoilFertility);
    fallback
}
