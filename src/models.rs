//! Data models for sensor input at the service boundary.
//!
//! Incoming readings are typed but optional: each slot is a number, a piece of
//! text or nothing at all. Whether a slot is *valid* for its field is decided
//! later by [`crate::normalizer`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// Number of positional values in a sensor reading.
pub const SENSOR_FIELD_COUNT: usize = 6;

// ---

/// The six sensor fields, in their fixed positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorField {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    SoilFertility,
    Moisture,
}

impl SensorField {
    pub const ALL: [SensorField; SENSOR_FIELD_COUNT] = [
        SensorField::Nitrogen,
        SensorField::Phosphorus,
        SensorField::Potassium,
        SensorField::Temperature,
        SensorField::SoilFertility,
        SensorField::Moisture,
    ];

    /// Human-readable label used in prompts.
    pub fn label(self) -> &'static str {
        match self {
            SensorField::Nitrogen => "Nitrogen",
            SensorField::Phosphorus => "Phosphorus",
            SensorField::Potassium => "Potassium",
            SensorField::Temperature => "Temperature",
            SensorField::SoilFertility => "Soil Fertility",
            SensorField::Moisture => "Moisture",
        }
    }
}

/// Soil fertility class. The declaration order is the sampling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilFertility {
    Low,
    Medium,
    High,
}

impl SoilFertility {
    pub const ALL: [SoilFertility; 3] = [SoilFertility::Low, SoilFertility::Medium, SoilFertility::High];

    pub fn as_str(self) -> &'static str {
        match self {
            SoilFertility::Low => "Low",
            SoilFertility::Medium => "Medium",
            SoilFertility::High => "High",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == label)
    }
}

impl fmt::Display for SoilFertility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---

/// One untrusted slot of a raw sensor reading.
///
/// Numbers keep their integer/float identity so `45` and `25.0` render back
/// exactly as they were supplied.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SensorValue {
    Number(Number),
    Text(String),
    #[default]
    Absent,
}

impl SensorValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SensorValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Classify a single token of textual list input.
    ///
    /// Accepts JSON-style numbers, quoted strings, bare words and the empty
    /// markers `None`/`null`. Anything that looks like a nested structure is
    /// rejected; nothing is ever evaluated.
    pub fn from_literal(token: &str) -> Result<Self> {
        let token = token.trim();

        if token.chars().any(|c| "[]{}()".contains(c)) {
            return Err(Error::MalformedInputShape(format!(
                "nested literal `{token}` is not a scalar"
            )));
        }

        if token.is_empty() || token == "None" || token == "null" {
            return Ok(SensorValue::Absent);
        }

        if let Some(quote) = token.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let inner = token
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
                .filter(|inner| !inner.contains(quote))
                .ok_or_else(|| {
                    Error::MalformedInputShape(format!("badly quoted literal `{token}`"))
                })?;
            return Ok(SensorValue::Text(inner.to_string()));
        }

        if token.contains('"') || token.contains('\'') {
            return Err(Error::MalformedInputShape(format!(
                "badly quoted literal `{token}`"
            )));
        }

        match serde_json::from_str::<Number>(token) {
            Ok(n) => Ok(SensorValue::Number(n)),
            Err(_) => Ok(SensorValue::Text(token.to_string())),
        }
    }
}

impl From<Value> for SensorValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => SensorValue::Number(n),
            Value::String(s) => SensorValue::Text(s),
            // booleans and nested JSON are never valid for any field
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => SensorValue::Absent,
        }
    }
}

impl From<i64> for SensorValue {
    fn from(value: i64) -> Self {
        SensorValue::Number(value.into())
    }
}

impl From<f64> for SensorValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(SensorValue::Absent, SensorValue::Number)
    }
}

impl From<&str> for SensorValue {
    fn from(value: &str) -> Self {
        SensorValue::Text(value.to_string())
    }
}

impl<'de> Deserialize<'de> for SensorValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(SensorValue::from)
    }
}

// ---

/// Raw sensor data as received from a front-end, in positional order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSensorReading {
    #[serde(default)]
    pub nitrogen: SensorValue,
    #[serde(default)]
    pub phosphorus: SensorValue,
    #[serde(default)]
    pub potassium: SensorValue,
    #[serde(default)]
    pub temperature: SensorValue,
    #[serde(default)]
    pub soil_fertility: SensorValue,
    #[serde(default)]
    pub moisture: SensorValue,
}

impl RawSensorReading {
    /// Parse textual list input such as `"[45, -5, 30, 22.5, 'High', 60]"`.
    pub fn parse_literal(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .or_else(|| trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')))
            .unwrap_or(trimmed);

        if inner.trim().is_empty() {
            return Err(Error::wrong_count(0));
        }

        let mut tokens = split_top_level(inner)?;
        // a single trailing comma is tolerated, as in list literals
        if tokens.len() > 1 && tokens.last().is_some_and(|t| t.trim().is_empty()) {
            tokens.pop();
        }

        let values = tokens
            .iter()
            .map(|t| SensorValue::from_literal(t))
            .collect::<Result<Vec<_>>>()?;

        Self::try_from(values)
    }
}

impl TryFrom<Vec<SensorValue>> for RawSensorReading {
    type Error = Error;

    fn try_from(values: Vec<SensorValue>) -> Result<Self> {
        let [nitrogen, phosphorus, potassium, temperature, soil_fertility, moisture]: [SensorValue;
            SENSOR_FIELD_COUNT] = values
            .try_into()
            .map_err(|v: Vec<SensorValue>| Error::wrong_count(v.len()))?;

        Ok(RawSensorReading {
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            soil_fertility,
            moisture,
        })
    }
}

/// Split on commas that are not inside a quoted section.
fn split_top_level(input: &str) -> Result<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ',') => {
                tokens.push(&input[start..i]);
                start = i + 1;
            }
            (None, _) => {}
        }
    }

    if quote.is_some() {
        return Err(Error::MalformedInputShape("unterminated quote".to_string()));
    }
    tokens.push(&input[start..]);
    Ok(tokens)
}

// ---

/// A sensor reading whose every field satisfies its validity predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSensorReading {
    pub nitrogen: Number,
    pub phosphorus: Number,
    pub potassium: Number,
    pub temperature: Number,
    pub soil_fertility: SoilFertility,
    pub moisture: Number,

    /// Fields whose supplied value was replaced by a synthesized fallback.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub synthesized: Vec<SensorField>,
}

impl NormalizedSensorReading {
    pub fn is_synthesized(&self, field: SensorField) -> bool {
        self.synthesized.contains(&field)
    }
}
