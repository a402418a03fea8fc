//! Plant disease diagnosis and crop recommendation backend.
//!
//! Sensor readings are normalized (invalid values replaced by plausible
//! fallbacks), folded into a prompt and sent to a hosted text-generation
//! service. Leaf images are optionally annotated by a detection service and
//! diagnosed the same way.

pub mod advisor;
pub mod client;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod prompt;
pub mod routes;

#[cfg(test)]
mod test_support;

pub use advisor::{Advisor, Diagnosis, Recommendation};
pub use client::{GeminiClient, ImageAttachment, TextGenerator};
pub use config::Config;
pub use detection::{HttpDetector, LeafDetector};
pub use error::Error;
pub use models::{NormalizedSensorReading, RawSensorReading, SensorField, SensorValue, SoilFertility};
