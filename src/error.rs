//! Error taxonomy for the agronomy core.
//!
//! Field-level problems in sensor input never show up here: they are absorbed
//! by fallback synthesis in [`crate::normalizer`]. Only structural input
//! problems and boundary failures are surfaced to callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Sensor input did not consist of exactly six scalar values.
    #[error("malformed sensor input: expected six scalar values, {0}")]
    MalformedInputShape(String),

    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// Transport failure or non-success status from a remote service.
    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The generation service refused to answer because of its safety policy.
    #[error("generation service declined the request: {0}")]
    ContentBlocked(String),

    #[error("generation service returned no text")]
    EmptyResponse,
}

impl Error {
    /// Shape error for an input that held `found` values.
    pub fn wrong_count(found: usize) -> Self {
        Error::MalformedInputShape(format!("found {found}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
