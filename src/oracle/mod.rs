// fitbatch/src/oracle/mod.rs
//! Target-dimension suggestions from a free-text description
//! ("instagram story", "youtube thumbnail", ...).
//!
//! The oracle is a collaborator of the front end only. Nothing in the
//! processing pipeline calls it, and its failures never reach an item.

mod gemini;
mod presets;

pub use gemini::GeminiOracle;
pub use presets::PresetOracle;

use crate::core::MAX_DIMENSION;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSuggestion {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub reasoning: String,
}

impl DimensionSuggestion {
    pub fn new(width: i64, height: i64, reasoning: impl Into<String>) -> Result<Self, OracleError> {
        let valid = |v: i64| v > 0 && v <= MAX_DIMENSION as i64;
        if !valid(width) || !valid(height) {
            return Err(OracleError::InvalidSuggestion { width, height });
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            reasoning: reasoning.into(),
        })
    }
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No API key configured (set GEMINI_API_KEY or API_KEY)")]
    MissingKey,

    #[error("Service returned no suggestion")]
    EmptyResponse,

    #[error("Malformed suggestion: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Suggested dimensions {width}x{height} are not usable")]
    InvalidSuggestion { width: i64, height: i64 },

    #[error("No preset matches \"{0}\"")]
    NoMatch(String),
}

/// Something that can turn a description of a use case into a target size.
pub trait DimensionOracle: Send + Sync {
    fn suggest_dimensions(&self, query: &str) -> Result<DimensionSuggestion, OracleError>;
}

/// Asks `oracle` for new target dimensions, keeping `current` on any failure.
pub fn apply_suggestion(current: (u32, u32), oracle: &dyn DimensionOracle, query: &str) -> (u32, u32) {
    match oracle.suggest_dimensions(query) {
        Ok(suggestion) => {
            log::info!(
                "Suggested {}x{} for \"{}\": {}",
                suggestion.width,
                suggestion.height,
                query,
                suggestion.reasoning
            );
            (suggestion.width, suggestion.height)
        }
        Err(e) => {
            log::warn!(
                "Could not get a size suggestion for \"{}\", keeping {}x{}: {}",
                query,
                current.0,
                current.1,
                e
            );
            current
        }
    }
}
