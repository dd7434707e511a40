//! Error taxonomy for team name resolution.
//!
//! Tier misses are not errors. Only the three outcomes below ever reach a
//! caller: malformed input, an unusable roster, and (in strict mode) a name
//! that matched nothing.

use thiserror::Error;

/// Errors surfaced by the normalizer's public API
#[derive(Debug, Error)]
pub enum NormalizerError {
    /// Caller input was empty, whitespace-only, or otherwise malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The roster cache could not produce a snapshot after bounded retries
    #[error("Roster data unavailable after {attempts} attempt(s): {source}")]
    DataUnavailable {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// Strict-mode no-match; carries the original raw input verbatim
    #[error("No match found for team: {0}")]
    UnknownTeam(String),
}

impl NormalizerError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        NormalizerError::InvalidInput(message.into())
    }

    /// True for errors that indicate a systemic problem rather than a single bad name
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, NormalizerError::DataUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, NormalizerError>;
