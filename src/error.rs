use thiserror::Error;

/// Failures the scoring engine can report.
///
/// Missing data is never an error: absent indicators, absent reference
/// distributions and unknown sample sizes are handled by omission or by
/// capping confidence.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The caller asked for a preset that does not exist.
    #[error("Unknown weight preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },

    /// A preset carries a weight that cannot take part in a weighted average.
    #[error("Malformed weight preset '{name}': {reason}")]
    MalformedPreset { name: String, reason: String },

    /// Star thresholds are not a usable percentile ladder.
    #[error("Invalid star ladder: {0}")]
    InvalidStarLadder(String),
}
