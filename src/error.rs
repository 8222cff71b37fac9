//! Simulation error types
//!
//! The core degrades instead of failing: most paths return `bool` or `Option`
//! and log. `SimError` is used where a caller can usefully react, such as a
//! rejected transition or a malformed preset name.

use thiserror::Error;

use crate::sim::GamePhase;

#[derive(Debug, Error)]
pub enum SimError {
    /// Transition not present in the state machine whitelist
    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition { from: GamePhase, to: GamePhase },

    /// Difficulty preset name did not match any known preset
    #[error("unknown difficulty preset '{0}'")]
    UnknownPreset(String),

    /// A physics parameter violated its invariant
    #[error("parameter '{name}' = {value} is outside its valid range ({expected})")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },

    /// A registered callback reported a failure
    #[error("callback failed: {0}")]
    Callback(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

/// Returns an error if `value` is not strictly positive.
pub fn require_positive(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            expected: "> 0",
        })
    }
}

/// Returns an error if `value` is not strictly negative.
pub fn require_negative(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value < 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            expected: "< 0",
        })
    }
}
