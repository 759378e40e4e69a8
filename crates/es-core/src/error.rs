//! Input validation errors.
//!
//! Downstream crates wrap `CoreError` as one variant of their own error enum
//! via `#[from]`, so a malformed curve surfaces unchanged to the caller.

use thiserror::Error;

/// Errors raised while constructing physics inputs.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("tractive effort curve: {0}")]
    EffortCurve(String),

    #[error("effort curve map: interval [{begin}, {end}] {reason}")]
    EffortInterval {
        begin:  f64,
        end:    f64,
        reason: &'static str,
    },

    #[error("speed interval curve has {values} values for {boundaries} boundaries (expected boundaries + 1)")]
    IntervalCurveShape { boundaries: usize, values: usize },

    #[error("speed interval curve boundaries must be sorted ascending")]
    IntervalCurveOrder,

    #[error("ETCS application range [{begin}, {end}] is empty or not finite")]
    EtcsRange { begin: f64, end: f64 },

    #[error("grade profile: {0}")]
    GradeProfile(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `es-core` constructors.
pub type CoreResult<T> = Result<T, CoreError>;
