//! Curve construction errors.

use thiserror::Error;

/// Errors produced while building parts and envelopes.
#[derive(Debug, Error, PartialEq)]
pub enum EnvelopeError {
    #[error("envelope part needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("envelope part has {positions} positions but {values} {what}")]
    LengthMismatch {
        positions: usize,
        values:    usize,
        what:      &'static str,
    },

    #[error("envelope part positions must be strictly increasing (index {index}: {prev} then {next})")]
    NonIncreasingPositions { index: usize, prev: f64, next: f64 },

    #[error("envelope part speed at index {index} must be finite and non-negative, got {speed}")]
    InvalidSpeed { index: usize, speed: f64 },

    #[error("envelope part step {index} has zero speed at both ends")]
    ZeroSpeedStep { index: usize },

    #[error("envelope part step {index} has invalid duration {time}")]
    InvalidTime { index: usize, time: f64 },

    #[error("envelope has no parts")]
    Empty,

    #[error("envelope part {index} begins at {begin} but the previous part ends at {end}")]
    NotContiguous { index: usize, end: f64, begin: f64 },

    #[error("overlay [{begin}, {end}] overlaps the previous overlay (last position {last})")]
    OverlappingOverlay { begin: f64, end: f64, last: f64 },

    #[error("overlay [{begin}, {end}] is outside the base envelope [{base_begin}, {base_end}]")]
    OverlayOutOfRange {
        begin:      f64,
        end:        f64,
        base_begin: f64,
        base_end:   f64,
    },
}

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
