use es_envelope::EnvelopeError;
use thiserror::Error;

use crate::PipelineError;

#[derive(Debug, Error, PartialEq)]
pub enum AllowanceError {
    /// The requested ranges or values are malformed.  Raised before any
    /// simulation runs.
    #[error("invalid allowance schedule: {0}")]
    InvalidSchedule(String),

    #[error(
        "allowance on [{begin}, {end}] cannot reach {target:.1} s (closest: {achieved:.1} s)"
    )]
    Unreachable {
        begin:    f64,
        end:      f64,
        target:   f64,
        achieved: f64,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
}

pub type AllowanceResult<T> = Result<T, AllowanceError>;
