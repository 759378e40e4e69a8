use es_core::CoreError;
use es_envelope::EnvelopeError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("stop {index} at {position} m is outside the path (length {length} m)")]
    OutOfBounds {
        index:    usize,
        position: f64,
        length:   f64,
    },

    #[error("train cannot keep moving at {position} m (insufficient traction)")]
    ImpossibleSimulation { position: f64 },

    #[error("stop {index} at {position} m is reached at speed but got no braking curve")]
    MissingStopCurve { index: usize, position: f64 },

    #[error("max effort envelope jumps from {from} to {to} m/s at {position} m")]
    Discontinuity { position: f64, from: f64, to: f64 },

    #[error("ETCS braking curves requested for a rolling stock without ETCS brake parameters")]
    MissingEtcsParams,

    #[error("ETCS braking curve towards {position} m: {reason}")]
    EtcsCurve { position: f64, reason: &'static str },

    #[error("speed limit {index}: {reason}")]
    InvalidSpeedLimit { index: usize, reason: String },

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("input error: {0}")]
    Core(#[from] CoreError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
