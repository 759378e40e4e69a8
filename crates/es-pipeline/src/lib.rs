//! `es-pipeline`: from speed limits and stops to a timed running profile.
//!
//! # Pipeline
//!
//! ```text
//! speed limits ──build_mrsp──▶ MRSP
//!   ──max_speed_envelope──▶ + braking curves (limit decreases, stops)
//!   ──max_effort_envelope──▶ + acceleration, speed holding
//!   ──apply_allowance──▶ + speed caps, coasting (extra running time)
//! ```
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`mrsp`]       | `SpeedLimit`, `build_mrsp`                             |
//! | [`max_speed`]  | `max_speed_envelope`, `increase` / `decrease`          |
//! | [`etcs`]       | ETCS indication curves at ends / limits of authority   |
//! | [`max_effort`] | `max_effort_envelope`                                  |
//! | [`coasting`]   | `coast_from_end`                                       |
//! | [`allowance`]  | `AllowanceValue`, `AllowanceRange`, `apply_allowance`  |
//! | [`batch`]      | `TrainJob`, `run_train`, `run_batch`                   |
//! | [`error`]      | `PipelineError`, `PipelineResult`                      |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                             |
//! |------------|----------------------------------------------------|
//! | `parallel` | `run_batch` runs trains on Rayon's thread pool.    |
//! | `serde`    | Serde derives on speed limits and allowances.      |
//!
//! All stages are pure functions of their inputs; the library logs through
//! the `log` facade and never installs a logger.

pub mod allowance;
pub mod batch;
pub mod coasting;
pub mod error;
pub mod etcs;
pub mod max_effort;
pub mod max_speed;
pub mod mrsp;


pub use allowance::{
    AllowanceDistribution, AllowanceError, AllowanceRange, AllowanceResult, AllowanceValue,
    apply_allowance,
};
pub use batch::{TrainJob, run_batch, run_train};
pub use coasting::coast_from_end;
pub use error::{PipelineError, PipelineResult};
pub use etcs::{EndOfAuthority, LimitOfAuthority};
pub use max_effort::max_effort_envelope;
pub use max_speed::max_speed_envelope;
pub use mrsp::{SpeedLimit, build_mrsp};
