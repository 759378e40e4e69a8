//! `es-core`: physics inputs for the `envsim` running-time engine.
//!
//! Every other `es-*` crate depends on this one.  It has no `es-*`
//! dependencies and minimal external ones (`thiserror`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module            | Contents                                                 |
//! |-------------------|----------------------------------------------------------|
//! | [`constants`]     | Gravity, numerical epsilons, comparison helpers          |
//! | [`effort`]        | `TractiveEffortCurve`, `EffortCurveMap`                  |
//! | [`etcs`]          | `EtcsBrakeParams`, `EtcsContext`, `BrakingType`          |
//! | [`rolling_stock`] | `RollingStock`, `RollingResistance`                      |
//! | [`path`]          | `PhysicsPath` trait, `GradeProfile`, `FlatPath`          |
//! | [`context`]       | `SimContext`, the value threaded through every stage     |
//! | [`config`]        | `EnvelopeSimConfig`, `AllowanceConfig`                   |
//! | [`error`]         | `CoreError`, `CoreResult`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to input and config types.  |
//!
//! # Units
//!
//! Positions are metres from the path start, speeds m/s, times seconds,
//! forces newtons, grades m/km.

pub mod config;
pub mod constants;
pub mod context;
pub mod effort;
pub mod error;
pub mod etcs;
pub mod path;
pub mod rolling_stock;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{AllowanceConfig, EnvelopeSimConfig};
pub use context::SimContext;
pub use effort::{EffortCurveMap, TractiveEffortCurve, TractiveEffortPoint};
pub use error::{CoreError, CoreResult};
pub use etcs::{BrakingType, EtcsBrakeParams, EtcsContext, SpeedIntervalCurve};
pub use path::{FlatPath, GradeProfile, PhysicsPath};
pub use rolling_stock::{RollingResistance, RollingStock};
