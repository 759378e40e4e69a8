//! `es-physics`: train motion integration.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`integrator`] | `Action`, `IntegrationStep`, RK4 `step`, forces, braking      |
//! | [`overlays`]   | `accelerate` / `maintain` / `decelerate` / `coast` loops      |
//!
//! The integrator is pure: it reads a [`SimContext`][es_core::SimContext]
//! and returns an [`IntegrationStep`].  The overlay loops drive a
//! [`ConstrainedPartBuilder`][es_envelope::ConstrainedPartBuilder] with
//! successive steps.
//!
//! # Contract violations
//!
//! Both panic with a descriptive message:
//!
//! - integrating at a position no effort curve covers;
//! - an ETCS braking policy for a rolling stock without ETCS parameters.

pub mod integrator;
pub mod overlays;

#[cfg(test)]
mod tests;

pub use integrator::{Action, IntegrationStep, newton_step, step, step_with_braking};
