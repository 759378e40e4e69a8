//! Engine configuration.
//!
//! Typically deserialized by the application (with the `serde` feature) and
//! turned into a [`SimContext`][crate::SimContext] plus the allowance
//! settings.

use crate::{CoreError, CoreResult};

// ── AllowanceConfig ───────────────────────────────────────────────────────────

/// Termination settings for the allowance search.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AllowanceConfig {
    /// Accepted gap between the reached and the requested running time, s.
    /// Default: 0.5.
    pub time_tolerance: f64,

    /// Bisection iterations allowed per search stage.  Default: 50.
    pub max_iterations: u32,
}

impl Default for AllowanceConfig {
    fn default() -> Self {
        Self {
            time_tolerance: 0.5,
            max_iterations: 50,
        }
    }
}

// ── EnvelopeSimConfig ─────────────────────────────────────────────────────────

/// Top-level engine configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvelopeSimConfig {
    /// Integration time step, s.  Default: 2.0.
    pub time_step: f64,

    pub allowance: AllowanceConfig,
}

impl Default for EnvelopeSimConfig {
    fn default() -> Self {
        Self {
            time_step: 2.0,
            allowance: AllowanceConfig::default(),
        }
    }
}

impl EnvelopeSimConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(CoreError::Config(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if !(self.allowance.time_tolerance.is_finite() && self.allowance.time_tolerance > 0.0) {
            return Err(CoreError::Config(format!(
                "allowance.time_tolerance must be positive, got {}",
                self.allowance.time_tolerance
            )));
        }
        if self.allowance.max_iterations == 0 {
            return Err(CoreError::Config("allowance.max_iterations must be at least 1".into()));
        }
        Ok(())
    }
}
