//! Physical description of a train.

use crate::etcs::EtcsBrakeParams;
use crate::{CoreError, CoreResult};

/// Davis resistance formula: `R(v) = a + b·|v| + c·v²` (N).
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollingResistance {
    /// Constant term, N.
    pub a: f64,
    /// Linear term, N·s/m.
    pub b: f64,
    /// Quadratic term, N·s²/m².
    pub c: f64,
}

impl RollingResistance {
    #[inline]
    pub fn force(&self, speed: f64) -> f64 {
        let speed = speed.abs();
        self.a + self.b * speed + self.c * speed * speed
    }

    /// dR/dv, kg/s.
    #[inline]
    pub fn derivative(&self, speed: f64) -> f64 {
        self.b + 2.0 * self.c * speed.abs()
    }
}

/// Immutable train parameters consumed by the integrator.
///
/// All fields are `pub`; call [`RollingStock::validate`] once after
/// construction when the values come from outside the program.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollingStock {
    /// Mass, kg.
    pub mass: f64,
    /// Inertia, kg (usually `mass * inertia_coefficient`).
    pub inertia: f64,
    /// Length, m.
    pub length: f64,
    /// Maximum speed, m/s.
    pub max_speed: f64,
    pub resistance: RollingResistance,
    /// Constant braking deceleration magnitude, m/s².
    pub gamma: f64,
    pub etcs: Option<EtcsBrakeParams>,
}

impl RollingStock {
    pub fn validate(&self) -> CoreResult<()> {
        let positive = [
            ("mass", self.mass),
            ("inertia", self.inertia),
            ("max_speed", self.max_speed),
            ("gamma", self.gamma),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::Config(format!(
                    "rolling stock {name} must be finite and positive, got {value}"
                )));
            }
        }
        if !(self.length.is_finite() && self.length >= 0.0) {
            return Err(CoreError::Config(format!(
                "rolling stock length must be finite and non-negative, got {}",
                self.length
            )));
        }
        if let Some(etcs) = &self.etcs {
            let times = [
                ("t_traction_cut_off", etcs.t_traction_cut_off),
                ("t_bs1", etcs.t_bs1),
                ("t_bs2", etcs.t_bs2),
                ("t_be", etcs.t_be),
            ];
            for (name, value) in times {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(CoreError::Config(format!(
                        "ETCS {name} must be finite and non-negative, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resistance to movement at `speed`, N.
    #[inline]
    pub fn rolling_resistance(&self, speed: f64) -> f64 {
        self.resistance.force(speed)
    }

    #[inline]
    pub fn rolling_resistance_deriv(&self, speed: f64) -> f64 {
        self.resistance.derivative(speed)
    }

    /// The signed constant deceleration, m/s² (always ≤ 0).
    #[inline]
    pub fn deceleration(&self) -> f64 {
        -self.gamma
    }

    pub fn etcs_brake_params(&self) -> Option<&EtcsBrakeParams> {
        self.etcs.as_ref()
    }
}
