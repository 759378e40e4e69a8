//! ETCS braking parameters and the braking policy selector.
//!
//! Formulas follow ERA SUBSET-026 v4.0.0 (§3.13.6) and SUBSET-041 v4.0.0.
//! Deceleration curves are stored as positive magnitudes; the integrator
//! negates them.

use crate::constants::{
    DV_EBI_MAX, DV_EBI_MIN, GRAVITY_ACCELERATION, M_NVAVADH, M_ROTATING_MAX, M_ROTATING_MIN,
    Q_NVINHSMICPERM, V_EBI_MAX, V_EBI_MIN, V_URA_MAX, V_URA_MAX_LIMIT, V_URA_MIN, V_URA_MIN_LIMIT,
};
use crate::{CoreError, CoreResult};

// ── BrakingType ───────────────────────────────────────────────────────────────

/// Deceleration policy used when integrating with `Action::Brake`.
///
/// Matched exhaustively by the integrator: adding a variant is a compile
/// error until every consumer handles it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BrakingType {
    /// The rolling stock's constant deceleration.
    #[default]
    Constant,
    /// ETCS emergency brake deceleration (§3.13.6.2.1.3).
    EtcsEbd,
    /// ETCS service brake deceleration (§3.13.6.3.1.3).
    EtcsSbd,
    /// ETCS guidance curve, normal service deceleration (§3.13.6.4.3).
    EtcsGui,
}

impl BrakingType {
    pub fn is_etcs(self) -> bool {
        !matches!(self, BrakingType::Constant)
    }
}

/// Gradient acceleration (m/s²) taking rotating mass into account.
///
/// `grade` is in m/km.  The rotating mass share differs by grade sign, as in
/// the ERA braking curves simulation tool.
pub fn gradient_acceleration(grade: f64) -> f64 {
    let m_rotating = if grade >= 0.0 { M_ROTATING_MAX } else { M_ROTATING_MIN };
    -GRAVITY_ACCELERATION * grade / (1000.0 + 10.0 * m_rotating)
}

/// `low_value` up to `low_speed`, `high_value` from `high_speed`, linear in
/// between.
fn interpolate_linear_speed(
    speed:      f64,
    low_speed:  f64,
    high_speed: f64,
    low_value:  f64,
    high_value: f64,
) -> f64 {
    if speed <= low_speed {
        low_value
    } else if speed < high_speed {
        (high_value - low_value) / (high_speed - low_speed) * (speed - low_speed) + low_value
    } else {
        high_value
    }
}

/// Speed measurement inaccuracy, §3.13.9.3.2.10.
pub fn v_ura(speed: f64) -> f64 {
    interpolate_linear_speed(speed, V_URA_MIN_LIMIT, V_URA_MAX_LIMIT, V_URA_MIN, V_URA_MAX)
}

/// Speed inaccuracy taken into account by the intervention curves.
pub fn v_delta0(speed: f64) -> f64 {
    if Q_NVINHSMICPERM { 0.0 } else { v_ura(speed) }
}

/// Margin between a limit of authority's speed and the speed at which the
/// emergency brake deceleration curve crosses it, §3.13.9.3.1.
pub fn dv_ebi(speed: f64) -> f64 {
    interpolate_linear_speed(speed, V_EBI_MIN, V_EBI_MAX, DV_EBI_MIN, DV_EBI_MAX)
}

// ── SpeedIntervalCurve ────────────────────────────────────────────────────────

/// A step function of speed.
///
/// `boundaries` (m/s, ascending) split `[0, ∞)` into `boundaries.len() + 1`
/// intervals; `values[i]` applies to the interval ending at `boundaries[i]`
/// (inclusive), the last value to everything above the last boundary.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedIntervalCurve {
    boundaries: Vec<f64>,
    values:     Vec<f64>,
}

impl SpeedIntervalCurve {
    pub fn new(boundaries: Vec<f64>, values: Vec<f64>) -> CoreResult<Self> {
        if values.len() != boundaries.len() + 1 {
            return Err(CoreError::IntervalCurveShape {
                boundaries: boundaries.len(),
                values:     values.len(),
            });
        }
        if boundaries.windows(2).any(|w| w[0] > w[1]) {
            return Err(CoreError::IntervalCurveOrder);
        }
        Ok(Self { boundaries, values })
    }

    /// A curve with the same value at every speed.
    pub fn constant(value: f64) -> Self {
        Self { boundaries: Vec::new(), values: vec![value] }
    }

    /// Value of the interval containing `|speed|`.
    ///
    /// Boundaries are evaluated in ascending order and the first one with
    /// `|speed| <= boundary` selects the interval.
    pub fn value(&self, speed: f64) -> f64 {
        let speed = speed.abs();
        let index = self
            .boundaries
            .iter()
            .position(|&b| speed <= b)
            .unwrap_or(self.boundaries.len());
        self.values[index]
    }
}

// ── EtcsBrakeParams ───────────────────────────────────────────────────────────

/// Braking parameters for ETCS level 2.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EtcsBrakeParams {
    /// A_brake_emergency (m/s², > 0).
    pub gamma_emergency: SpeedIntervalCurve,
    /// A_brake_service (m/s², > 0).
    pub gamma_service: SpeedIntervalCurve,
    /// A_brake_normal_service, used by the guidance curve (m/s², > 0).
    pub gamma_normal_service: SpeedIntervalCurve,
    /// Kdry_rst, emergency deceleration correction on dry rails, in [0, 1].
    pub k_dry: SpeedIntervalCurve,
    /// Kwet_rst, emergency deceleration correction on wet rails, in [0, 1].
    pub k_wet: SpeedIntervalCurve,
    /// Kn+, normal service correction on rising grades (m/s²).
    pub k_n_pos: SpeedIntervalCurve,
    /// Kn-, normal service correction on falling grades (m/s²).
    pub k_n_neg: SpeedIntervalCurve,
    /// T_traction_cut_off, time to cut traction after an intervention, s.
    pub t_traction_cut_off: f64,
    /// T_bs1, service brake build up time used for the indication curve, s.
    pub t_bs1: f64,
    /// T_bs2, service brake build up time used for the intervention curve, s.
    pub t_bs2: f64,
    /// T_be, emergency brake build up time, s.
    pub t_be: f64,
}

impl EtcsBrakeParams {
    /// Safe emergency braking deceleration, §3.13.6.2.1.4.
    pub fn safe_braking_acceleration(&self, speed: f64) -> f64 {
        let a_brake_emergency = self.gamma_emergency.value(speed);
        let k_dry = self.k_dry.value(speed);
        let k_wet = self.k_wet.value(speed);
        k_dry * (k_wet + M_NVAVADH * (1.0 - k_wet)) * a_brake_emergency
    }

    pub fn service_braking_acceleration(&self, speed: f64) -> f64 {
        self.gamma_service.value(speed)
    }

    pub fn normal_service_braking_acceleration(&self, speed: f64) -> f64 {
        self.gamma_normal_service.value(speed)
    }

    /// Gradient correction using the on-board factors kN+ and kN-,
    /// §3.13.6.4.2–3.
    pub fn gradient_acceleration_correction(&self, grade: f64, speed: f64) -> f64 {
        let k = if grade >= 0.0 {
            self.k_n_pos.value(speed)
        } else {
            self.k_n_neg.value(speed)
        };
        -k * grade / 1000.0
    }
}

// ── EtcsContext ───────────────────────────────────────────────────────────────

/// Where on the path ETCS braking curves replace constant deceleration.
///
/// Ranges are closed, `[begin, end]` in metres from the path start, and may
/// be given in any order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EtcsContext {
    application_ranges: Vec<(f64, f64)>,
}

impl EtcsContext {
    pub fn new(application_ranges: Vec<(f64, f64)>) -> CoreResult<Self> {
        if let Some(&(begin, end)) = application_ranges
            .iter()
            .find(|&&(begin, end)| !(begin.is_finite() && end.is_finite() && begin <= end))
        {
            return Err(CoreError::EtcsRange { begin, end });
        }
        Ok(Self { application_ranges })
    }

    pub fn application_ranges(&self) -> &[(f64, f64)] {
        &self.application_ranges
    }

    /// Whether `position` lies in an application range.
    pub fn contains(&self, position: f64) -> bool {
        self.application_ranges
            .iter()
            .any(|&(begin, end)| begin <= position && position <= end)
    }
}
