//! Physical constants and numerical tolerances.
//!
//! The epsilons exist because converting back and forth between integrated
//! positions and stored samples routinely produces 1e-3 m noise.  Values
//! below them are snapped to zero by the integrator so that the noise cannot
//! drive the curve into spurious oscillation.

/// Gravity acceleration, m/s².
pub const GRAVITY_ACCELERATION: f64 = 9.81;

/// A position delta below this is considered zero (m).
pub const POSITION_EPSILON: f64 = 1e-2;

/// A speed below this is considered zero (m/s).
pub const SPEED_EPSILON: f64 = 1e-5;

/// An acceleration below this is considered zero (m/s²).
pub const ACCELERATION_EPSILON: f64 = 1e-5;

/// A time delta below this is considered zero (s).
pub const TIME_EPSILON: f64 = 1e-2;

/// Rotating mass share used for the gradient acceleration on rising grades, %.
pub const M_ROTATING_MAX: f64 = 15.0;

/// Rotating mass share used for the gradient acceleration on falling grades, %.
pub const M_ROTATING_MIN: f64 = 2.0;

/// National default value for available adhesion (ETCS safe braking).
pub const M_NVAVADH: f64 = 0.0;

/// Whether the speed measurement inaccuracy is ignored in the ETCS
/// intervention curves (Q_NVINHSMICPERM).
pub const Q_NVINHSMICPERM: bool = false;

/// Estimated acceleration while the brakes build up, m/s².
pub const A_EST2: f64 = 0.4;

/// Time between the warning and the brake intervention, s.
pub const T_WARNING: f64 = 2.0;

/// Driver reaction time, s.
pub const T_DRIVER: f64 = 4.0;

/// Speed margin over which the emergency brake intervention may be released
/// for a limit of authority, at low and high speed (m/s).
pub const DV_EBI_MIN: f64 = 7.5 / 3.6;
pub const DV_EBI_MAX: f64 = 15.0 / 3.6;
/// Speeds bounding the linear part of the intervention margin, m/s.
pub const V_EBI_MIN: f64 = 110.0 / 3.6;
pub const V_EBI_MAX: f64 = 210.0 / 3.6;

/// Speed measurement inaccuracy at low and high speed, m/s.
pub const V_URA_MIN: f64 = 2.0 / 3.6;
pub const V_URA_MAX: f64 = 12.0 / 3.6;
/// Speeds bounding the linear part of the measurement inaccuracy, m/s.
pub const V_URA_MIN_LIMIT: f64 = 30.0 / 3.6;
pub const V_URA_MAX_LIMIT: f64 = 500.0 / 3.6;

/// Upper bound on the speed gained between the emergency brake deceleration
/// and intervention curves, m/s.
pub const MAX_BEC_DELTA_SPEED: f64 = 50.0 / 3.6;

#[inline]
fn are_doubles_equal(a: f64, b: f64, delta: f64) -> bool {
    (a - b).abs() < delta
}

#[inline]
pub fn are_positions_equal(a: f64, b: f64) -> bool {
    are_doubles_equal(a, b, POSITION_EPSILON)
}

#[inline]
pub fn are_speeds_equal(a: f64, b: f64) -> bool {
    are_doubles_equal(a, b, SPEED_EPSILON)
}

#[inline]
pub fn are_accelerations_equal(a: f64, b: f64) -> bool {
    are_doubles_equal(a, b, ACCELERATION_EPSILON)
}

#[inline]
pub fn are_times_equal(a: f64, b: f64) -> bool {
    are_doubles_equal(a, b, TIME_EPSILON)
}

#[inline]
pub fn is_time_strictly_positive(time: f64) -> bool {
    time > TIME_EPSILON
}
