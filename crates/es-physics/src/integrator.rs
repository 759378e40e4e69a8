//! Force balance and Runge-Kutta stepping.
//!
//! # Step composition
//!
//! One call to [`step`] evaluates the acceleration four times:
//!
//! | Sub-step | Evaluated at                    | Duration    |
//! |----------|---------------------------------|-------------|
//! | k1       | `(x0, v0)`                      | `dt / 2`    |
//! | k2       | `(x0 + Δx1, v1)`                | `dt / 2`    |
//! | k3       | `(x0 + Δx2, v2)`                | `dt`        |
//! | k4       | `(x0 + Δx3, v3)`                | `dt`        |
//!
//! and applies the mean `(k1 + 2·k2 + 2·k3 + k4) / 6` in a single Newton
//! update from `(x0, v0)`.  Time is signed by the integration direction, so
//! integrating backward (`direction_sign = -1`) reconstructs where the train
//! came from.

use es_core::constants::{GRAVITY_ACCELERATION, POSITION_EPSILON, SPEED_EPSILON};
use es_core::etcs::gradient_acceleration;
use es_core::{BrakingType, EtcsBrakeParams, RollingStock, SimContext};

/// What the driver does during a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Full traction.
    Accelerate,
    /// Hold the current speed if traction allows.
    Maintain,
    /// Braking at the context's deceleration policy.
    Brake,
    /// No traction, no braking.
    Coast,
}

/// The result of one integration step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegrationStep {
    /// Elapsed time, s (never negative).
    pub time_delta:     f64,
    /// Signed displacement, m.
    pub position_delta: f64,
    pub start_speed:    f64,
    pub end_speed:      f64,
    /// Acceleration applied over the step, m/s².
    pub acceleration:   f64,
    /// `+1.0` or `-1.0`.
    pub direction_sign: f64,
}

impl IntegrationStep {
    /// Signed distance covered by the step.
    ///
    /// Equals `position_delta`, except when the displacement was snapped to
    /// zero while the speed still changed: then the unsnapped
    /// constant-acceleration distance is returned so callers keep advancing.
    pub fn displacement(&self) -> f64 {
        if self.position_delta != 0.0 || self.end_speed == self.start_speed {
            return self.position_delta;
        }
        0.5 * (self.start_speed + self.end_speed) * self.time_delta * self.direction_sign
    }
}

// ── Newton update ─────────────────────────────────────────────────────────────

/// Constant-acceleration update over `time_step`, signed by `direction_sign`.
///
/// Speeds below `SPEED_EPSILON` and displacements below `POSITION_EPSILON`
/// snap to zero.  A step whose speed would turn negative is cut at the
/// instant the train stops.
pub fn newton_step(
    time_step:      f64,
    speed:          f64,
    acceleration:   f64,
    direction_sign: f64,
) -> IntegrationStep {
    let mut time_delta = time_step;
    let mut signed_step = time_step.copysign(direction_sign);
    let mut end_speed = speed + acceleration * signed_step;
    if end_speed.abs() < SPEED_EPSILON {
        end_speed = 0.0;
    }
    if end_speed < 0.0 {
        time_delta = if acceleration != 0.0 { (speed / acceleration).abs() } else { 0.0 };
        signed_step = time_delta.copysign(direction_sign);
        end_speed = 0.0;
    }
    let mut position_delta = speed * signed_step + 0.5 * acceleration * signed_step * signed_step;
    if position_delta.abs() < POSITION_EPSILON {
        position_delta = 0.0;
    }
    IntegrationStep {
        time_delta,
        position_delta,
        start_speed: speed,
        end_speed,
        acceleration,
        direction_sign,
    }
}

// ── Forces ────────────────────────────────────────────────────────────────────

/// Tail and head positions of a train whose head is at `head`, clamped to
/// the path.
fn train_extent(ctx: &SimContext<'_>, head: f64) -> (f64, f64) {
    let length = ctx.path_length();
    let tail = (head - ctx.rolling_stock.length).clamp(0.0, length);
    (tail, head.clamp(0.0, length))
}

/// Average grade under the train, m/km.
pub fn average_grade(ctx: &SimContext<'_>, head: f64) -> f64 {
    let (tail, head) = train_extent(ctx, head);
    ctx.path.average_grade(tail, head)
}

/// Lowest grade under the train, m/km.
pub fn min_grade(ctx: &SimContext<'_>, head: f64) -> f64 {
    let (tail, head) = train_extent(ctx, head);
    ctx.path.min_grade(tail, head)
}

/// Gravity component along a track of `grade` (m/km), N.
pub fn grade_weight_force(rolling_stock: &RollingStock, grade: f64) -> f64 {
    let angle = (grade / 1000.0).atan();
    -rolling_stock.mass * GRAVITY_ACCELERATION * angle.sin()
}

/// Gravity component along the track, N.  Negative on rising grades.
pub fn weight_force(ctx: &SimContext<'_>, head: f64) -> f64 {
    grade_weight_force(ctx.rolling_stock, average_grade(ctx, head))
}

/// Net acceleration from traction, weight and rolling resistance.
///
/// A train standing still and integrated forward only starts moving once
/// traction plus weight overcomes the resistance.
pub fn compute_acceleration(
    rolling_stock:  &RollingStock,
    resistance:     f64,
    weight:         f64,
    speed:          f64,
    traction:       f64,
    direction_sign: f64,
) -> f64 {
    let driving = traction + weight;
    if speed == 0.0 && direction_sign > 0.0 {
        if driving.abs() < resistance {
            return 0.0;
        }
    }
    (driving - resistance) / rolling_stock.inertia
}

fn etcs_params<'a>(ctx: &SimContext<'a>) -> &'a EtcsBrakeParams {
    ctx.rolling_stock.etcs_brake_params().unwrap_or_else(|| {
        panic!("ETCS braking requested for a rolling stock without ETCS brake parameters")
    })
}

/// Signed braking deceleration (≤ 0 on level track) under `braking_type`.
pub fn braking_deceleration(
    ctx:          &SimContext<'_>,
    position:     f64,
    speed:        f64,
    braking_type: BrakingType,
) -> f64 {
    match braking_type {
        BrakingType::Constant => ctx.rolling_stock.deceleration(),
        BrakingType::EtcsEbd => {
            let grade = min_grade(ctx, position);
            -etcs_params(ctx).safe_braking_acceleration(speed) + gradient_acceleration(grade)
        }
        BrakingType::EtcsSbd => {
            let grade = min_grade(ctx, position);
            -etcs_params(ctx).service_braking_acceleration(speed) + gradient_acceleration(grade)
        }
        BrakingType::EtcsGui => {
            let grade = min_grade(ctx, position);
            let params = etcs_params(ctx);
            -params.normal_service_braking_acceleration(speed)
                + gradient_acceleration(grade)
                + params.gradient_acceleration_correction(grade, speed)
        }
    }
}

/// Acceleration for `action` at `(position, speed)`.
pub fn action_acceleration(
    ctx:            &SimContext<'_>,
    position:       f64,
    speed:          f64,
    action:         Action,
    direction_sign: f64,
    braking_type:   BrakingType,
) -> f64 {
    if action == Action::Brake {
        return braking_deceleration(ctx, position, speed, braking_type);
    }
    let rolling_stock = ctx.rolling_stock;
    let curve = ctx.effort_curve_at(position);
    let resistance = rolling_stock.rolling_resistance(speed);
    let weight = weight_force(ctx, position);
    let max_traction = curve.max_effort(speed);

    let traction = match action {
        Action::Accelerate => max_traction,
        // Enough traction to cancel resistance and weight: hold the speed.
        Action::Maintain if resistance - weight <= max_traction => return 0.0,
        Action::Maintain => max_traction,
        Action::Coast | Action::Brake => 0.0,
    };
    compute_acceleration(rolling_stock, resistance, weight, speed, traction, direction_sign)
}

// ── Runge-Kutta step ──────────────────────────────────────────────────────────

/// One RK4 step with the context's braking policy.
pub fn step(
    ctx:            &SimContext<'_>,
    position:       f64,
    speed:          f64,
    action:         Action,
    direction_sign: f64,
) -> IntegrationStep {
    step_with_braking(ctx, position, speed, action, direction_sign, ctx.braking_type)
}

/// One RK4 step with an explicit braking policy.
pub fn step_with_braking(
    ctx:            &SimContext<'_>,
    position:       f64,
    speed:          f64,
    action:         Action,
    direction_sign: f64,
    braking_type:   BrakingType,
) -> IntegrationStep {
    let time_step = ctx.time_step;
    let half_step = time_step / 2.0;
    let naive = |dt: f64, x: f64, v: f64| {
        let a = action_acceleration(ctx, x, v, action, direction_sign, braking_type);
        newton_step(dt, v, a, direction_sign)
    };

    let s1 = naive(half_step, position, speed);
    let s2 = naive(half_step, position + s1.position_delta, s1.end_speed);
    let s3 = naive(time_step, position + s2.position_delta, s2.end_speed);
    let s4 = naive(time_step, position + s3.position_delta, s3.end_speed);
    let mean = (s1.acceleration + 2.0 * s2.acceleration + 2.0 * s3.acceleration + s4.acceleration)
        / 6.0;
    newton_step(time_step, speed, mean, direction_sign)
}
