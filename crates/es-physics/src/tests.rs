//! Unit tests for es-physics.

use approx::{assert_abs_diff_eq, assert_relative_eq};

use es_core::{
    BrakingType, EffortCurveMap, EtcsBrakeParams, FlatPath, GradeProfile, RollingResistance,
    RollingStock, SimContext, SpeedIntervalCurve, TractiveEffortCurve,
};
use es_envelope::{ConstrainedPartBuilder, PartConstraint, PartKind};

use crate::integrator::{
    action_acceleration, braking_deceleration, compute_acceleration, weight_force,
};
use crate::{Action, newton_step, overlays, step};

// ── Helpers ───────────────────────────────────────────────────────────────────

const LENGTH: f64 = 10_000.0;

fn stock(resistance: RollingResistance) -> RollingStock {
    RollingStock {
        mass:       400_000.0,
        inertia:    420_000.0,
        length:     200.0,
        max_speed:  44.0,
        resistance,
        gamma:      0.5,
        etcs:       None,
    }
}

fn frictionless() -> RollingStock {
    stock(RollingResistance::default())
}

fn constant_drag() -> RollingStock {
    stock(RollingResistance { a: 4_000.0, b: 0.0, c: 0.0 })
}

/// 42 kN everywhere: 0.1 m/s² for the test inertia.
fn curves() -> EffortCurveMap {
    EffortCurveMap::single(LENGTH, TractiveEffortCurve::constant(42_000.0))
}

fn etcs_params() -> EtcsBrakeParams {
    EtcsBrakeParams {
        gamma_emergency:      SpeedIntervalCurve::constant(1.0),
        gamma_service:        SpeedIntervalCurve::constant(0.8),
        gamma_normal_service: SpeedIntervalCurve::constant(0.6),
        k_dry:                SpeedIntervalCurve::constant(0.9),
        k_wet:                SpeedIntervalCurve::constant(0.5),
        k_n_pos:              SpeedIntervalCurve::constant(2.0),
        k_n_neg:              SpeedIntervalCurve::constant(3.0),
        t_traction_cut_off:   3.0,
        t_bs1:                1.5,
        t_bs2:                1.5,
        t_be:                 2.0,
    }
}

// ── Newton update ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod newton {
    use super::*;

    #[test]
    fn forward_and_backward() {
        let s = newton_step(2.0, 10.0, 1.0, 1.0);
        assert_eq!(s.end_speed, 12.0);
        assert_eq!(s.position_delta, 22.0);
        assert_eq!(s.time_delta, 2.0);

        // Backward braking: speed grows as the position decreases.
        let s = newton_step(2.0, 0.0, -0.5, -1.0);
        assert_eq!(s.end_speed, 1.0);
        assert_eq!(s.position_delta, -1.0);
        assert_eq!(s.time_delta, 2.0);
    }

    #[test]
    fn truncated_at_stop() {
        let s = newton_step(2.0, 1.0, -1.0, 1.0);
        assert_eq!(s.end_speed, 0.0);
        assert_eq!(s.time_delta, 1.0);
        assert_eq!(s.position_delta, 0.5);
    }

    #[test]
    fn tiny_values_snap_to_zero() {
        let s = newton_step(1.0, 0.0, 0.001, 1.0);
        assert_eq!(s.position_delta, 0.0);
        let s = newton_step(1.0, 1e-6, 0.0, 1.0);
        assert_eq!(s.end_speed, 0.0);
    }

    #[test]
    fn snapped_displacement_keeps_moving_while_speed_changes() {
        let s = newton_step(0.1, 0.0, -0.5, -1.0);
        assert_eq!(s.position_delta, 0.0);
        assert_relative_eq!(s.end_speed, 0.05);
        assert_relative_eq!(s.displacement(), -2.5e-3, epsilon = 1e-15);

        // Stalled: nothing moves, nothing changes.
        let s = newton_step(0.1, 0.0, 0.0, 1.0);
        assert_eq!(s.displacement(), 0.0);
    }
}

// ── Forces ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod forces {
    use super::*;

    #[test]
    fn weight_uses_average_grade_under_train() {
        let rs = frictionless();
        let profile = GradeProfile::new(vec![0.0, 100.0, 300.0], vec![10.0, -5.0]).unwrap();
        let curves = EffortCurveMap::single(300.0, TractiveEffortCurve::constant(0.0));
        let ctx = SimContext::new(&rs, &profile, 1.0, &curves);
        let expected = |grade: f64| -400_000.0 * 9.81 * (grade / 1000.0f64).atan().sin();
        // Tail clamped at 0: only the +10 section.
        assert_relative_eq!(weight_force(&ctx, 50.0), expected(10.0));
        // [50, 250]: 50 m at +10, 150 m at -5.
        assert_relative_eq!(weight_force(&ctx, 250.0), expected(-1.25), epsilon = 1e-9);
    }

    #[test]
    fn stopped_train_needs_to_overcome_resistance() {
        let rs = constant_drag();
        assert_eq!(compute_acceleration(&rs, 4_000.0, 0.0, 0.0, 3_000.0, 1.0), 0.0);
        assert_relative_eq!(
            compute_acceleration(&rs, 4_000.0, 0.0, 0.0, 46_000.0, 1.0),
            42_000.0 / 420_000.0
        );
        // Backward integration is always allowed to move.
        assert!(compute_acceleration(&rs, 4_000.0, 0.0, 0.0, 0.0, -1.0) < 0.0);
    }

    #[test]
    fn stopped_train_on_steep_rise_uses_plain_force_balance() {
        let rs = constant_drag();
        // Weight pulls back harder than the resistance holds.
        assert_relative_eq!(
            compute_acceleration(&rs, 4_000.0, -50_000.0, 0.0, 20_000.0, 1.0),
            (-30_000.0 - 4_000.0) / 420_000.0
        );
        assert_relative_eq!(
            compute_acceleration(&rs, 4_000.0, -50_000.0, 0.0, 20_000.0, 1.0),
            compute_acceleration(&rs, 4_000.0, -50_000.0, 1.0, 20_000.0, 1.0)
        );
    }

    #[test]
    fn maintain_holds_speed_when_traction_suffices() {
        let rs = constant_drag();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves);
        assert_eq!(action_acceleration(&ctx, 10.0, 20.0, Action::Maintain, 1.0, BrakingType::Constant), 0.0);

        let steep = GradeProfile::uniform(LENGTH, 100.0);
        let ctx = SimContext::new(&rs, &steep, 1.0, &curves);
        assert!(action_acceleration(&ctx, 500.0, 20.0, Action::Maintain, 1.0, BrakingType::Constant) < 0.0);
    }

    #[test]
    fn coast_uses_natural_forces_only() {
        let rs = constant_drag();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves);
        assert_relative_eq!(
            action_acceleration(&ctx, 10.0, 20.0, Action::Coast, 1.0, BrakingType::Constant),
            -4_000.0 / 420_000.0
        );
        assert_relative_eq!(
            action_acceleration(&ctx, 10.0, 20.0, Action::Accelerate, 1.0, BrakingType::Constant),
            38_000.0 / 420_000.0
        );
    }
}

// ── Braking policies ──────────────────────────────────────────────────────────

#[cfg(test)]
mod braking {
    use super::*;
    use es_core::etcs::gradient_acceleration;

    #[test]
    fn constant_braking_ignores_other_forces() {
        let rs = constant_drag();
        let steep = GradeProfile::uniform(LENGTH, 30.0);
        let curves = curves();
        let ctx = SimContext::new(&rs, &steep, 1.0, &curves);
        assert_eq!(braking_deceleration(&ctx, 500.0, 20.0, BrakingType::Constant), -0.5);
        assert_eq!(
            action_acceleration(&ctx, 500.0, 20.0, Action::Brake, 1.0, BrakingType::Constant),
            -0.5
        );
    }

    #[test]
    fn etcs_policies() {
        let mut rs = frictionless();
        rs.etcs = Some(etcs_params());
        let profile = GradeProfile::uniform(LENGTH, 5.0);
        let curves = curves();
        let ctx = SimContext::new(&rs, &profile, 1.0, &curves);
        let grad = gradient_acceleration(5.0);

        assert_relative_eq!(braking_deceleration(&ctx, 500.0, 20.0, BrakingType::EtcsEbd), -0.45 + grad);
        assert_relative_eq!(braking_deceleration(&ctx, 500.0, 20.0, BrakingType::EtcsSbd), -0.8 + grad);
        assert_relative_eq!(
            braking_deceleration(&ctx, 500.0, 20.0, BrakingType::EtcsGui),
            -0.6 + grad - 0.01
        );
    }

    #[test]
    fn etcs_uses_min_grade_under_train() {
        let mut rs = frictionless();
        rs.etcs = Some(etcs_params());
        let profile = GradeProfile::new(vec![0.0, 400.0, LENGTH], vec![-10.0, 5.0]).unwrap();
        let curves = curves();
        let ctx = SimContext::new(&rs, &profile, 1.0, &curves);
        // Train over [350, 550]: min grade is the -10 section.
        assert_relative_eq!(
            braking_deceleration(&ctx, 550.0, 20.0, BrakingType::EtcsSbd),
            -0.8 + gradient_acceleration(-10.0)
        );
    }

    #[test]
    #[should_panic(expected = "ETCS braking")]
    fn etcs_without_params_panics() {
        let rs = frictionless();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves).with_braking_type(BrakingType::EtcsEbd);
        step(&ctx, 100.0, 10.0, Action::Brake, 1.0);
    }
}

// ── Overlay loops ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod loops {
    use super::*;

    #[test]
    fn constant_effort_matches_kinematics() {
        let rs = frictionless();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves);

        let s = step(&ctx, 0.0, 0.0, Action::Accelerate, 1.0);
        assert_relative_eq!(s.end_speed, 0.1, epsilon = 1e-12);
        assert_relative_eq!(s.position_delta, 0.05, epsilon = 1e-12);

        let mut builder = ConstrainedPartBuilder::forward(vec![
            PartConstraint::position_range(0.0, 1000.0),
            PartConstraint::speed_ceiling(20.0),
        ]);
        assert!(overlays::accelerate(&ctx, &mut builder, 0.0, 0.0));
        assert_eq!(builder.last_intersection(), Some(0));
        let part = builder.into_part(PartKind::Accelerating).unwrap();
        // a = 0.1 m/s²: v(1000) = √200, t(1000) = √20000.
        assert_eq!(part.end_pos(), 1000.0);
        assert_relative_eq!(part.end_speed(), 200f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(part.total_time(), 20_000f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(part.interpolate_speed(500.0), 100f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn backward_braking_curve() {
        let rs = frictionless();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves);

        let mut builder = ConstrainedPartBuilder::backward(vec![
            PartConstraint::speed_floor(0.0),
            PartConstraint::speed_ceiling(20.0),
        ]);
        assert!(overlays::decelerate(&ctx, &mut builder, 1000.0, 0.0));
        let part = builder.into_part(PartKind::Stop(0)).unwrap();
        // 20 m/s at 0.5 m/s² needs 400 m.
        assert_relative_eq!(part.begin_pos(), 600.0, epsilon = 1e-9);
        assert_eq!(part.end_pos(), 1000.0);
        assert_eq!(part.end_speed(), 0.0);
        assert_relative_eq!(part.begin_speed(), 20.0);
        assert_relative_eq!(part.interpolate_speed(800.0), 200f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(part.total_time(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn maintain_on_flat_track() {
        let rs = constant_drag();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves);

        let mut builder = ConstrainedPartBuilder::forward(vec![
            PartConstraint::speed_equal(10.0),
            PartConstraint::position_range(0.0, 95.0),
        ]);
        assert!(overlays::maintain(&ctx, &mut builder, 0.0, 10.0));
        let part = builder.into_part(PartKind::ConstantSpeed).unwrap();
        assert_eq!(part.end_pos(), 95.0);
        assert!(part.speeds().iter().all(|&v| v == 10.0));
        assert_abs_diff_eq!(part.total_time(), 9.5, epsilon = 1e-9);
    }

    #[test]
    fn coasting_to_a_stop() {
        let rs = constant_drag();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves);

        let mut builder = ConstrainedPartBuilder::forward(vec![
            PartConstraint::speed_floor(0.0),
            PartConstraint::position_range(0.0, LENGTH),
        ]);
        assert!(overlays::coast(&ctx, &mut builder, 0.0, 10.0));
        assert_eq!(builder.last_intersection(), None);
        let part = builder.into_part(PartKind::Coasting).unwrap();
        // Constant 4 kN drag: 100 / (2 · 4000 / 420000) = 5250 m.  The last
        // centimetres are lost to the position snapping.
        assert!(part.end_speed() < 0.05);
        assert_abs_diff_eq!(part.end_pos(), 5_250.0, epsilon = 0.1);
        assert!(part.speeds().windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn short_time_step_leaves_standstill() {
        let rs = frictionless();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 0.1, &curves);

        let mut builder = ConstrainedPartBuilder::backward(vec![
            PartConstraint::speed_floor(0.0),
            PartConstraint::speed_ceiling(20.0),
        ]);
        assert!(overlays::decelerate(&ctx, &mut builder, 1000.0, 0.0));
        let part = builder.into_part(PartKind::Stop(0)).unwrap();
        assert_relative_eq!(part.begin_pos(), 600.0, epsilon = 1e-6);
        assert_relative_eq!(part.begin_speed(), 20.0);
        assert_eq!(part.end_speed(), 0.0);

        let mut builder = ConstrainedPartBuilder::forward(vec![
            PartConstraint::position_range(0.0, 1000.0),
            PartConstraint::speed_ceiling(20.0),
        ]);
        assert!(overlays::accelerate(&ctx, &mut builder, 0.0, 0.0));
        let part = builder.into_part(PartKind::Accelerating).unwrap();
        assert_eq!(part.end_pos(), 1000.0);
        assert_relative_eq!(part.end_speed(), 200f64.sqrt(), epsilon = 1e-6);
        assert!(part.positions()[1] < 0.01);
    }

    #[test]
    fn rejected_start_returns_false() {
        let rs = frictionless();
        let path = FlatPath::new(LENGTH);
        let curves = curves();
        let ctx = SimContext::new(&rs, &path, 1.0, &curves);
        let mut builder = ConstrainedPartBuilder::forward(vec![PartConstraint::speed_ceiling(5.0)]);
        assert!(!overlays::accelerate(&ctx, &mut builder, 0.0, 10.0));
    }
}
