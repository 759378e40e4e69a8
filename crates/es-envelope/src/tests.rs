//! Unit tests for es-envelope.

use approx::{assert_abs_diff_eq, assert_relative_eq};

use crate::{
    ConstrainedPartBuilder, Envelope, EnvelopeCursor, EnvelopeError, EnvelopePart,
    OverlayEnvelopeBuilder, PartConstraint, PartKind, StepCheck,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn part(xs: &[f64], vs: &[f64]) -> EnvelopePart {
    EnvelopePart::new(PartKind::SpeedLimit, xs.to_vec(), vs.to_vec()).unwrap()
}

fn plateau(begin: f64, end: f64, speed: f64) -> EnvelopePart {
    part(&[begin, end], &[speed, speed])
}

/// Three parts: `[1, 3, 4]`, `[4, 6]`, `[6, 8, 10]` with an upward jump at 4
/// and a downward jump at 6.
fn three_part_envelope() -> Envelope {
    Envelope::new(vec![
        part(&[1.0, 3.0, 4.0], &[2.0, 4.0, 2.0]),
        part(&[4.0, 6.0], &[5.0, 5.0]),
        part(&[6.0, 8.0, 10.0], &[1.0, 3.0, 1.0]),
    ])
    .unwrap()
}

fn increase(_: f64, prev_speed: f64, _: f64, next_speed: f64) -> bool {
    prev_speed < next_speed
}

fn decrease(_: f64, prev_speed: f64, _: f64, next_speed: f64) -> bool {
    next_speed < prev_speed
}

// ── EnvelopePart ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod parts {
    use super::*;

    #[test]
    fn validation() {
        assert_eq!(
            EnvelopePart::new(PartKind::Braking, vec![0.0], vec![1.0]),
            Err(EnvelopeError::TooFewPoints(1))
        );
        assert!(matches!(
            EnvelopePart::new(PartKind::Braking, vec![0.0, 0.0], vec![1.0, 1.0]),
            Err(EnvelopeError::NonIncreasingPositions { index: 1, .. })
        ));
        assert!(matches!(
            EnvelopePart::new(PartKind::Braking, vec![0.0, 1.0], vec![1.0, -1.0]),
            Err(EnvelopeError::InvalidSpeed { index: 1, .. })
        ));
        assert!(matches!(
            EnvelopePart::new(PartKind::Braking, vec![0.0, 1.0], vec![0.0, 0.0]),
            Err(EnvelopeError::ZeroSpeedStep { index: 0 })
        ));
        assert!(matches!(
            EnvelopePart::with_times(PartKind::Braking, vec![0.0, 1.0], vec![1.0, 1.0], vec![0.0]),
            Err(EnvelopeError::InvalidTime { index: 0, .. })
        ));
    }

    #[test]
    fn constant_acceleration_speed_and_time() {
        // 0 → 10 m/s over 50 m is 1 m/s², 10 s.
        let p = part(&[0.0, 50.0], &[0.0, 10.0]);
        assert_relative_eq!(p.total_time(), 10.0);
        assert_relative_eq!(p.interpolate_speed(12.5), 5.0);
        assert_relative_eq!(p.interpolate_time(12.5), 5.0);
        assert_relative_eq!(p.interpolate_time(50.0), 10.0);
        // Clamped outside the part.
        assert_eq!(p.interpolate_speed(-3.0), 0.0);
        assert_eq!(p.interpolate_speed(80.0), 10.0);
    }

    #[test]
    fn explicit_times_are_scaled_inside_steps() {
        let p = EnvelopePart::with_times(
            PartKind::Accelerating,
            vec![0.0, 50.0],
            vec![0.0, 10.0],
            vec![12.0],
        )
        .unwrap();
        assert_relative_eq!(p.total_time(), 12.0);
        assert_relative_eq!(p.interpolate_time(12.5), 6.0);
    }

    #[test]
    fn step_lookup_prefers_the_requested_side() {
        let p = part(&[0.0, 10.0, 20.0], &[5.0, 5.0, 5.0]);
        assert_eq!(p.find_step(10.0), 1);
        assert_eq!(p.find_step_left(10.0), 0);
        assert_eq!(p.find_step(20.0), 1);
        assert_eq!(p.find_step_left(0.0), 0);
    }

    #[test]
    fn slice_keeps_interior_samples_and_time() {
        let p = part(&[0.0, 50.0, 150.0], &[0.0, 10.0, 10.0]);
        let s = p.slice(12.5, 100.0).unwrap();
        assert_eq!(s.positions(), &[12.5, 50.0, 100.0]);
        assert_relative_eq!(s.begin_speed(), 5.0);
        assert_relative_eq!(
            s.total_time(),
            p.interpolate_time(100.0) - p.interpolate_time(12.5),
            epsilon = 1e-12
        );
        assert!(p.slice(150.0, 200.0).is_none());
        assert!(p.slice(30.0, 30.0).is_none());
    }

    #[test]
    fn position_of_a_speed_follows_the_step_model() {
        // Braking from 20 to 0 m/s over 400 m: v² drops by 1 m²/s² per metre.
        let p = part(&[600.0, 800.0, 1000.0], &[20.0, 200f64.sqrt(), 0.0]);
        assert_relative_eq!(p.interpolate_position(20.0).unwrap(), 600.0);
        assert_relative_eq!(p.interpolate_position(10.0).unwrap(), 900.0, epsilon = 1e-9);
        assert_relative_eq!(p.interpolate_position(0.0).unwrap(), 1000.0);
        assert!(p.interpolate_position(25.0).is_none());
    }

    #[test]
    fn capping_inserts_exact_crossings() {
        let p = part(&[0.0, 100.0], &[0.0, 20.0]);
        let c = p.capped(10.0);
        assert_eq!(c.kind(), PartKind::Capped);
        assert_eq!(c.positions().len(), 3);
        assert_relative_eq!(c.position(1), 25.0);
        assert_eq!(c.speeds(), &[0.0, 10.0, 10.0]);
        assert_relative_eq!(c.total_time(), 5.0 + 7.5);
        // Below the cap nothing changes.
        assert_eq!(p.capped(30.0), p);
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod envelopes {
    use super::*;

    #[test]
    fn rejects_gaps_and_empty() {
        assert_eq!(Envelope::new(vec![]), Err(EnvelopeError::Empty));
        let err = Envelope::new(vec![plateau(0.0, 10.0, 5.0), plateau(11.0, 20.0, 5.0)]);
        assert!(matches!(err, Err(EnvelopeError::NotContiguous { index: 1, .. })));
    }

    #[test]
    fn discontinuities_take_the_lower_side() {
        let env = three_part_envelope();
        assert_eq!(env.interpolate_speed(4.0), 2.0);
        assert_eq!(env.interpolate_speed_left_dir(4.0), 2.0);
        assert_eq!(env.interpolate_speed_right_dir(4.0), 5.0);
        assert_eq!(env.interpolate_speed_left_dir(6.0), 5.0);
        assert_eq!(env.interpolate_speed_right_dir(6.0), 1.0);
        assert!(!env.is_continuous());
        assert_eq!(env.begin_pos(), 1.0);
        assert_eq!(env.end_pos(), 10.0);
    }

    #[test]
    fn time_queries() {
        let env = three_part_envelope();
        assert_relative_eq!(env.total_time(), 3.4, epsilon = 1e-12);
        assert_relative_eq!(env.interpolate_total_time(6.0), 1.4, epsilon = 1e-12);
        assert_relative_eq!(env.time_between(4.0, 6.0), 0.4, epsilon = 1e-12);
        assert_eq!(env.interpolate_total_time(1.0), 0.0);
    }

    #[test]
    fn speed_extrema_over_ranges() {
        let env = three_part_envelope();
        assert_eq!(env.max_speed(), 5.0);
        assert_eq!(env.min_speed(), 1.0);
        assert_eq!(env.max_speed_between(5.0, 9.0), 5.0);
        assert_eq!(env.min_speed_between(5.0, 9.0), 1.0);
        assert_eq!(env.max_speed_between(6.5, 9.0), 3.0);
    }

    #[test]
    fn slice_cuts_at_bounds() {
        let env = three_part_envelope();
        let s = env.slice(2.0, 7.0).unwrap();
        assert_eq!(s.part_count(), 3);
        assert_eq!(s.begin_pos(), 2.0);
        assert_eq!(s.end_pos(), 7.0);
        assert_relative_eq!(s.begin_speed(), 10f64.sqrt());
        assert_relative_eq!(s.total_time(), env.time_between(2.0, 7.0), epsilon = 1e-12);
        assert_eq!(env.sample_positions_between(2.0, 8.0), vec![3.0, 4.0, 6.0]);
    }

    #[test]
    fn cap_speed_keeps_the_partition() {
        let env = three_part_envelope();
        let capped = env.cap_speed(3.0);
        assert_eq!(capped.begin_pos(), env.begin_pos());
        assert_eq!(capped.end_pos(), env.end_pos());
        assert!(capped.max_speed() <= 3.0);
        assert!(capped.total_time() > env.total_time());
        for w in capped.parts().windows(2) {
            assert_eq!(w[0].end_pos(), w[1].begin_pos());
        }
    }
}

// ── EnvelopeCursor ────────────────────────────────────────────────────────────

#[cfg(test)]
mod cursor {
    use super::*;

    #[test]
    fn forward_part_transitions() {
        let env = three_part_envelope();
        let mut cursor = EnvelopeCursor::forward(&env);
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (0, 0, 1.0));
        assert_eq!(cursor.speed(), 2.0);

        assert!(cursor.find_part_transition(increase));
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (0, 1, 4.0));
        assert_eq!(cursor.speed(), 2.0);

        // Already on the matching transition: no move.
        let revision = cursor.revision();
        assert!(cursor.find_part_transition(increase));
        assert_eq!(cursor.revision(), revision);

        cursor.next_part();
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (1, 0, 4.0));
        assert_eq!(cursor.speed(), 5.0);
        assert!(cursor.revision() > revision);

        assert!(!cursor.find_part_transition(increase));
        assert!(cursor.has_reached_end());
        assert_eq!(cursor.position(), 10.0);
        assert_eq!(cursor.part_index(), 2);
    }

    #[test]
    fn backward_part_transitions() {
        let env = three_part_envelope();
        let mut cursor = EnvelopeCursor::backward(&env);
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (2, 1, 10.0));
        assert_eq!(cursor.speed(), 1.0);

        assert!(cursor.find_part_transition(increase));
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (2, 0, 6.0));
        assert_eq!(cursor.speed(), 1.0);

        cursor.next_part();
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (1, 0, 6.0));
        assert_eq!(cursor.speed(), 5.0);

        assert!(!cursor.find_part_transition(increase));
        assert!(cursor.has_reached_end());
        assert_eq!(cursor.position(), 1.0);
        assert_eq!(cursor.part_index(), 0);
    }

    #[test]
    fn find_step_forward_and_backward() {
        let env = three_part_envelope();
        let mut cursor = EnvelopeCursor::forward(&env);
        assert!(cursor.find_step(decrease));
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (0, 1, 3.0));
        let state = cursor.state();
        assert!(cursor.find_step(decrease));
        assert_eq!(cursor.state(), state);

        let mut cursor = EnvelopeCursor::backward(&env);
        assert!(cursor.find_step(decrease));
        assert_eq!((cursor.part_index(), cursor.step_index(), cursor.position()), (2, 0, 8.0));
    }

    #[test]
    fn find_position_is_monotonic() {
        let env = three_part_envelope();
        let mut cursor = EnvelopeCursor::forward(&env);
        assert!(cursor.find_position(8.5));
        assert_eq!((cursor.part_index(), cursor.step_index()), (2, 1));
        assert_relative_eq!(cursor.speed(), 7f64.sqrt());

        let state = cursor.state();
        assert!(!cursor.find_position(5.0));
        assert!(!cursor.find_position(11.0));
        assert_eq!(cursor.state(), state);

        // A boundary is entered on the side of the travel direction.
        let mut cursor = EnvelopeCursor::forward(&env);
        assert!(cursor.find_position(4.0));
        assert_eq!(cursor.part_index(), 1);
        let mut cursor = EnvelopeCursor::backward(&env);
        assert!(cursor.find_position(4.0));
        assert_eq!(cursor.part_index(), 0);
    }

    #[test]
    fn find_part_and_checks() {
        let env = three_part_envelope();
        let mut cursor = EnvelopeCursor::forward(&env);
        assert!(cursor.check_part_transition(increase));
        assert!(cursor.check_part(|p| p.max_speed() == 4.0));
        assert_eq!(cursor.revision(), 0);

        assert!(cursor.find_part(|p| p.max_speed() >= 5.0));
        assert_eq!((cursor.part_index(), cursor.position()), (1, 4.0));
        let revision = cursor.revision();
        assert!(cursor.find_part(|p| p.max_speed() >= 5.0));
        assert_eq!(cursor.revision(), revision);

        assert!(!cursor.find_part(|p| p.max_speed() > 100.0));
        assert!(cursor.has_reached_end());
        assert!(!cursor.check_part(|_| true));
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod constraints {
    use super::*;

    #[test]
    fn speed_ceiling_intersection_is_exact() {
        let c = PartConstraint::speed_ceiling(10.0);
        assert_eq!(c.step_check(0.0, 0.0, 50.0, 9.0), StepCheck::Pass);
        match c.step_check(0.0, 0.0, 100.0, 20.0) {
            StepCheck::Intersection { position, speed } => {
                assert_relative_eq!(position, 25.0);
                assert_eq!(speed, 10.0);
            }
            StepCheck::Pass => panic!("expected an intersection"),
        }
    }

    #[test]
    fn speed_equal_stops_at_step_start() {
        let c = PartConstraint::speed_equal(10.0);
        assert!(c.init_check(0.0, 10.0, 1.0));
        assert_eq!(c.step_check(0.0, 10.0, 20.0, 10.0), StepCheck::Pass);
        assert_eq!(
            c.step_check(20.0, 10.0, 40.0, 9.5),
            StepCheck::Intersection { position: 20.0, speed: 10.0 }
        );
    }

    #[test]
    fn envelope_ceiling_crossing_inside_a_step() {
        // v² = 4x
        let env = Envelope::from_part(part(&[0.0, 100.0], &[0.0, 20.0]));
        let c = PartConstraint::envelope_ceiling(&env);
        assert!(c.init_check(50.0, 10.0, -1.0));
        match c.step_check(50.0, 10.0, 20.0, 10.0) {
            StepCheck::Intersection { position, speed } => {
                assert_relative_eq!(position, 25.0, epsilon = 1e-9);
                assert_relative_eq!(speed, 10.0);
            }
            StepCheck::Pass => panic!("expected an intersection"),
        }
    }

    #[test]
    fn envelope_ceiling_drop_at_a_boundary() {
        let env = Envelope::new(vec![plateau(0.0, 100.0, 10.0), plateau(100.0, 200.0, 5.0)]).unwrap();
        let c = PartConstraint::envelope_ceiling(&env);
        assert!(c.init_check(50.0, 8.0, 1.0));
        assert_eq!(
            c.step_check(50.0, 8.0, 150.0, 8.0),
            StepCheck::Intersection { position: 100.0, speed: 8.0 }
        );
        // Travelling backward the same boundary is a rise: no violation.
        assert!(c.init_check(150.0, 5.0, -1.0));
        assert_eq!(c.step_check(150.0, 5.0, 80.0, 5.0), StepCheck::Pass);
    }

    #[test]
    fn envelope_floor() {
        let env = Envelope::from_part(plateau(0.0, 100.0, 10.0));
        let c = PartConstraint::envelope_floor(&env);
        assert!(!c.init_check(10.0, 9.0, 1.0));
        assert!(c.init_check(10.0, 12.0, 1.0));
        match c.step_check(10.0, 12.0, 30.0, 8.0) {
            StepCheck::Intersection { position, speed } => {
                assert_relative_eq!(speed, 10.0, epsilon = 1e-9);
                assert!(position > 10.0 && position < 30.0);
            }
            StepCheck::Pass => panic!("expected an intersection"),
        }
    }

    #[test]
    fn steps_past_bounds_are_cut() {
        let c = PartConstraint::position_range(0.0, 100.0);
        assert_eq!(
            c.step_check(90.0, 10.0, 120.0, 10.0),
            StepCheck::Intersection { position: 100.0, speed: 10.0 }
        );
        let env = Envelope::from_part(plateau(0.0, 100.0, 10.0));
        let c = PartConstraint::envelope_ceiling(&env);
        assert_eq!(
            c.step_check(90.0, 5.0, 110.0, 5.0),
            StepCheck::Intersection { position: 100.0, speed: 5.0 }
        );
        assert!(!c.init_check(120.0, 5.0, 1.0));
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builders {
    use super::*;

    #[test]
    fn backward_part_is_stored_ascending() {
        let mut builder = ConstrainedPartBuilder::backward(vec![
            PartConstraint::speed_floor(0.0),
            PartConstraint::speed_ceiling(10.0),
        ]);
        assert!(builder.init_envelope_part(100.0, 0.0));
        assert!(builder.add_step(90.0, 5.0, 4.0));
        assert!(builder.add_step(80.0, 8.0, 1.6));
        assert!(!builder.add_step(70.0, 12.0, 1.0));
        assert_eq!(builder.last_intersection(), Some(1));
        assert_relative_eq!(builder.last_pos().unwrap(), 75.5);
        assert_eq!(builder.last_speed(), Some(10.0));
        // Refuses anything after the intersection.
        assert!(!builder.add_step(60.0, 10.0, 1.0));

        let part = builder.into_part(PartKind::Stop(0)).unwrap();
        assert_eq!(part.kind(), PartKind::Stop(0));
        assert_relative_eq!(part.begin_pos(), 75.5);
        assert_eq!(part.end_pos(), 100.0);
        assert_eq!(part.speeds()[1..], [8.0, 5.0, 0.0]);
        assert_relative_eq!(part.step_time(1), 1.6, epsilon = 1e-12);
        assert_relative_eq!(part.step_time(2), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn non_advancing_step_ends_the_part() {
        let mut builder = ConstrainedPartBuilder::forward(vec![]);
        assert!(builder.init_envelope_part(0.0, 10.0));
        assert!(!builder.add_step(0.0, 10.0, 1.0));
        assert!(builder.is_finished());
        assert_eq!(builder.last_intersection(), None);
        assert!(builder.into_part(PartKind::Coasting).is_none());
    }

    #[test]
    fn rejected_start_accepts_nothing() {
        let mut builder = ConstrainedPartBuilder::forward(vec![PartConstraint::speed_ceiling(5.0)]);
        assert!(!builder.init_envelope_part(0.0, 10.0));
        assert!(!builder.add_step(10.0, 10.0, 1.0));
        assert_eq!(builder.step_count(), 0);
    }

    #[test]
    fn earliest_intersection_wins() {
        let env = Envelope::from_part(plateau(0.0, 100.0, 20.0));
        let mut builder = ConstrainedPartBuilder::forward(vec![
            PartConstraint::envelope_ceiling(&env),
            PartConstraint::position_range(0.0, 40.0),
        ]);
        assert!(builder.init_envelope_part(0.0, 10.0));
        assert!(!builder.add_step(150.0, 10.0, 15.0));
        assert_eq!(builder.last_intersection(), Some(1));
        assert_eq!(builder.last_pos(), Some(40.0));
        let part = builder.into_part(PartKind::ConstantSpeed).unwrap();
        assert_abs_diff_eq!(part.total_time(), 4.0, epsilon = 1e-12);
    }
}

// ── OverlayEnvelopeBuilder ────────────────────────────────────────────────────

#[cfg(test)]
mod overlay {
    use super::*;

    fn base() -> Envelope {
        Envelope::new(vec![plateau(0.0, 500.0, 20.0), plateau(500.0, 1000.0, 20.0)]).unwrap()
    }

    #[test]
    fn forward_splice() {
        let base = base();
        let mut builder = OverlayEnvelopeBuilder::forward(&base);
        builder.add_part(part(&[200.0, 250.0, 300.0], &[20.0, 10.0, 20.0])).unwrap();
        builder.add_part(part(&[600.0, 700.0], &[20.0, 15.0])).unwrap();
        assert_eq!(builder.last_pos(), 700.0);
        let env = builder.build().unwrap();
        assert_eq!(env.part_count(), 6);
        assert_eq!(env.begin_pos(), 0.0);
        assert_eq!(env.end_pos(), 1000.0);
        assert_eq!(env.interpolate_speed(250.0), 10.0);
        assert_eq!(env.interpolate_speed(700.0), 15.0);
        assert_eq!(env.interpolate_speed(400.0), 20.0);
    }

    #[test]
    fn rejects_overlaps_in_build_order() {
        let base = base();
        let mut forward = OverlayEnvelopeBuilder::forward(&base);
        forward.add_part(plateau(200.0, 300.0, 10.0)).unwrap();
        assert!(matches!(
            forward.add_part(plateau(250.0, 400.0, 10.0)),
            Err(EnvelopeError::OverlappingOverlay { .. })
        ));

        let mut backward = OverlayEnvelopeBuilder::backward(&base);
        backward.add_part(plateau(600.0, 700.0, 10.0)).unwrap();
        backward.add_part(plateau(200.0, 300.0, 10.0)).unwrap();
        assert_eq!(backward.last_pos(), 200.0);
        assert!(backward.add_part(plateau(650.0, 680.0, 10.0)).is_err());
        let env = backward.build().unwrap();
        assert_eq!(env.part_count(), 6);
    }

    #[test]
    fn rejects_parts_outside_the_base() {
        let base = base();
        let mut builder = OverlayEnvelopeBuilder::forward(&base);
        assert!(matches!(
            builder.add_part(plateau(900.0, 1100.0, 10.0)),
            Err(EnvelopeError::OverlayOutOfRange { .. })
        ));
    }
}
