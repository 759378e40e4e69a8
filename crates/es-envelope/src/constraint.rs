//! Constraints checked while a part is being integrated.
//!
//! A constraint checks the initial point once ([`PartConstraint::init_check`])
//! and then every step ([`PartConstraint::step_check`]).  A violated step is
//! cut at the exact point where it crosses the constraint.  Steps follow the
//! constant-acceleration model, so crossings are solved linearly in `v²`.

use es_core::constants::SPEED_EPSILON;

use crate::envelope::Envelope;
use crate::part::{interpolate_step_position, interpolate_step_speed};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpeedConstraintKind {
    /// Speed must stay at or above the value.
    Floor,
    /// Speed must stay at or below the value.
    Ceiling,
    /// Speed must stay at the value.
    Equal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnvelopeConstraintKind {
    Floor,
    Ceiling,
}

/// Outcome of checking one step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StepCheck {
    Pass,
    /// The step must be cut at this point.
    Intersection { position: f64, speed: f64 },
}

#[derive(Copy, Clone, Debug)]
pub enum PartConstraint<'a> {
    Speed { speed: f64, kind: SpeedConstraintKind },
    Envelope { envelope: &'a Envelope, kind: EnvelopeConstraintKind },
    /// The part must stay inside `[begin, end]`.
    Position { begin: f64, end: f64 },
}

impl<'a> PartConstraint<'a> {
    pub fn speed_floor(speed: f64) -> Self {
        PartConstraint::Speed { speed, kind: SpeedConstraintKind::Floor }
    }

    pub fn speed_ceiling(speed: f64) -> Self {
        PartConstraint::Speed { speed, kind: SpeedConstraintKind::Ceiling }
    }

    pub fn speed_equal(speed: f64) -> Self {
        PartConstraint::Speed { speed, kind: SpeedConstraintKind::Equal }
    }

    pub fn envelope_floor(envelope: &'a Envelope) -> Self {
        PartConstraint::Envelope { envelope, kind: EnvelopeConstraintKind::Floor }
    }

    pub fn envelope_ceiling(envelope: &'a Envelope) -> Self {
        PartConstraint::Envelope { envelope, kind: EnvelopeConstraintKind::Ceiling }
    }

    pub fn position_range(begin: f64, end: f64) -> Self {
        PartConstraint::Position { begin, end }
    }

    /// Whether a part may start at `(position, speed)` when built in
    /// `direction` (`+1` / `-1`).
    pub fn init_check(&self, position: f64, speed: f64, direction: f64) -> bool {
        match *self {
            PartConstraint::Speed { speed: limit, kind } => match kind {
                SpeedConstraintKind::Floor => speed >= limit - SPEED_EPSILON,
                SpeedConstraintKind::Ceiling => speed <= limit + SPEED_EPSILON,
                SpeedConstraintKind::Equal => (speed - limit).abs() < SPEED_EPSILON,
            },
            PartConstraint::Envelope { envelope, kind } => {
                if position < envelope.begin_pos() || position > envelope.end_pos() {
                    return false;
                }
                let reference = facing_speed(envelope, position, direction > 0.0);
                excess(kind, speed, reference) <= SPEED_EPSILON
            }
            PartConstraint::Position { begin, end } => begin <= position && position <= end,
        }
    }

    /// Check the step `(start_pos, start_speed) → (end_pos, end_speed)`,
    /// given in traversal order.
    pub fn step_check(
        &self,
        start_pos:   f64,
        start_speed: f64,
        end_pos:     f64,
        end_speed:   f64,
    ) -> StepCheck {
        match *self {
            PartConstraint::Speed { speed: limit, kind } => {
                let violated = match kind {
                    SpeedConstraintKind::Floor => end_speed < limit,
                    SpeedConstraintKind::Ceiling => end_speed > limit,
                    SpeedConstraintKind::Equal => (end_speed - limit).abs() >= SPEED_EPSILON,
                };
                if !violated {
                    return StepCheck::Pass;
                }
                match kind {
                    // The speed can no longer be held: the part ends where the
                    // step started.
                    SpeedConstraintKind::Equal => {
                        StepCheck::Intersection { position: start_pos, speed: start_speed }
                    }
                    SpeedConstraintKind::Floor | SpeedConstraintKind::Ceiling => {
                        let position = interpolate_step_position(
                            start_pos, start_speed, end_pos, end_speed, limit,
                        );
                        StepCheck::Intersection { position, speed: limit }
                    }
                }
            }
            PartConstraint::Envelope { envelope, kind } => {
                envelope_step_check(envelope, kind, start_pos, start_speed, end_pos, end_speed)
            }
            PartConstraint::Position { begin, end } => {
                let bound = if end_pos > end {
                    end
                } else if end_pos < begin {
                    begin
                } else {
                    return StepCheck::Pass;
                };
                let speed = interpolate_step_speed(start_pos, start_speed, end_pos, end_speed, bound);
                StepCheck::Intersection { position: bound, speed }
            }
        }
    }
}

/// Envelope speed at `position` on the side a part moving in the given
/// direction is about to enter.
fn facing_speed(envelope: &Envelope, position: f64, forward: bool) -> f64 {
    if forward {
        envelope.interpolate_speed_right_dir(position)
    } else {
        envelope.interpolate_speed_left_dir(position)
    }
}

/// Positive when `speed` violates the constraint against `reference`.
#[inline]
fn excess(kind: EnvelopeConstraintKind, speed: f64, reference: f64) -> f64 {
    match kind {
        EnvelopeConstraintKind::Ceiling => speed - reference,
        EnvelopeConstraintKind::Floor => reference - speed,
    }
}

#[inline]
fn excess_sq(kind: EnvelopeConstraintKind, speed: f64, reference: f64) -> f64 {
    match kind {
        EnvelopeConstraintKind::Ceiling => speed * speed - reference * reference,
        EnvelopeConstraintKind::Floor => reference * reference - speed * speed,
    }
}

/// Walk the step through every envelope sample it spans.  Inside each
/// sub-interval both the step and the envelope are linear in `v²`, so the
/// crossing is the root of a linear function.  Samples where the envelope
/// jumps are checked on the side the step enters.
fn envelope_step_check(
    envelope:    &Envelope,
    kind:        EnvelopeConstraintKind,
    start_pos:   f64,
    start_speed: f64,
    end_pos:     f64,
    end_speed:   f64,
) -> StepCheck {
    let forward = end_pos > start_pos;
    let clipped = end_pos.clamp(envelope.begin_pos(), envelope.end_pos());
    let speed_at = |x: f64| interpolate_step_speed(start_pos, start_speed, end_pos, end_speed, x);

    let mut breakpoints =
        envelope.sample_positions_between(start_pos.min(clipped), start_pos.max(clipped));
    if !forward {
        breakpoints.reverse();
    }
    breakpoints.push(clipped);

    let mut a = start_pos;
    for b in breakpoints {
        if b == a {
            continue;
        }
        let (speed_a, speed_b) = (speed_at(a), speed_at(b));
        let reference_a = facing_speed(envelope, a, forward);
        let reference_b = facing_speed(envelope, b, !forward);
        if excess(kind, speed_a, reference_a) > SPEED_EPSILON {
            return StepCheck::Intersection { position: a, speed: speed_a };
        }
        if excess(kind, speed_b, reference_b) > SPEED_EPSILON {
            let q_a = excess_sq(kind, speed_a, reference_a);
            let q_b = excess_sq(kind, speed_b, reference_b);
            let ratio = if q_b > q_a { (-q_a / (q_b - q_a)).clamp(0.0, 1.0) } else { 0.0 };
            let position = a + ratio * (b - a);
            return StepCheck::Intersection { position, speed: speed_at(position) };
        }
        a = b;
    }

    if clipped != end_pos {
        return StepCheck::Intersection { position: clipped, speed: speed_at(clipped) };
    }
    StepCheck::Pass
}
