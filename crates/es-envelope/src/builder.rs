//! Step-by-step part construction.
//!
//! [`EnvelopePartBuilder`] only accumulates points.  [`ConstrainedPartBuilder`]
//! wraps it with a build direction and a set of [`PartConstraint`]s: every
//! step is checked, a violating step is cut at the crossing point, and the
//! builder then refuses further steps.
//!
//! ```text
//! init_envelope_part(pos, speed)  → false if the start violates a constraint
//! loop {
//!     let step = integrate(...);
//!     if !builder.add_step(pos, speed, dt) { break }
//! }
//! builder.into_part(kind)         → None if fewer than two points
//! ```

use crate::constraint::{PartConstraint, StepCheck};
use crate::part::{EnvelopePart, PartKind, step_duration};

// ── EnvelopePartBuilder ───────────────────────────────────────────────────────

/// Raw point accumulator, in traversal order.
#[derive(Clone, Debug, Default)]
pub struct EnvelopePartBuilder {
    positions: Vec<f64>,
    speeds:    Vec<f64>,
    durations: Vec<f64>,
}

impl EnvelopePartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset and place the first point.
    pub fn start(&mut self, position: f64, speed: f64) {
        self.positions.clear();
        self.speeds.clear();
        self.durations.clear();
        self.positions.push(position);
        self.speeds.push(speed);
    }

    pub fn add_step(&mut self, position: f64, speed: f64, duration: f64) {
        self.positions.push(position);
        self.speeds.push(speed);
        self.durations.push(duration);
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.durations.len()
    }

    pub fn last_pos(&self) -> Option<f64> {
        self.positions.last().copied()
    }

    pub fn last_speed(&self) -> Option<f64> {
        self.speeds.last().copied()
    }

    /// Finish the part.  Points accumulated backward are reversed into
    /// storage order.
    pub fn build(mut self, kind: PartKind, backward: bool) -> Option<EnvelopePart> {
        if self.positions.len() < 2 {
            return None;
        }
        if backward {
            self.positions.reverse();
            self.speeds.reverse();
            self.durations.reverse();
        }
        Some(EnvelopePart::from_steps(kind, self.positions, self.speeds, self.durations))
    }
}

// ── ConstrainedPartBuilder ────────────────────────────────────────────────────

/// Builds one part in a given direction under a set of constraints.
#[derive(Clone, Debug)]
pub struct ConstrainedPartBuilder<'a> {
    direction:         f64,
    constraints:       Vec<PartConstraint<'a>>,
    part:              EnvelopePartBuilder,
    last_intersection: Option<usize>,
    finished:          bool,
}

impl<'a> ConstrainedPartBuilder<'a> {
    /// `direction` is `+1.0` (increasing positions) or `-1.0`.
    pub fn new(direction: f64, constraints: Vec<PartConstraint<'a>>) -> Self {
        Self {
            direction: if direction < 0.0 { -1.0 } else { 1.0 },
            constraints,
            part: EnvelopePartBuilder::new(),
            last_intersection: None,
            finished: false,
        }
    }

    pub fn forward(constraints: Vec<PartConstraint<'a>>) -> Self {
        Self::new(1.0, constraints)
    }

    pub fn backward(constraints: Vec<PartConstraint<'a>>) -> Self {
        Self::new(-1.0, constraints)
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Place the first point.  Returns `false` (and accepts no steps) if it
    /// violates a constraint.
    pub fn init_envelope_part(&mut self, position: f64, speed: f64) -> bool {
        let valid = self
            .constraints
            .iter()
            .all(|c| c.init_check(position, speed, self.direction));
        if !valid {
            self.finished = true;
            return false;
        }
        self.part.start(position, speed);
        true
    }

    /// Append a step ending at `(position, speed)` that lasted `duration`
    /// seconds.  Returns `false` once the part is complete: a constraint was
    /// hit (the step was cut at the crossing) or the step did not advance.
    pub fn add_step(&mut self, position: f64, speed: f64, duration: f64) -> bool {
        if self.finished {
            return false;
        }
        let (Some(last_pos), Some(last_speed)) = (self.part.last_pos(), self.part.last_speed())
        else {
            return false;
        };
        let advances = (position - last_pos) * self.direction > 0.0;
        if !advances || !speed.is_finite() || (speed == 0.0 && last_speed == 0.0) {
            self.finished = true;
            return false;
        }

        let mut hit: Option<(usize, f64, f64)> = None;
        for (index, constraint) in self.constraints.iter().enumerate() {
            if let StepCheck::Intersection { position: p, speed: s } =
                constraint.step_check(last_pos, last_speed, position, speed)
            {
                let closer = hit.map_or(true, |(_, hit_pos, _)| (p - hit_pos) * self.direction < 0.0);
                if closer {
                    hit = Some((index, p, s));
                }
            }
        }

        let Some((index, cut_pos, cut_speed)) = hit else {
            self.part.add_step(position, speed, duration);
            return true;
        };
        self.finished = true;
        self.last_intersection = Some(index);
        let cut_advances = (cut_pos - last_pos) * self.direction > 0.0;
        if cut_advances && !(cut_speed == 0.0 && last_speed == 0.0) {
            let share = step_duration(cut_pos - last_pos, last_speed, cut_speed)
                / step_duration(position - last_pos, last_speed, speed);
            let cut_duration = if share.is_finite() {
                duration * share
            } else {
                step_duration(cut_pos - last_pos, last_speed, cut_speed)
            };
            self.part.add_step(cut_pos, cut_speed, cut_duration);
        }
        false
    }

    /// Index (into the constraint list) of the constraint that ended the part.
    pub fn last_intersection(&self) -> Option<usize> {
        self.last_intersection
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn step_count(&self) -> usize {
        self.part.step_count()
    }

    pub fn last_pos(&self) -> Option<f64> {
        self.part.last_pos()
    }

    pub fn last_speed(&self) -> Option<f64> {
        self.part.last_speed()
    }

    pub fn into_part(self, kind: PartKind) -> Option<EnvelopePart> {
        self.part.build(kind, self.direction < 0.0)
    }
}
