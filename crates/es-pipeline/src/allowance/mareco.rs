//! Energy-saving running time extension over one section.
//!
//! The slowed-down section is a function of two margin parameters:
//!
//! - `v1`, a speed cap applied to the base curve;
//! - `low_limit`, the speed at which coasting hands over to braking.
//!
//! Lowering either one lengthens the run.  The search first checks whether
//! coasting alone, at the section's maximum speed, already gives too much
//! time; if so it bisects on `low_limit` (stage A).  Otherwise it bisects on
//! `v1`, deriving `low_limit` from it (stage B).

use es_core::constants::{SPEED_EPSILON, are_speeds_equal};
use es_core::{AllowanceConfig, RollingStock, SimContext};
use es_envelope::part::interpolate_step_position;
use es_envelope::{
    ConstrainedPartBuilder, Envelope, EnvelopePart, OverlayEnvelopeBuilder, PartConstraint,
    PartKind,
};
use es_physics::overlays;

use super::{AllowanceError, AllowanceResult};
use crate::coasting::coast_from_end;

/// Lowest `v1` stage B will try, m/s.
const MIN_V1: f64 = 1.0;

/// Target speed of the coasting phases for a cap of `v1`.
///
/// `vf = wle·v1 / (wle + R(v1)·v1)` with `wle = v1²·R'(v1)`.  A train with
/// no resistance at all coasts without losing speed, so `vf` is 0.
pub fn vf(rolling_stock: &RollingStock, v1: f64) -> f64 {
    let wle = v1 * v1 * rolling_stock.rolling_resistance_deriv(v1);
    let vf = wle * v1 / (wle + rolling_stock.rolling_resistance(v1) * v1);
    if vf.is_finite() { vf } else { 0.0 }
}

// ── Section envelope ──────────────────────────────────────────────────────────

/// Where each braking phase's coasting should end, ascending.
///
/// A braking phase is a maximal run of decreasing samples.  Coasting ends
/// where the phase drops to `low_limit`, at the phase begin if it starts
/// below, at the phase end if it never gets there.
fn coasting_ends(envelope: &Envelope, low_limit: f64) -> Vec<f64> {
    fn close(phase: &mut Vec<(f64, f64)>, low_limit: f64, ends: &mut Vec<f64>) {
        if phase.len() >= 2 {
            let (begin_pos, begin_speed) = phase[0];
            let end = if begin_speed <= low_limit {
                begin_pos
            } else {
                phase
                    .windows(2)
                    .find(|w| w[1].1 <= low_limit)
                    .map(|w| interpolate_step_position(w[0].0, w[0].1, w[1].0, w[1].1, low_limit))
                    .unwrap_or(phase[phase.len() - 1].0)
            };
            ends.push(end);
        }
        phase.clear();
    }

    let mut ends = Vec::new();
    let mut phase: Vec<(f64, f64)> = Vec::new();
    let mut previous: Option<(f64, f64)> = None;
    for part in envelope.parts() {
        for (&x, &v) in part.positions().iter().zip(part.speeds()) {
            match previous {
                Some((px, pv)) if x > px && v < pv => {
                    if phase.is_empty() {
                        phase.push((px, pv));
                    }
                    phase.push((x, v));
                }
                // Shared sample at a continuous part boundary.
                Some((px, pv)) if x == px && are_speeds_equal(v, pv) => {}
                _ => close(&mut phase, low_limit, &mut ends),
            }
            previous = Some((x, v));
        }
    }
    close(&mut phase, low_limit, &mut ends);
    ends
}

/// Overlay `part` (if any) on `base` in the given direction.
fn overlay_one(
    base:     &Envelope,
    part:     Option<EnvelopePart>,
    backward: bool,
) -> AllowanceResult<Envelope> {
    let Some(part) = part else {
        return Ok(base.clone());
    };
    let mut builder = if backward {
        OverlayEnvelopeBuilder::backward(base)
    } else {
        OverlayEnvelopeBuilder::forward(base)
    };
    builder.add_part(part)?;
    Ok(builder.build()?)
}

/// One section with fixed begin and end speeds, slowed down by the margin
/// parameters.
pub(crate) struct MarecoSection<'a> {
    ctx:      SimContext<'a>,
    base:     &'a Envelope,
    capacity: f64,
}

impl<'a> MarecoSection<'a> {
    pub(crate) fn new(ctx: SimContext<'a>, base: &'a Envelope, capacity: f64) -> Self {
        Self { ctx, base, capacity }
    }

    /// Coasting low limit stage B uses for a cap of `v1`.
    fn low_limit_for(&self, v1: f64) -> f64 {
        vf(self.ctx.rolling_stock, v1).max(self.capacity)
    }

    /// The section curve for `(v1, low_limit)`.
    pub(crate) fn envelope(&self, v1: f64, low_limit: f64) -> AllowanceResult<Envelope> {
        let ctx = &self.ctx;
        let base = self.base;
        let capped = base.cap_speed(v1.max(self.capacity));

        // Brake from the imposed begin speed down to the cap.
        let with_begin = if base.begin_speed() > capped.begin_speed() + SPEED_EPSILON {
            let mut builder =
                ConstrainedPartBuilder::forward(vec![PartConstraint::envelope_floor(&capped)]);
            overlays::decelerate(ctx, &mut builder, base.begin_pos(), base.begin_speed());
            overlay_one(&capped, builder.into_part(PartKind::Transition), false)?
        } else {
            capped
        };

        // Accelerate from the cap up to the imposed end speed.
        let with_end = if base.end_speed() > with_begin.end_speed() + SPEED_EPSILON {
            let mut builder =
                ConstrainedPartBuilder::backward(vec![PartConstraint::envelope_floor(&with_begin)]);
            overlays::accelerate(ctx, &mut builder, base.end_pos(), base.end_speed());
            overlay_one(&with_begin, builder.into_part(PartKind::Transition), true)?
        } else {
            with_begin
        };

        // Coasting ahead of each braking phase, last to first.
        let mut builder = OverlayEnvelopeBuilder::backward(&with_end);
        for end_pos in coasting_ends(&with_end, low_limit).into_iter().rev() {
            if end_pos > builder.last_pos() {
                continue;
            }
            let Some(part) = coast_from_end(&with_end, ctx, end_pos, low_limit) else {
                continue;
            };
            if part.end_pos() > builder.last_pos() {
                continue;
            }
            builder.add_part(part)?;
        }
        Ok(builder.build()?)
    }

    /// Search the margin parameters for a running time of `target` seconds.
    pub(crate) fn solve(&self, target: f64, config: &AllowanceConfig) -> AllowanceResult<Envelope> {
        let v_max = self.base.max_speed();
        let full_coasting = self.envelope(v_max, self.low_limit_for(v_max))?;
        let full_time = full_coasting.total_time();
        if (full_time - target).abs() <= config.time_tolerance {
            return Ok(full_coasting);
        }

        if full_time > target {
            log::debug!("coasting alone gives {full_time:.1} s > {target:.1} s, searching low limit");
            self.bisect(self.low_limit_for(v_max), v_max, target, config, |low| {
                self.envelope(v_max, low)
            })
        } else {
            let lowest = self.capacity.max(MIN_V1).min(v_max);
            log::debug!("searching v1 in [{lowest:.2}, {v_max:.2}] for {target:.1} s");
            self.bisect(lowest, v_max, target, config, |v1| {
                self.envelope(v1, self.low_limit_for(v1))
            })
        }
    }

    /// Bisection over a parameter the running time decreases with.
    fn bisect<F>(
        &self,
        mut low:     f64,
        mut high:    f64,
        target:      f64,
        config:      &AllowanceConfig,
        mut attempt: F,
    ) -> AllowanceResult<Envelope>
    where
        F: FnMut(f64) -> AllowanceResult<Envelope>,
    {
        let unreachable = |achieved: f64| AllowanceError::Unreachable {
            begin: self.base.begin_pos(),
            end: self.base.end_pos(),
            target,
            achieved,
        };

        let slowest = attempt(low)?;
        let slowest_time = slowest.total_time();
        if (slowest_time - target).abs() <= config.time_tolerance {
            return Ok(slowest);
        }
        if slowest_time < target {
            return Err(unreachable(slowest_time));
        }

        let mut closest = slowest_time;
        for _ in 0..config.max_iterations {
            let middle = 0.5 * (low + high);
            let envelope = attempt(middle)?;
            let time = envelope.total_time();
            log::trace!("parameter {middle:.4}: {time:.2} s");
            if (time - target).abs() <= config.time_tolerance {
                return Ok(envelope);
            }
            if (time - target).abs() < (closest - target).abs() {
                closest = time;
            }
            if time > target {
                low = middle;
            } else {
                high = middle;
            }
        }
        Err(unreachable(closest))
    }
}
