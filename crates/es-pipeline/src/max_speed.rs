//! Braking curves over the MRSP.
//!
//! The maximum speed envelope is the highest speed the train may run at
//! while still being able to respect every speed limit decrease and every
//! stop.  It is built in two passes:
//!
//! 1. **Decelerations**: scanning the MRSP backward, every place where the
//!    limit drops gets a braking curve, integrated backward from the lower
//!    speed until it meets the higher limit.
//! 2. **Stops**: for each stop, a braking curve integrated backward from
//!    speed 0 until it meets the envelope built so far.
//!
//! When the context carries ETCS application ranges, decreases and stops
//! inside them get ETCS indication curves (see [`crate::etcs`]) before the
//! constant deceleration curves are laid over the rest.

use es_core::SimContext;
use es_core::constants::{SPEED_EPSILON, are_positions_equal};
use es_envelope::{
    ConstrainedPartBuilder, Envelope, EnvelopeCursor, OverlayEnvelopeBuilder, PartConstraint,
    PartKind,
};
use es_physics::overlays;

use crate::etcs::{self, EndOfAuthority, LimitOfAuthority};
use crate::{PipelineError, PipelineResult};

/// Transition predicate: speed rises in traversal order.
pub fn increase(_prev_pos: f64, prev_speed: f64, _next_pos: f64, next_speed: f64) -> bool {
    prev_speed < next_speed
}

/// Transition predicate: speed falls in traversal order.
pub fn decrease(_prev_pos: f64, prev_speed: f64, _next_pos: f64, next_speed: f64) -> bool {
    prev_speed > next_speed
}

/// Limits of authority at every speed limit decrease inside the ETCS
/// application ranges.
fn etcs_limits_of_authority(ctx: &SimContext<'_>, envelope: &Envelope) -> Vec<LimitOfAuthority> {
    let mut cursor = EnvelopeCursor::backward(envelope);
    let mut limits = Vec::new();
    while cursor.find_part_transition(increase) {
        if ctx.is_etcs_position(cursor.position()) {
            limits.push(LimitOfAuthority { position: cursor.position(), speed: cursor.speed() });
        }
        cursor.next_part();
    }
    limits
}

/// Constant deceleration curves at every remaining decrease of `envelope`.
fn add_constant_deceleration_curves(
    ctx:      &SimContext<'_>,
    envelope: &Envelope,
) -> PipelineResult<Envelope> {
    let mut builder = OverlayEnvelopeBuilder::backward(envelope);
    let mut cursor = EnvelopeCursor::backward(envelope);
    let mut last_position = f64::INFINITY;

    while cursor.find_part_transition(increase) {
        // Already below an earlier (in scan order) braking curve.
        if cursor.position() > last_position {
            cursor.next_part();
            continue;
        }
        let mut part_builder = ConstrainedPartBuilder::backward(vec![
            PartConstraint::speed_floor(0.0),
            PartConstraint::envelope_ceiling(envelope),
        ]);
        overlays::decelerate(ctx, &mut part_builder, cursor.position(), cursor.speed());
        if let Some(part) = part_builder.into_part(PartKind::Deceleration) {
            builder.add_part(part)?;
            last_position = builder.last_pos();
        }
        cursor.next_part();
    }
    log::debug!("{} deceleration curves", builder.overlay_count());
    Ok(builder.build()?)
}

/// Braking curves at every speed limit decrease of `mrsp`: ETCS curves
/// inside the application ranges, constant deceleration elsewhere.
pub fn add_deceleration_curves(ctx: &SimContext<'_>, mrsp: &Envelope) -> PipelineResult<Envelope> {
    let limits = etcs_limits_of_authority(ctx, mrsp);
    if limits.is_empty() {
        return add_constant_deceleration_curves(ctx, mrsp);
    }
    log::debug!("{} ETCS limits of authority", limits.len());
    let with_etcs = etcs::add_loa_curves(ctx, mrsp, &limits)?;
    add_constant_deceleration_curves(ctx, &with_etcs)
}

/// A validated stop.
#[derive(Copy, Clone, Debug)]
struct SimStop {
    index:    usize,
    position: f64,
    is_etcs:  bool,
}

/// Stops that need a braking curve, snapped to the path end when past it by
/// less than the position tolerance.
fn sim_stops(ctx: &SimContext<'_>, stops: &[f64]) -> PipelineResult<Vec<SimStop>> {
    let length = ctx.path_length();
    let mut result = Vec::with_capacity(stops.len());
    for (index, &stop) in stops.iter().enumerate() {
        if stop == 0.0 {
            continue;
        }
        let position = if stop > length && are_positions_equal(stop, length) {
            length
        } else if stop < 0.0 || stop > length || stop.is_nan() {
            return Err(PipelineError::OutOfBounds { index, position: stop, length });
        } else {
            stop
        };
        result.push(SimStop { index, position, is_etcs: ctx.is_etcs_position(stop) });
    }
    Ok(result)
}

/// Braking curves ahead of every stop.
///
/// A stop at exactly position 0 needs no curve.  Stops past the path end by
/// less than the position tolerance are moved to the end; farther ones are
/// an error.  A stop the train would otherwise pass at speed must get a
/// curve.
pub fn add_stop_curves(
    ctx:      &SimContext<'_>,
    stops:    &[f64],
    envelope: Envelope,
) -> PipelineResult<Envelope> {
    let stops = sim_stops(ctx, stops)?;
    let ends_of_authority: Vec<EndOfAuthority> = stops
        .iter()
        .filter(|stop| stop.is_etcs)
        .map(|stop| EndOfAuthority { position: stop.position, stop_index: stop.index })
        .collect();
    let mut envelope = etcs::add_eoa_curves(ctx, &envelope, &ends_of_authority)?;

    for stop in stops.iter().filter(|stop| !stop.is_etcs) {
        let (index, position) = (stop.index, stop.position);
        let mut part_builder = ConstrainedPartBuilder::backward(vec![
            PartConstraint::speed_floor(0.0),
            PartConstraint::envelope_ceiling(&envelope),
            PartConstraint::position_range(envelope.begin_pos(), position),
        ]);
        overlays::decelerate(ctx, &mut part_builder, position, 0.0);
        let Some(part) = part_builder.into_part(PartKind::Stop(index)) else {
            if envelope.interpolate_speed_left_dir(position) > SPEED_EPSILON {
                return Err(PipelineError::MissingStopCurve { index, position });
            }
            continue;
        };
        log::trace!("stop {index} at {position} m: braking from {} m", part.begin_pos());
        let mut builder = OverlayEnvelopeBuilder::backward(&envelope);
        builder.add_part(part)?;
        envelope = builder.build()?;
    }
    Ok(envelope)
}

/// The maximum speed envelope: `mrsp` with braking curves for every limit
/// decrease and every stop.
pub fn max_speed_envelope(
    ctx:   &SimContext<'_>,
    stops: &[f64],
    mrsp:  &Envelope,
) -> PipelineResult<Envelope> {
    let with_decelerations = add_deceleration_curves(ctx, mrsp)?;
    add_stop_curves(ctx, stops, with_decelerations)
}
