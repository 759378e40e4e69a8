//! Coasting phases ending at a given position.

use es_core::SimContext;
use es_envelope::{ConstrainedPartBuilder, Envelope, EnvelopePart, PartConstraint, PartKind};
use es_physics::{Action, overlays, step};

/// Coast forward from `start` until the envelope is met again.  Speeds must
/// stay above `low_speed_limit`.
fn coast_from_start(
    envelope:        &Envelope,
    ctx:             &SimContext<'_>,
    start:           f64,
    low_speed_limit: f64,
) -> Option<EnvelopePart> {
    let mut builder = ConstrainedPartBuilder::forward(vec![
        PartConstraint::speed_floor(low_speed_limit),
        PartConstraint::envelope_ceiling(envelope),
    ]);
    let speed = envelope.interpolate_speed(start);
    if !overlays::coast(ctx, &mut builder, start, speed) {
        return None;
    }
    if builder.last_intersection() == Some(0) {
        return None;
    }
    builder.into_part(PartKind::Coasting)
}

/// A coasting part ending at `end_pos` on `envelope`, never slower than
/// `low_speed_limit`.
///
/// The coast is integrated backward from the envelope speed at `end_pos`
/// until it meets the envelope.  If it had to be held at the low limit, or
/// ran back into the envelope's begin, the real coasting curve would not
/// connect; one forward coast from where the backward pass stopped is tried
/// instead.  `None` means there is no coasting opportunity.
pub fn coast_from_end(
    envelope:        &Envelope,
    ctx:             &SimContext<'_>,
    end_pos:         f64,
    low_speed_limit: f64,
) -> Option<EnvelopePart> {
    let mut builder = ConstrainedPartBuilder::backward(vec![
        PartConstraint::speed_floor(0.0),
        PartConstraint::envelope_ceiling(envelope),
    ]);
    let mut position = end_pos;
    let mut speed = envelope.interpolate_speed(end_pos);
    if !builder.init_envelope_part(position, speed) {
        return None;
    }

    let mut reached_low_limit = false;
    loop {
        let next = step(ctx, position, speed, Action::Coast, -1.0);
        position += next.displacement();
        speed = next.end_speed;
        if speed < low_speed_limit {
            speed = low_speed_limit;
            reached_low_limit = true;
        }
        if !builder.add_step(position, speed, next.time_delta) || position <= 0.0 {
            break;
        }
    }

    let reached = builder.last_pos()?;
    if builder.step_count() == 0 {
        return None;
    }
    if !reached_low_limit && reached > envelope.begin_pos() {
        return builder.into_part(PartKind::Coasting);
    }

    log::trace!("backward coast from {end_pos} m stopped at {reached} m, retrying forward");
    let part = coast_from_start(envelope, ctx, reached, low_speed_limit)?;
    (part.end_pos() <= end_pos).then_some(part)
}
