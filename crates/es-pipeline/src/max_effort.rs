//! The fastest physically achievable run under a maximum speed envelope.
//!
//! Starting from the initial speed, the train accelerates at full effort
//! until it meets the ceiling, and again after every upward step of the
//! ceiling.  On plateaus it holds the speed; where a steep rising grade
//! makes that impossible it falls back to full effort and catches up with
//! the plateau further on.  The result never jumps in speed.

use es_core::SimContext;
use es_core::constants::{are_positions_equal, are_speeds_equal};
use es_envelope::{
    ConstrainedPartBuilder, Envelope, EnvelopeCursor, EnvelopePart, OverlayEnvelopeBuilder,
    PartConstraint, PartKind,
};
use es_physics::overlays;

use crate::{PipelineError, PipelineResult};

/// Index of the ceiling in the constraint lists built below.
const CEILING: usize = 1;

/// Distance skipped when a plateau can neither be held nor caught up with, m.
const PLATEAU_SKIP: f64 = 1.0;

/// Whether `part` is a constant-speed plateau.
pub fn is_plateau(part: &EnvelopePart) -> bool {
    part.min_speed() == part.max_speed()
}

/// Full effort from `(position, speed)` until the ceiling is met.  Returns
/// where the curve ended.
fn accelerate(
    ctx:      &SimContext<'_>,
    ceiling:  &Envelope,
    position: f64,
    speed:    f64,
    kind:     PartKind,
    builder:  &mut OverlayEnvelopeBuilder<'_>,
) -> PipelineResult<f64> {
    let mut part_builder = ConstrainedPartBuilder::forward(vec![
        PartConstraint::speed_floor(0.0),
        PartConstraint::envelope_ceiling(ceiling),
    ]);
    overlays::accelerate(ctx, &mut part_builder, position, speed);
    let end = part_builder.last_pos().unwrap_or(position);
    let hit_ceiling = part_builder.last_intersection() == Some(CEILING);
    match part_builder.into_part(kind) {
        Some(part) if hit_ceiling => builder.add_part(part)?,
        // Started right on the ceiling.
        None if hit_ceiling => {}
        _ => {
            log::warn!("train stalled at {end} m under full effort");
            return Err(PipelineError::ImpossibleSimulation { position: end });
        }
    }
    Ok(end)
}

/// Hold the plateau under the cursor, catching up if a grade slows the
/// train down.  Leaves the cursor past whatever was built.
fn hold_plateau(
    ctx:     &SimContext<'_>,
    ceiling: &Envelope,
    builder: &mut OverlayEnvelopeBuilder<'_>,
    cursor:  &mut EnvelopeCursor<'_>,
) -> PipelineResult<()> {
    let start = cursor.position();
    let speed = cursor.speed();
    let end = cursor.part().end_pos();

    let mut part_builder = ConstrainedPartBuilder::forward(vec![
        PartConstraint::speed_equal(speed),
        PartConstraint::position_range(start, end),
    ]);
    overlays::maintain(ctx, &mut part_builder, start, speed);
    let held_until = part_builder.last_pos().unwrap_or(start);
    if let Some(part) = part_builder.into_part(PartKind::ConstantSpeed) {
        builder.add_part(part)?;
    }
    if are_positions_equal(held_until, end) || held_until >= end {
        cursor.next_part();
        return Ok(());
    }

    log::trace!("plateau at {speed} m/s lost at {held_until} m, catching up");
    let caught_up = accelerate(ctx, ceiling, held_until, speed, PartKind::CatchingUp, builder)?;
    let resume = if caught_up > held_until {
        caught_up
    } else {
        (held_until + PLATEAU_SKIP).min(end)
    };
    if resume >= ceiling.end_pos() || !cursor.find_position(resume) {
        cursor.next_part();
    }
    Ok(())
}

/// Build the max effort envelope over `max_speed`, starting at
/// `initial_speed` from its begin.
pub fn max_effort_envelope(
    ctx:           &SimContext<'_>,
    initial_speed: f64,
    max_speed:     &Envelope,
) -> PipelineResult<Envelope> {
    let end = max_speed.end_pos();
    let mut builder = OverlayEnvelopeBuilder::forward(max_speed);
    let mut cursor = EnvelopeCursor::forward(max_speed);

    let begin = max_speed.begin_pos();
    if initial_speed < max_speed.interpolate_speed_right_dir(begin) {
        let reached =
            accelerate(ctx, max_speed, begin, initial_speed, PartKind::Accelerating, &mut builder)?;
        if reached >= end || !cursor.find_position(reached) {
            return Ok(builder.build()?);
        }
    }

    while !cursor.has_reached_end() && cursor.position() < end {
        // The ceiling steps up where the cursor stands: accelerate from the
        // speed the train arrives with.
        let position = cursor.position();
        let arriving = max_speed.interpolate_speed_left_dir(position);
        if position > begin && arriving < cursor.speed() && !are_speeds_equal(arriving, cursor.speed())
        {
            let reached =
                accelerate(ctx, max_speed, position, arriving, PartKind::Accelerating, &mut builder)?;
            if reached > position {
                if reached >= end || !cursor.find_position(reached) {
                    break;
                }
                continue;
            }
        }
        if cursor.check_part(is_plateau) {
            hold_plateau(ctx, max_speed, &mut builder, &mut cursor)?;
        } else {
            cursor.next_part();
        }
    }

    let envelope = builder.build()?;
    if let Some(w) = envelope
        .parts()
        .windows(2)
        .find(|w| !are_speeds_equal(w[0].end_speed(), w[1].begin_speed()))
    {
        return Err(PipelineError::Discontinuity {
            position: w[0].end_pos(),
            from:     w[0].end_speed(),
            to:       w[1].begin_speed(),
        });
    }
    Ok(envelope)
}
