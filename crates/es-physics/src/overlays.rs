//! Integration loops feeding a [`ConstrainedPartBuilder`].
//!
//! Each primitive places the initial point, then integrates one action
//! until the builder stops accepting steps.  The builder's direction decides
//! whether integration runs forward or backward.  They return `false` when
//! the initial point itself violates a constraint.
//!
//! Loops end when a constraint is hit, when a step makes no progress (e.g.
//! a stopped train that cannot start), or when the train leaves the path.
//! Steps shorter than the position tolerance still count as progress while
//! the speed changes, so short time steps can leave a standstill.
//! Builders should carry a constraint bounding the part's range; the path
//! bounds are a last resort.

use es_core::{BrakingType, SimContext};
use es_envelope::ConstrainedPartBuilder;

use crate::integrator::{Action, step_with_braking};

fn run(
    ctx:          &SimContext<'_>,
    builder:      &mut ConstrainedPartBuilder<'_>,
    position:     f64,
    speed:        f64,
    action:       Action,
    braking_type: BrakingType,
) -> bool {
    if !builder.init_envelope_part(position, speed) {
        return false;
    }
    let direction = builder.direction();
    let length = ctx.path_length();
    let (mut position, mut speed) = (position, speed);
    loop {
        let step = step_with_braking(ctx, position, speed, action, direction, braking_type);
        position += step.displacement();
        speed = step.end_speed;
        if !builder.add_step(position, speed, step.time_delta) {
            break;
        }
        let left_path = if direction > 0.0 { position >= length } else { position <= 0.0 };
        if left_path {
            break;
        }
    }
    log::trace!(
        "{action:?} part from {} m: {} steps, stopped by constraint {:?}",
        position,
        builder.step_count(),
        builder.last_intersection()
    );
    true
}

/// Full traction from `(position, speed)`.
pub fn accelerate(
    ctx:      &SimContext<'_>,
    builder:  &mut ConstrainedPartBuilder<'_>,
    position: f64,
    speed:    f64,
) -> bool {
    run(ctx, builder, position, speed, Action::Accelerate, ctx.braking_type)
}

/// Hold the speed where traction allows.
pub fn maintain(
    ctx:      &SimContext<'_>,
    builder:  &mut ConstrainedPartBuilder<'_>,
    position: f64,
    speed:    f64,
) -> bool {
    run(ctx, builder, position, speed, Action::Maintain, ctx.braking_type)
}

/// Brake with the context's deceleration policy.
pub fn decelerate(
    ctx:      &SimContext<'_>,
    builder:  &mut ConstrainedPartBuilder<'_>,
    position: f64,
    speed:    f64,
) -> bool {
    run(ctx, builder, position, speed, Action::Brake, ctx.braking_type)
}

/// Brake with an explicit deceleration policy.
pub fn decelerate_with(
    ctx:          &SimContext<'_>,
    builder:      &mut ConstrainedPartBuilder<'_>,
    position:     f64,
    speed:        f64,
    braking_type: BrakingType,
) -> bool {
    run(ctx, builder, position, speed, Action::Brake, braking_type)
}

/// Zero traction from `(position, speed)`.
pub fn coast(
    ctx:      &SimContext<'_>,
    builder:  &mut ConstrainedPartBuilder<'_>,
    position: f64,
    speed:    f64,
) -> bool {
    run(ctx, builder, position, speed, Action::Coast, ctx.braking_type)
}
