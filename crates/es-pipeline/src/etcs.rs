//! ETCS braking curves at ends and limits of authority.
//!
//! Inside the ETCS application ranges, stops are ends of authority (EOA)
//! and speed limit decreases are limits of authority (LOA).  The train
//! follows the indication curve, derived from a reference braking curve
//! (SUBSET-026 v4.0.0, §3.13.9):
//!
//! ```text
//! EOA:  SBD ───────────────▶ SBI ─▶ PS ─(GUI)─▶ IND
//! LOA:  EBD ─(BEC)─▶ EBI ──▶ SBI ─▶ PS ─(GUI)─▶ IND
//! ```
//!
//! Each indication curve is then cut where it meets the envelope it is laid
//! over.

use es_core::constants::{A_EST2, MAX_BEC_DELTA_SPEED, T_DRIVER, T_WARNING};
use es_core::etcs::{dv_ebi, v_delta0};
use es_core::{BrakingType, EtcsBrakeParams, SimContext};
use es_envelope::part::interpolate_step_position;
use es_envelope::{
    ConstrainedPartBuilder, Envelope, EnvelopePart, OverlayEnvelopeBuilder, PartConstraint,
    PartKind,
};
use es_physics::integrator::{compute_acceleration, grade_weight_force, min_grade};
use es_physics::overlays;

use crate::{PipelineError, PipelineResult};

/// A speed limit decrease handled with ETCS curves: the train must be down
/// to `speed` at `position`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LimitOfAuthority {
    pub position: f64,
    pub speed:    f64,
}

/// A stop handled with ETCS curves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EndOfAuthority {
    pub position:   f64,
    /// Index of the stop in the caller's stop list.
    pub stop_index: usize,
}

/// The ETCS brake parameters of the context's rolling stock.
pub fn etcs_params<'a>(ctx: &SimContext<'a>) -> PipelineResult<&'a EtcsBrakeParams> {
    ctx.rolling_stock
        .etcs_brake_params()
        .ok_or(PipelineError::MissingEtcsParams)
}

// ── Reference curves ──────────────────────────────────────────────────────────

/// Braking curve of `braking_type` reaching `target_speed` at
/// `target_position`, integrated backward under a flat `overhead_speed`.
///
/// An EBD curve towards a non-zero target is shifted forward so that it
/// crosses the target position at `target_speed + dv_ebi(target_speed)`.
pub fn braking_curve(
    ctx:             &SimContext<'_>,
    overhead_speed:  f64,
    target_position: f64,
    target_speed:    f64,
    braking_type:    BrakingType,
) -> PipelineResult<EnvelopePart> {
    let overhead = Envelope::from_part(EnvelopePart::new(
        PartKind::ConstantSpeed,
        vec![0.0, target_position],
        vec![overhead_speed, overhead_speed],
    )?);
    let mut builder = ConstrainedPartBuilder::backward(vec![
        PartConstraint::position_range(0.0, target_position),
        PartConstraint::speed_floor(target_speed),
        PartConstraint::envelope_ceiling(&overhead),
    ]);
    overlays::decelerate_with(ctx, &mut builder, target_position, target_speed, braking_type);
    let curve = builder.into_part(PartKind::Braking).ok_or(PipelineError::EtcsCurve {
        position: target_position,
        reason:   "no room to brake",
    })?;

    if braking_type != BrakingType::EtcsEbd || target_speed == 0.0 {
        return Ok(curve);
    }
    let speed_at_target = target_speed + dv_ebi(target_speed);
    if speed_at_target > curve.begin_speed() || speed_at_target < curve.end_speed() {
        return Ok(curve);
    }
    let Some(crossing) = curve.interpolate_position(speed_at_target) else {
        return Ok(curve);
    };
    let offset = target_position - crossing;
    let positions = curve.positions().iter().map(|p| p + offset).collect();
    let shifted = EnvelopePart::new(PartKind::Braking, positions, curve.speeds().to_vec())?;
    shifted.slice(0.0, f64::INFINITY).ok_or(PipelineError::EtcsCurve {
        position: target_position,
        reason:   "shifted EBD lies before the path start",
    })
}

/// Distance and speed offsets between the EBD and EBI curves at one speed.
#[derive(Copy, Clone, Debug, PartialEq)]
struct BecParams {
    distance: f64,
    speed:    f64,
}

/// §3.13.9.3.2: the train keeps accelerating while traction is cut off, then
/// coasts until the emergency brake builds up.
fn bec_params(
    ctx:          &SimContext<'_>,
    params:       &EtcsBrakeParams,
    ebd:          &EnvelopePart,
    speed:        f64,
    target_speed: f64,
) -> BecParams {
    let rolling_stock = ctx.rolling_stock;
    let position = ebd.interpolate_position(speed).unwrap_or(ebd.end_pos());
    let weight = grade_weight_force(rolling_stock, min_grade(ctx, position));
    let traction = ctx.effort_curve_at(position).max_effort(speed);

    let t_traction = (params.t_traction_cut_off - (T_WARNING + params.t_bs2)).max(0.0);
    let a_est1 = compute_acceleration(
        rolling_stock,
        rolling_stock.rolling_resistance(speed),
        weight,
        speed,
        traction,
        1.0,
    );
    let v_delta0 = v_delta0(speed);
    let v_delta1 = a_est1 * t_traction;
    let t_berem = (params.t_be - t_traction).max(0.0);
    let v_delta2 = A_EST2 * t_berem;

    let max_v = (speed + v_delta0 + v_delta1).max(target_speed);
    let distance = (speed + v_delta0 + v_delta1 / 2.0).max(target_speed) * t_traction
        + (max_v + v_delta1 / 2.0) * t_berem;
    let v_bec = max_v + v_delta2;
    BecParams { distance, speed: v_bec - speed }
}

/// Samples with strictly increasing positions, as a part.
fn monotonic_part(
    kind:      PartKind,
    positions: Vec<f64>,
    speeds:    Vec<f64>,
) -> PipelineResult<EnvelopePart> {
    let mut kept_positions: Vec<f64> = Vec::with_capacity(positions.len());
    let mut kept_speeds = Vec::with_capacity(speeds.len());
    for (position, speed) in positions.into_iter().zip(speeds) {
        if kept_positions.last().is_some_and(|&last| position <= last) {
            continue;
        }
        kept_positions.push(position);
        kept_speeds.push(speed);
    }
    Ok(EnvelopePart::new(kind, kept_positions, kept_speeds)?)
}

/// EBI curve from the EBD curve, ending at `target_speed`.
fn ebi_from_ebd(
    ctx:          &SimContext<'_>,
    params:       &EtcsBrakeParams,
    ebd:          &EnvelopePart,
    target_speed: f64,
) -> PipelineResult<EnvelopePart> {
    let mut positions = Vec::with_capacity(ebd.point_count());
    let mut speeds = Vec::with_capacity(ebd.point_count());
    for (&position, &speed) in ebd.positions().iter().zip(ebd.speeds()) {
        let bec = bec_params(ctx, params, ebd, speed, target_speed);
        positions.push(position - bec.distance);
        speeds.push(speed - bec.speed);
    }

    if let Some(end) = speeds.iter().position(|&v| v <= target_speed) {
        if end == 0 {
            return Err(PipelineError::EtcsCurve {
                position: ebd.end_pos(),
                reason:   "EBI curve never exceeds the target speed",
            });
        }
        let crossing = interpolate_step_position(
            positions[end - 1],
            speeds[end - 1],
            positions[end],
            speeds[end].max(0.0),
            target_speed,
        );
        positions.truncate(end);
        speeds.truncate(end);
        positions.push(crossing);
        speeds.push(target_speed);
    }
    monotonic_part(PartKind::Braking, positions, speeds)
}

/// Indication curve from an EBI (`t_bs = T_bs2`) or SBD (`t_bs = T_bs1`)
/// reference curve, never later than the guidance curve.
fn indication_curve(
    reference: &EnvelopePart,
    t_bs:      f64,
    guidance:  &EnvelopePart,
    kind:      PartKind,
) -> PipelineResult<EnvelopePart> {
    let t_indication = (0.8 * t_bs).max(5.0) + T_DRIVER;
    let (gui_min, gui_max) = (guidance.min_speed(), guidance.max_speed());
    let mut positions = Vec::with_capacity(reference.point_count());
    for (&position, &speed) in reference.positions().iter().zip(reference.speeds()) {
        let service_intervention = position - speed * t_bs;
        let permitted = service_intervention - speed * T_DRIVER;
        let guidance_position = if speed < gui_min || speed > gui_max {
            f64::INFINITY
        } else {
            guidance.interpolate_position(speed).unwrap_or(f64::INFINITY)
        };
        positions.push(permitted.min(guidance_position) - speed * t_indication);
    }
    monotonic_part(kind, positions, reference.speeds().to_vec())
}

/// The end of `curve` that lies under `overlay` and after `begin_pos`,
/// rebuilt backward from its last point.  `None` when less than two steps
/// survive.
fn keep_under_overlay(
    curve:     &EnvelopePart,
    overlay:   &Envelope,
    begin_pos: f64,
) -> Option<EnvelopePart> {
    if curve.end_pos() <= begin_pos {
        return None;
    }
    let mut builder = ConstrainedPartBuilder::backward(vec![
        PartConstraint::position_range(begin_pos, overlay.end_pos()),
        PartConstraint::envelope_ceiling(overlay),
    ]);
    let last = curve.point_count() - 1;
    if !builder.init_envelope_part(curve.position(last), curve.speed(last)) {
        return None;
    }
    for step in (0..curve.step_count()).rev() {
        if !builder.add_step(curve.position(step), curve.speed(step), curve.step_time(step)) {
            break;
        }
    }
    if builder.step_count() <= 1 {
        return None;
    }
    builder.into_part(curve.kind())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

/// Indication curves ahead of every end of authority.
///
/// Curves are laid over `envelope` in position order; each one may start no
/// earlier than the previous end of authority.
pub fn add_eoa_curves(
    ctx:      &SimContext<'_>,
    envelope: &Envelope,
    eoas:     &[EndOfAuthority],
) -> PipelineResult<Envelope> {
    if eoas.is_empty() {
        return Ok(envelope.clone());
    }
    let params = etcs_params(ctx)?;
    let mut eoas = eoas.to_vec();
    eoas.sort_by(|a, b| a.position.total_cmp(&b.position));

    let max_speed = envelope.max_speed();
    let mut begin_pos = envelope.begin_pos();
    let mut builder = OverlayEnvelopeBuilder::forward(envelope);
    for eoa in eoas {
        if eoa.position <= begin_pos {
            continue;
        }
        let sbd = braking_curve(ctx, max_speed, eoa.position, 0.0, BrakingType::EtcsSbd)?;
        let gui = braking_curve(ctx, max_speed, eoa.position, 0.0, BrakingType::EtcsGui)?;
        let full = indication_curve(&sbd, params.t_bs1, &gui, PartKind::Stop(eoa.stop_index))?;
        let curve = keep_under_overlay(&full, envelope, begin_pos).ok_or(
            PipelineError::MissingStopCurve { index: eoa.stop_index, position: eoa.position },
        )?;
        log::trace!(
            "end of authority {} at {} m: indication from {} m",
            eoa.stop_index,
            eoa.position,
            curve.begin_pos()
        );
        builder.add_part(curve)?;
        begin_pos = eoa.position;
    }
    Ok(builder.build()?)
}

/// Indication curves ahead of every limit of authority.
///
/// The envelope is rebuilt after each limit so later curves are cut by the
/// earlier ones.  Where the indication curve reaches the target speed before
/// the limit, the target speed is held up to it.
pub fn add_loa_curves(
    ctx:      &SimContext<'_>,
    envelope: &Envelope,
    loas:     &[LimitOfAuthority],
) -> PipelineResult<Envelope> {
    if loas.is_empty() {
        return Ok(envelope.clone());
    }
    let params = etcs_params(ctx)?;
    let mut loas = loas.to_vec();
    loas.sort_by(|a, b| a.position.total_cmp(&b.position));

    let begin_pos = envelope.begin_pos();
    let mut current = envelope.clone();
    for loa in loas {
        let overhead_speed = current.max_speed() + MAX_BEC_DELTA_SPEED;
        let ebd = braking_curve(ctx, overhead_speed, loa.position, loa.speed, BrakingType::EtcsEbd)?;
        let gui = braking_curve(ctx, overhead_speed, loa.position, loa.speed, BrakingType::EtcsGui)?;
        let ebi = ebi_from_ebd(ctx, params, &ebd, loa.speed)?;
        let full = indication_curve(&ebi, params.t_bs2, &gui, PartKind::Deceleration)?;

        let mut builder = OverlayEnvelopeBuilder::forward(&current);
        let mut reached = begin_pos;
        if let Some(curve) = keep_under_overlay(&full, &current, begin_pos) {
            reached = curve.end_pos();
            builder.add_part(curve)?;
        }
        if reached < loa.position {
            builder.add_part(EnvelopePart::new(
                PartKind::Deceleration,
                vec![reached, loa.position],
                vec![loa.speed, loa.speed],
            )?)?;
        }
        log::trace!("limit of authority at {} m: target speed held from {reached} m", loa.position);
        let next = builder.build()?;
        current = next;
    }
    Ok(current)
}
