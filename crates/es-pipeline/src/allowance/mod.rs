//! Running time allowances.
//!
//! An allowance asks for extra running time over a range of the path.  The
//! engine spends it where it saves the most energy: capping the speed and
//! coasting ahead of braking phases.
//!
//! ```text
//! ranges (fill_ranges)
//!   └─ per range: extra time from its AllowanceValue
//!        └─ split at interior stops into sections, extra time shared
//!             └─ per section: mareco search → section curve
//! base envelope + every section curve overlaid → result
//! ```

pub mod error;
pub mod mareco;
pub mod range;
pub mod value;

pub use error::{AllowanceError, AllowanceResult};
pub use mareco::vf;
pub use range::AllowanceRange;
pub use value::{AllowanceDistribution, AllowanceValue};

use es_core::constants::{POSITION_EPSILON, SPEED_EPSILON};
use es_core::{AllowanceConfig, SimContext};
use es_envelope::{Envelope, OverlayEnvelopeBuilder};

use mareco::MarecoSection;

/// Positions strictly inside `(begin, end)` where the base envelope stops.
fn interior_stops(base: &Envelope, begin: f64, end: f64) -> Vec<f64> {
    let mut stops: Vec<f64> = Vec::new();
    for part in base.parts() {
        for (&x, &v) in part.positions().iter().zip(part.speeds()) {
            let inside = x > begin + POSITION_EPSILON && x < end - POSITION_EPSILON;
            if inside && v < SPEED_EPSILON && stops.last() != Some(&x) {
                stops.push(x);
            }
        }
    }
    stops
}

/// `[begin, end]` cut at the interior stops of `base`.
pub fn sections(base: &Envelope, begin: f64, end: f64) -> Vec<(f64, f64)> {
    let mut bounds = vec![begin];
    bounds.extend(interior_stops(base, begin, end));
    bounds.push(end);
    bounds.windows(2).map(|w| (w[0], w[1])).collect()
}

fn check_partition(begin: f64, end: f64, ranges: &[AllowanceRange]) -> AllowanceResult<()> {
    let mut position = begin;
    for range in ranges {
        if range.begin != position || !(range.begin < range.end) {
            return Err(AllowanceError::InvalidSchedule(format!(
                "ranges must partition [{begin}, {end}]: got [{}, {}] after {position}",
                range.begin, range.end
            )));
        }
        range.value.validate()?;
        position = range.end;
    }
    if position != end {
        return Err(AllowanceError::InvalidSchedule(format!(
            "ranges must partition [{begin}, {end}]: coverage stops at {position}"
        )));
    }
    Ok(())
}

/// Apply `ranges` to `base` over `[begin_pos, end_pos]`.
///
/// `ranges` must partition `[begin_pos, end_pos]`, as returned by
/// [`AllowanceRange::fill_ranges`].  Margin-driven slowing never goes below
/// `capacity_speed_limit` unless the base already does.
pub fn apply_allowance(
    ctx:                  &SimContext<'_>,
    base:                 &Envelope,
    begin_pos:            f64,
    end_pos:              f64,
    capacity_speed_limit: f64,
    ranges:               &[AllowanceRange],
    config:               &AllowanceConfig,
) -> AllowanceResult<Envelope> {
    if begin_pos < base.begin_pos() || end_pos > base.end_pos() {
        return Err(AllowanceError::InvalidSchedule(format!(
            "allowance bounds [{begin_pos}, {end_pos}] exceed the envelope [{}, {}]",
            base.begin_pos(),
            base.end_pos()
        )));
    }
    if !(capacity_speed_limit.is_finite() && capacity_speed_limit >= 0.0) {
        return Err(AllowanceError::InvalidSchedule(format!(
            "capacity speed limit must be non-negative, got {capacity_speed_limit}"
        )));
    }
    check_partition(begin_pos, end_pos, ranges)?;

    let mut builder = OverlayEnvelopeBuilder::forward(base);
    for range in ranges {
        let range_time = base.time_between(range.begin, range.end);
        let extra = range.value.extra_time(range_time, range.length());
        log::debug!(
            "allowance [{}, {}]: {extra:.1} s on top of {range_time:.1} s",
            range.begin,
            range.end
        );

        for (begin, end) in sections(base, range.begin, range.end) {
            let share = match range.value.distribution() {
                AllowanceDistribution::DistanceRatio => (end - begin) / range.length(),
                AllowanceDistribution::TimeRatio => base.time_between(begin, end) / range_time,
            };
            let section_extra = extra * share;
            if section_extra <= config.time_tolerance {
                continue;
            }
            let section_base = base.slice(begin, end)?;
            let target = section_base.total_time() + section_extra;
            let section = MarecoSection::new(*ctx, &section_base, capacity_speed_limit);
            let slowed = section.solve(target, config)?;
            for part in slowed.into_parts() {
                builder.add_part(part)?;
            }
        }
    }
    Ok(builder.build()?)
}
