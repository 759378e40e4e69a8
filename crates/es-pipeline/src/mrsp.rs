//! Most restrictive speed profile.
//!
//! The MRSP is the lowest applicable static speed limit at every position,
//! further capped by the rolling stock's maximum speed.  It is a staircase:
//! every part is a `SpeedLimit` plateau, and adjacent plateaus always differ
//! in speed.

use es_envelope::{Envelope, EnvelopePart, PartKind};

use crate::{PipelineError, PipelineResult};

/// A static speed limit over `[begin, end]`, m and m/s.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedLimit {
    pub begin: f64,
    pub end:   f64,
    pub speed: f64,
}

impl SpeedLimit {
    pub fn new(begin: f64, end: f64, speed: f64) -> Self {
        Self { begin, end, speed }
    }
}

/// Build the MRSP over `[0, path_length]`.
///
/// Limits may overlap (the lowest wins) and may extend past the path; they
/// are clipped.  Positions no limit covers run at `max_speed`.
pub fn build_mrsp(
    path_length: f64,
    max_speed:   f64,
    limits:      &[SpeedLimit],
) -> PipelineResult<Envelope> {
    if !(path_length.is_finite() && path_length > 0.0) {
        return Err(PipelineError::InvalidSpeedLimit {
            index:  0,
            reason: format!("path length must be positive, got {path_length}"),
        });
    }
    if !(max_speed.is_finite() && max_speed > 0.0) {
        return Err(PipelineError::InvalidSpeedLimit {
            index:  0,
            reason: format!("rolling stock max speed must be positive, got {max_speed}"),
        });
    }
    for (index, limit) in limits.iter().enumerate() {
        if !(limit.speed.is_finite() && limit.speed > 0.0) {
            return Err(PipelineError::InvalidSpeedLimit {
                index,
                reason: format!("speed must be positive, got {}", limit.speed),
            });
        }
        if !(limit.begin < limit.end) {
            return Err(PipelineError::InvalidSpeedLimit {
                index,
                reason: format!("empty range [{}, {}]", limit.begin, limit.end),
            });
        }
    }

    let mut bounds: Vec<f64> = limits
        .iter()
        .flat_map(|l| [l.begin, l.end])
        .filter(|&x| x > 0.0 && x < path_length)
        .collect();
    bounds.push(0.0);
    bounds.push(path_length);
    bounds.sort_by(f64::total_cmp);
    bounds.dedup();

    // (begin, end, speed) plateaus with equal neighbours merged.
    let mut plateaus: Vec<(f64, f64, f64)> = Vec::with_capacity(bounds.len());
    for w in bounds.windows(2) {
        let (begin, end) = (w[0], w[1]);
        let middle = 0.5 * (begin + end);
        let speed = limits
            .iter()
            .filter(|l| l.begin <= middle && middle < l.end)
            .map(|l| l.speed)
            .fold(max_speed, f64::min);
        match plateaus.last_mut() {
            Some(last) if last.2 == speed => last.1 = end,
            _ => plateaus.push((begin, end, speed)),
        }
    }
    log::debug!(
        "MRSP over {path_length} m: {} limits, {} plateaus",
        limits.len(),
        plateaus.len()
    );

    let parts = plateaus
        .into_iter()
        .map(|(begin, end, speed)| {
            EnvelopePart::new(PartKind::SpeedLimit, vec![begin, end], vec![speed, speed])
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Envelope::new(parts)?)
}
