//! Tractive effort curves and their assignment to path ranges.
//!
//! A train may have several effort curves along its path (electrified vs.
//! non-electrified sections, power restrictions, …).  [`EffortCurveMap`]
//! stores them as sorted, non-overlapping position intervals and answers
//! point queries by binary search.

use std::sync::Arc;

use crate::{CoreError, CoreResult};

// ── TractiveEffortCurve ───────────────────────────────────────────────────────

/// The maximum effort (N) available at a given speed (m/s).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TractiveEffortPoint {
    pub speed:      f64,
    pub max_effort: f64,
}

impl TractiveEffortPoint {
    pub const fn new(speed: f64, max_effort: f64) -> Self {
        Self { speed, max_effort }
    }
}

/// Piecewise-linear speed → max effort curve, sorted by speed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TractiveEffortCurve {
    points: Vec<TractiveEffortPoint>,
}

impl TractiveEffortCurve {
    /// Build a curve from points sorted by strictly increasing speed.
    pub fn new(points: Vec<TractiveEffortPoint>) -> CoreResult<Self> {
        if points.is_empty() {
            return Err(CoreError::EffortCurve("curve has no points".into()));
        }
        for w in points.windows(2) {
            if !(w[0].speed < w[1].speed) {
                return Err(CoreError::EffortCurve(format!(
                    "speeds must be strictly increasing (got {} then {})",
                    w[0].speed, w[1].speed
                )));
            }
        }
        if points.iter().any(|p| !p.max_effort.is_finite() || p.max_effort < 0.0) {
            return Err(CoreError::EffortCurve("efforts must be finite and non-negative".into()));
        }
        Ok(Self { points })
    }

    /// A curve delivering `effort` at every speed.
    pub fn constant(effort: f64) -> Self {
        Self { points: vec![TractiveEffortPoint::new(0.0, effort)] }
    }

    pub fn points(&self) -> &[TractiveEffortPoint] {
        &self.points
    }

    /// Max effort at `speed`, linearly interpolated between the bracketing
    /// points and clamped to the first/last point outside the curve.
    ///
    /// The curve is symmetric: the sign of `speed` is ignored.
    pub fn max_effort(&self, speed: f64) -> f64 {
        let speed = speed.abs();
        let pts = &self.points;
        let index = pts.partition_point(|p| p.speed < speed);
        if index == 0 {
            return pts[0].max_effort;
        }
        if index == pts.len() {
            return pts[index - 1].max_effort;
        }
        let prev = pts[index - 1];
        let next = pts[index];
        let coeff = (next.max_effort - prev.max_effort) / (next.speed - prev.speed);
        prev.max_effort + coeff * (speed - prev.speed)
    }
}

// ── EffortCurveMap ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct CurveInterval {
    begin: f64,
    end:   f64,
    curve: Arc<TractiveEffortCurve>,
}

/// Sorted `(begin, end, curve)` intervals over path positions.
///
/// Interval bounds are inclusive; at a shared bound the leftmost interval
/// wins.  A position outside every interval has no curve, which callers in
/// the integrator treat as a broken invariant.
#[derive(Clone, Debug, Default)]
pub struct EffortCurveMap {
    intervals: Vec<CurveInterval>,
}

impl EffortCurveMap {
    /// A map with a single curve over `[0, length]`.
    pub fn single(length: f64, curve: TractiveEffortCurve) -> Self {
        Self {
            intervals: vec![CurveInterval { begin: 0.0, end: length, curve: Arc::new(curve) }],
        }
    }

    /// Build from arbitrary-order intervals.  Rejects empty or inverted
    /// intervals and any overlap.
    pub fn new(intervals: Vec<(f64, f64, TractiveEffortCurve)>) -> CoreResult<Self> {
        let mut intervals: Vec<CurveInterval> = intervals
            .into_iter()
            .map(|(begin, end, curve)| CurveInterval { begin, end, curve: Arc::new(curve) })
            .collect();
        intervals.sort_by(|a, b| a.begin.total_cmp(&b.begin));

        for iv in &intervals {
            if !(iv.begin < iv.end) {
                return Err(CoreError::EffortInterval {
                    begin:  iv.begin,
                    end:    iv.end,
                    reason: "is empty or inverted",
                });
            }
        }
        for w in intervals.windows(2) {
            if w[1].begin < w[0].end {
                return Err(CoreError::EffortInterval {
                    begin:  w[1].begin,
                    end:    w[1].end,
                    reason: "overlaps the previous interval",
                });
            }
        }
        Ok(Self { intervals })
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// The curve covering `position`, if any.
    pub fn get(&self, position: f64) -> Option<&TractiveEffortCurve> {
        let index = self.intervals.partition_point(|iv| iv.end < position);
        let iv = self.intervals.get(index)?;
        (iv.begin <= position).then(|| iv.curve.as_ref())
    }
}
