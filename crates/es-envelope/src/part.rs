//! A single continuous curve segment.
//!
//! # Step model
//!
//! Between two consecutive samples the train is assumed to accelerate at a
//! constant rate, so `v²` is linear in position.  Speed interpolation,
//! intersection solving and the within-step share of a step's duration all
//! use that model.

use crate::{EnvelopeError, EnvelopeResult};

// ── PartKind ──────────────────────────────────────────────────────────────────

/// What produced a part.  Diagnostic only: no algorithm branches on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PartKind {
    /// A plateau of the most restrictive speed profile.
    SpeedLimit,
    /// Braking curve ahead of a speed limit decrease.
    Deceleration,
    /// Braking curve ahead of the stop with this index.
    Stop(usize),
    Accelerating,
    ConstantSpeed,
    /// Acceleration after the train failed to hold a plateau speed.
    CatchingUp,
    Coasting,
    Braking,
    /// A part clipped by a speed cap.
    Capped,
    /// Connection between an allowance section and its neighbours.
    Transition,
}

// ── Step helpers ──────────────────────────────────────────────────────────────

/// Duration of a constant-acceleration step of length `dx`.
#[inline]
pub(crate) fn step_duration(dx: f64, start_speed: f64, end_speed: f64) -> f64 {
    2.0 * dx.abs() / (start_speed + end_speed)
}

/// Speed at `position` on the constant-acceleration step
/// `(start_pos, start_speed) → (end_pos, end_speed)`.
///
/// Works in either traversal direction.
#[inline]
pub fn interpolate_step_speed(
    start_pos:   f64,
    start_speed: f64,
    end_pos:     f64,
    end_speed:   f64,
    position:    f64,
) -> f64 {
    if end_pos == start_pos {
        return start_speed;
    }
    let ratio = (position - start_pos) / (end_pos - start_pos);
    let start_sq = start_speed * start_speed;
    (start_sq + (end_speed * end_speed - start_sq) * ratio).max(0.0).sqrt()
}

/// Position where the constant-acceleration step reaches `speed`, clamped to
/// the step.
#[inline]
pub fn interpolate_step_position(
    start_pos:   f64,
    start_speed: f64,
    end_pos:     f64,
    end_speed:   f64,
    speed:       f64,
) -> f64 {
    let start_sq = start_speed * start_speed;
    let delta_sq = end_speed * end_speed - start_sq;
    if delta_sq == 0.0 {
        return start_pos;
    }
    let ratio = ((speed * speed - start_sq) / delta_sq).clamp(0.0, 1.0);
    start_pos + ratio * (end_pos - start_pos)
}

// ── EnvelopePart ──────────────────────────────────────────────────────────────

/// A curve segment of at least two `(position, speed)` samples.
///
/// Positions are strictly increasing in storage order.  Each step carries a
/// duration; `cumulative_times[i]` is the time from the part's begin to
/// sample `i`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopePart {
    kind:             PartKind,
    positions:        Vec<f64>,
    speeds:           Vec<f64>,
    cumulative_times: Vec<f64>,
}

impl EnvelopePart {
    /// Build a part from samples, deriving step durations from the
    /// constant-acceleration model.
    pub fn new(kind: PartKind, positions: Vec<f64>, speeds: Vec<f64>) -> EnvelopeResult<Self> {
        validate_points(&positions, &speeds)?;
        let durations: Vec<f64> = positions
            .windows(2)
            .zip(speeds.windows(2))
            .map(|(x, v)| step_duration(x[1] - x[0], v[0], v[1]))
            .collect();
        Ok(Self::from_steps(kind, positions, speeds, durations))
    }

    /// Build a part from samples and explicit step durations (s).
    pub fn with_times(
        kind:      PartKind,
        positions: Vec<f64>,
        speeds:    Vec<f64>,
        durations: Vec<f64>,
    ) -> EnvelopeResult<Self> {
        validate_points(&positions, &speeds)?;
        if durations.len() + 1 != positions.len() {
            return Err(EnvelopeError::LengthMismatch {
                positions: positions.len(),
                values:    durations.len(),
                what:      "step durations",
            });
        }
        if let Some((index, &time)) = durations
            .iter()
            .enumerate()
            .find(|&(_, &t)| !(t.is_finite() && t > 0.0))
        {
            return Err(EnvelopeError::InvalidTime { index, time });
        }
        Ok(Self::from_steps(kind, positions, speeds, durations))
    }

    /// Unchecked constructor for points produced by the builders.
    pub(crate) fn from_steps(
        kind:      PartKind,
        positions: Vec<f64>,
        speeds:    Vec<f64>,
        durations: Vec<f64>,
    ) -> Self {
        debug_assert!(positions.len() >= 2 && positions.len() == speeds.len());
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        let mut cumulative_times = Vec::with_capacity(positions.len());
        let mut total = 0.0;
        cumulative_times.push(total);
        for d in durations {
            total += d;
            cumulative_times.push(total);
        }
        Self { kind, positions, speeds, cumulative_times }
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn with_kind(mut self, kind: PartKind) -> Self {
        self.kind = kind;
        self
    }

    // ── Samples ───────────────────────────────────────────────────────────

    #[inline]
    pub fn point_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn step_count(&self) -> usize {
        self.positions.len() - 1
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    #[inline]
    pub fn position(&self, index: usize) -> f64 {
        self.positions[index]
    }

    #[inline]
    pub fn speed(&self, index: usize) -> f64 {
        self.speeds[index]
    }

    /// Duration of step `index`, s.
    #[inline]
    pub fn step_time(&self, index: usize) -> f64 {
        self.cumulative_times[index + 1] - self.cumulative_times[index]
    }

    pub fn begin_pos(&self) -> f64 {
        self.positions[0]
    }

    pub fn end_pos(&self) -> f64 {
        self.positions[self.positions.len() - 1]
    }

    pub fn begin_speed(&self) -> f64 {
        self.speeds[0]
    }

    pub fn end_speed(&self) -> f64 {
        self.speeds[self.speeds.len() - 1]
    }

    pub fn length(&self) -> f64 {
        self.end_pos() - self.begin_pos()
    }

    pub fn total_time(&self) -> f64 {
        self.cumulative_times[self.cumulative_times.len() - 1]
    }

    pub fn min_speed(&self) -> f64 {
        self.speeds.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_speed(&self) -> f64 {
        self.speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn contains(&self, position: f64) -> bool {
        self.begin_pos() <= position && position <= self.end_pos()
    }

    // ── Step lookup ───────────────────────────────────────────────────────

    /// Index of the step containing `position`, preferring the step that
    /// starts at an interior sample.  Clamped to the part.
    pub fn find_step(&self, position: f64) -> usize {
        let index = self.positions.partition_point(|&p| p <= position);
        index.saturating_sub(1).min(self.step_count() - 1)
    }

    /// Like [`find_step`][Self::find_step] but preferring the step that ends
    /// at an interior sample.
    pub fn find_step_left(&self, position: f64) -> usize {
        let index = self.positions.partition_point(|&p| p < position);
        index.saturating_sub(1).min(self.step_count() - 1)
    }

    // ── Interpolation ─────────────────────────────────────────────────────

    pub fn interpolate_speed_in_step(&self, step: usize, position: f64) -> f64 {
        interpolate_step_speed(
            self.positions[step],
            self.speeds[step],
            self.positions[step + 1],
            self.speeds[step + 1],
            position,
        )
    }

    /// Speed at `position`, clamped to the part.
    pub fn interpolate_speed(&self, position: f64) -> f64 {
        let position = position.clamp(self.begin_pos(), self.end_pos());
        self.interpolate_speed_in_step(self.find_step(position), position)
    }

    /// Position inside step `step` where the speed equals `speed`.
    pub fn interpolate_position_in_step(&self, step: usize, speed: f64) -> f64 {
        interpolate_step_position(
            self.positions[step],
            self.speeds[step],
            self.positions[step + 1],
            self.speeds[step + 1],
            speed,
        )
    }

    /// First position where the part reaches `speed`, scanning steps in
    /// storage order.  `None` if no step spans `speed`.
    pub fn interpolate_position(&self, speed: f64) -> Option<f64> {
        (0..self.step_count())
            .find(|&step| {
                let (v0, v1) = (self.speeds[step], self.speeds[step + 1]);
                v0.min(v1) <= speed && speed <= v0.max(v1)
            })
            .map(|step| self.interpolate_position_in_step(step, speed))
    }

    /// Time spent between the begin of `step` and `position`.
    fn time_in_step(&self, step: usize, position: f64) -> f64 {
        let (x0, x1) = (self.positions[step], self.positions[step + 1]);
        if position <= x0 {
            return 0.0;
        }
        let full_time = self.step_time(step);
        if position >= x1 {
            return full_time;
        }
        let (v0, v1) = (self.speeds[step], self.speeds[step + 1]);
        let speed = self.interpolate_speed_in_step(step, position);
        let share = step_duration(position - x0, v0, speed) / step_duration(x1 - x0, v0, v1);
        if share.is_finite() { full_time * share } else { full_time }
    }

    /// Time from the part's begin to `position` (clamped), s.
    pub fn interpolate_time(&self, position: f64) -> f64 {
        let position = position.clamp(self.begin_pos(), self.end_pos());
        let step = self.find_step(position);
        self.cumulative_times[step] + self.time_in_step(step, position)
    }

    // ── Derived parts ─────────────────────────────────────────────────────

    /// The sub-part over `[begin, end] ∩ [begin_pos, end_pos]`, or `None`
    /// when that range is empty.
    pub fn slice(&self, begin: f64, end: f64) -> Option<EnvelopePart> {
        let begin = begin.max(self.begin_pos());
        let end = end.min(self.end_pos());
        if !(begin < end) {
            return None;
        }
        let first = self.find_step(begin);
        let last = self.find_step_left(end);

        let mut positions = Vec::with_capacity(last - first + 2);
        let mut speeds = Vec::with_capacity(last - first + 2);
        positions.push(begin);
        speeds.push(self.interpolate_speed_in_step(first, begin));
        for i in (first + 1)..=last {
            positions.push(self.positions[i]);
            speeds.push(self.speeds[i]);
        }
        positions.push(end);
        speeds.push(self.interpolate_speed_in_step(last, end));

        let start_time = self.interpolate_time(begin);
        let mut durations = Vec::with_capacity(positions.len() - 1);
        let mut previous = start_time;
        for &p in &positions[1..] {
            let t = self.interpolate_time(p);
            durations.push(t - previous);
            previous = t;
        }
        Some(Self::from_steps(self.kind, positions, speeds, durations))
    }

    /// This part with every speed above `cap` lowered to `cap`.  Crossing
    /// points are inserted so the result stays exact under the step model.
    pub fn capped(&self, cap: f64) -> EnvelopePart {
        if self.max_speed() <= cap {
            return self.clone();
        }
        let mut positions = vec![self.positions[0]];
        let mut speeds = vec![self.speeds[0].min(cap)];
        // Whether the original curve is at or above the cap at each new sample.
        let mut above = vec![self.speeds[0] >= cap];
        for step in 0..self.step_count() {
            let (v0, v1) = (self.speeds[step], self.speeds[step + 1]);
            if (v0 < cap && v1 > cap) || (v0 > cap && v1 < cap) {
                let crossing = self.interpolate_position_in_step(step, cap);
                if crossing > self.positions[step] && crossing < self.positions[step + 1] {
                    positions.push(crossing);
                    speeds.push(cap);
                    above.push(true);
                }
            }
            positions.push(self.positions[step + 1]);
            speeds.push(v1.min(cap));
            above.push(v1 >= cap);
        }

        let mut durations = Vec::with_capacity(positions.len() - 1);
        for i in 0..positions.len() - 1 {
            let dx = positions[i + 1] - positions[i];
            if above[i] && above[i + 1] {
                durations.push(dx / cap);
            } else {
                durations.push(
                    self.interpolate_time(positions[i + 1]) - self.interpolate_time(positions[i]),
                );
            }
        }
        Self::from_steps(PartKind::Capped, positions, speeds, durations)
    }
}

fn validate_points(positions: &[f64], speeds: &[f64]) -> EnvelopeResult<()> {
    if positions.len() != speeds.len() {
        return Err(EnvelopeError::LengthMismatch {
            positions: positions.len(),
            values:    speeds.len(),
            what:      "speeds",
        });
    }
    if positions.len() < 2 {
        return Err(EnvelopeError::TooFewPoints(positions.len()));
    }
    for (index, &speed) in speeds.iter().enumerate() {
        if !(speed.is_finite() && speed >= 0.0) {
            return Err(EnvelopeError::InvalidSpeed { index, speed });
        }
    }
    for index in 1..positions.len() {
        let (prev, next) = (positions[index - 1], positions[index]);
        if !(prev.is_finite() && next.is_finite() && prev < next) {
            return Err(EnvelopeError::NonIncreasingPositions { index, prev, next });
        }
        if speeds[index - 1] == 0.0 && speeds[index] == 0.0 {
            return Err(EnvelopeError::ZeroSpeedStep { index: index - 1 });
        }
    }
    Ok(())
}
