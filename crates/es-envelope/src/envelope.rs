//! Ordered, contiguous sequences of parts.

use es_core::constants::are_speeds_equal;

use crate::part::EnvelopePart;
use crate::{EnvelopeError, EnvelopeResult};

/// A speed-vs-position curve made of contiguous parts.
///
/// `parts[i].end_pos() == parts[i + 1].begin_pos()` holds exactly.  Speeds
/// may jump at a part boundary; [`interpolate_speed`][Self::interpolate_speed]
/// then returns the lower side.
///
/// Envelopes are immutable.  New envelopes are built from old ones with
/// [`OverlayEnvelopeBuilder`][crate::OverlayEnvelopeBuilder],
/// [`slice`][Self::slice] or [`cap_speed`][Self::cap_speed].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    parts:      Vec<EnvelopePart>,
    /// Time at the begin of each part, plus the total time at the end.
    part_times: Vec<f64>,
}

impl Envelope {
    pub fn new(parts: Vec<EnvelopePart>) -> EnvelopeResult<Self> {
        if parts.is_empty() {
            return Err(EnvelopeError::Empty);
        }
        for (i, w) in parts.windows(2).enumerate() {
            if w[0].end_pos() != w[1].begin_pos() {
                return Err(EnvelopeError::NotContiguous {
                    index: i + 1,
                    end:   w[0].end_pos(),
                    begin: w[1].begin_pos(),
                });
            }
        }
        let mut part_times = Vec::with_capacity(parts.len() + 1);
        let mut total = 0.0;
        part_times.push(total);
        for part in &parts {
            total += part.total_time();
            part_times.push(total);
        }
        Ok(Self { parts, part_times })
    }

    pub fn from_part(part: EnvelopePart) -> Self {
        let total = part.total_time();
        Self { parts: vec![part], part_times: vec![0.0, total] }
    }

    // ── Parts ─────────────────────────────────────────────────────────────

    pub fn parts(&self) -> &[EnvelopePart] {
        &self.parts
    }

    #[inline]
    pub fn part(&self, index: usize) -> &EnvelopePart {
        &self.parts[index]
    }

    #[inline]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn into_parts(self) -> Vec<EnvelopePart> {
        self.parts
    }

    pub fn begin_pos(&self) -> f64 {
        self.parts[0].begin_pos()
    }

    pub fn end_pos(&self) -> f64 {
        self.parts[self.parts.len() - 1].end_pos()
    }

    pub fn length(&self) -> f64 {
        self.end_pos() - self.begin_pos()
    }

    pub fn begin_speed(&self) -> f64 {
        self.parts[0].begin_speed()
    }

    pub fn end_speed(&self) -> f64 {
        self.parts[self.parts.len() - 1].end_speed()
    }

    /// `true` if no part boundary carries a speed jump.
    pub fn is_continuous(&self) -> bool {
        self.parts
            .windows(2)
            .all(|w| are_speeds_equal(w[0].end_speed(), w[1].begin_speed()))
    }

    /// Index of the leftmost part containing `position` (clamped).
    pub fn left_part_index(&self, position: f64) -> usize {
        self.parts
            .partition_point(|p| p.end_pos() < position)
            .min(self.parts.len() - 1)
    }

    /// Index of the rightmost part containing `position` (clamped).
    pub fn right_part_index(&self, position: f64) -> usize {
        self.parts
            .partition_point(|p| p.begin_pos() <= position)
            .saturating_sub(1)
    }

    /// Index of the leftmost part containing `position`, or `None` outside
    /// the envelope.
    pub fn find_part(&self, position: f64) -> Option<usize> {
        if position < self.begin_pos() || position > self.end_pos() {
            return None;
        }
        Some(self.left_part_index(position))
    }

    // ── Speed queries ─────────────────────────────────────────────────────

    /// Speed at `position`; at a discontinuity, the lower of both sides.
    pub fn interpolate_speed(&self, position: f64) -> f64 {
        self.interpolate_speed_left_dir(position)
            .min(self.interpolate_speed_right_dir(position))
    }

    /// Speed at `position` as seen when arriving from lower positions.
    pub fn interpolate_speed_left_dir(&self, position: f64) -> f64 {
        self.parts[self.left_part_index(position)].interpolate_speed(position)
    }

    /// Speed at `position` as seen when arriving from higher positions.
    pub fn interpolate_speed_right_dir(&self, position: f64) -> f64 {
        self.parts[self.right_part_index(position)].interpolate_speed(position)
    }

    pub fn min_speed(&self) -> f64 {
        self.parts.iter().map(EnvelopePart::min_speed).fold(f64::INFINITY, f64::min)
    }

    pub fn max_speed(&self) -> f64 {
        self.parts.iter().map(EnvelopePart::max_speed).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Lowest speed over `[begin, end]`.
    pub fn min_speed_between(&self, begin: f64, end: f64) -> f64 {
        self.speeds_between(begin, end).fold(f64::INFINITY, f64::min)
    }

    /// Highest speed over `[begin, end]`.
    pub fn max_speed_between(&self, begin: f64, end: f64) -> f64 {
        self.speeds_between(begin, end).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Every speed extremum candidate over `[begin, end]`: range bounds and
    /// samples inside.  Within a step speed is monotonic, so these suffice.
    fn speeds_between(&self, begin: f64, end: f64) -> impl Iterator<Item = f64> + '_ {
        let first = self.left_part_index(begin);
        self.parts[first..]
            .iter()
            .take_while(move |p| p.begin_pos() <= end)
            .flat_map(move |p| {
                let lo = begin.max(p.begin_pos());
                let hi = end.min(p.end_pos());
                let inner = p
                    .positions()
                    .iter()
                    .zip(p.speeds())
                    .filter(move |&(&x, _)| x > lo && x < hi)
                    .map(|(_, &v)| v);
                [p.interpolate_speed(lo), p.interpolate_speed(hi)].into_iter().chain(inner)
            })
    }

    /// Sample positions strictly inside `(lo, hi)`, ascending, without
    /// duplicates at part boundaries.
    pub fn sample_positions_between(&self, lo: f64, hi: f64) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::new();
        let first = self.left_part_index(lo);
        for part in &self.parts[first..] {
            if part.begin_pos() >= hi {
                break;
            }
            let positions = part.positions();
            let start = positions.partition_point(|&p| p <= lo);
            for &p in &positions[start..] {
                if p >= hi {
                    break;
                }
                if out.last() != Some(&p) {
                    out.push(p);
                }
            }
        }
        out
    }

    // ── Time queries ──────────────────────────────────────────────────────

    /// Time from the envelope's begin to `position` (clamped), s.
    pub fn interpolate_total_time(&self, position: f64) -> f64 {
        let index = self.left_part_index(position);
        self.part_times[index] + self.parts[index].interpolate_time(position)
    }

    /// Time to run from `begin` to `end`, s.
    pub fn time_between(&self, begin: f64, end: f64) -> f64 {
        self.interpolate_total_time(end) - self.interpolate_total_time(begin)
    }

    pub fn total_time(&self) -> f64 {
        self.part_times[self.part_times.len() - 1]
    }

    // ── Derived envelopes ─────────────────────────────────────────────────

    /// Parts covering `[begin, end]`, cut at both bounds.
    pub fn slice_parts(&self, begin: f64, end: f64) -> Vec<EnvelopePart> {
        if !(begin < end) {
            return Vec::new();
        }
        let first = self.left_part_index(begin);
        self.parts[first..]
            .iter()
            .take_while(|p| p.begin_pos() < end)
            .filter_map(|p| p.slice(begin, end))
            .collect()
    }

    /// The sub-envelope over `[begin, end]`.
    pub fn slice(&self, begin: f64, end: f64) -> EnvelopeResult<Envelope> {
        Envelope::new(self.slice_parts(begin, end))
    }

    /// This envelope with every speed above `cap` lowered to `cap`.
    pub fn cap_speed(&self, cap: f64) -> Envelope {
        let parts: Vec<EnvelopePart> = self.parts.iter().map(|p| p.capped(cap)).collect();
        let mut part_times = Vec::with_capacity(parts.len() + 1);
        let mut total = 0.0;
        part_times.push(total);
        for part in &parts {
            total += part.total_time();
            part_times.push(total);
        }
        Envelope { parts, part_times }
    }
}
