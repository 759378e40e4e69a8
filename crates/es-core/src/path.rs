//! The 1-D path abstraction the train runs along.
//!
//! # Pluggability
//!
//! The pipeline only talks to the path through [`PhysicsPath`], so callers
//! can back it with whatever infrastructure model they have.  Two simple
//! implementations are provided: [`FlatPath`] and [`GradeProfile`]
//! (piecewise-constant grades).
//!
//! # Thread safety
//!
//! Implementations must be `Send + Sync` so independent trains can be
//! simulated concurrently over shared paths.

use crate::{CoreError, CoreResult};

/// Read-only geometry queries over a path.
pub trait PhysicsPath: Send + Sync {
    /// Length of the path, m.
    fn length(&self) -> f64;

    /// Length-weighted average grade over `[begin, end]`, m/km.
    fn average_grade(&self, begin: f64, end: f64) -> f64;

    /// Lowest grade over `[begin, end]`, m/km.
    fn min_grade(&self, begin: f64, end: f64) -> f64;
}

// ── FlatPath ──────────────────────────────────────────────────────────────────

/// A path with zero grade everywhere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlatPath {
    pub length: f64,
}

impl FlatPath {
    pub fn new(length: f64) -> Self {
        Self { length }
    }
}

impl PhysicsPath for FlatPath {
    fn length(&self) -> f64 {
        self.length
    }

    fn average_grade(&self, _begin: f64, _end: f64) -> f64 {
        0.0
    }

    fn min_grade(&self, _begin: f64, _end: f64) -> f64 {
        0.0
    }
}

// ── GradeProfile ──────────────────────────────────────────────────────────────

/// Piecewise-constant grade profile.
///
/// `boundaries` has one more entry than `grades`: grade `grades[i]` applies
/// on `[boundaries[i], boundaries[i + 1]]`.  The first boundary is 0 and the
/// last is the path length.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradeProfile {
    boundaries: Vec<f64>,
    grades:     Vec<f64>,
}

impl GradeProfile {
    pub fn new(boundaries: Vec<f64>, grades: Vec<f64>) -> CoreResult<Self> {
        if grades.is_empty() || boundaries.len() != grades.len() + 1 {
            return Err(CoreError::GradeProfile(format!(
                "expected {} boundaries for {} grades, got {}",
                grades.len() + 1,
                grades.len(),
                boundaries.len()
            )));
        }
        if boundaries[0] != 0.0 {
            return Err(CoreError::GradeProfile("first boundary must be 0".into()));
        }
        if boundaries.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(CoreError::GradeProfile(
                "boundaries must be strictly increasing".into(),
            ));
        }
        Ok(Self { boundaries, grades })
    }

    /// A single-grade profile over `[0, length]`.
    pub fn uniform(length: f64, grade: f64) -> Self {
        Self { boundaries: vec![0.0, length], grades: vec![grade] }
    }

    /// Index of the interval containing `position` (clamped to the path).
    fn interval_at(&self, position: f64) -> usize {
        let index = self.boundaries.partition_point(|&b| b <= position);
        index.saturating_sub(1).min(self.grades.len() - 1)
    }

    /// Intervals overlapping `[begin, end]` with their overlap lengths.
    fn overlaps(&self, begin: f64, end: f64) -> impl Iterator<Item = (f64, f64)> + '_ {
        let first = self.interval_at(begin);
        (first..self.grades.len())
            .take_while(move |&i| self.boundaries[i] < end)
            .map(move |i| {
                let lo = self.boundaries[i].max(begin);
                let hi = self.boundaries[i + 1].min(end);
                (self.grades[i], (hi - lo).max(0.0))
            })
    }
}

impl PhysicsPath for GradeProfile {
    fn length(&self) -> f64 {
        self.boundaries[self.boundaries.len() - 1]
    }

    fn average_grade(&self, begin: f64, end: f64) -> f64 {
        if end <= begin {
            return self.grades[self.interval_at(begin)];
        }
        let weighted: f64 = self.overlaps(begin, end).map(|(g, len)| g * len).sum();
        weighted / (end - begin)
    }

    fn min_grade(&self, begin: f64, end: f64) -> f64 {
        if end <= begin {
            return self.grades[self.interval_at(begin)];
        }
        let min = self
            .overlaps(begin, end)
            .filter(|&(_, len)| len > 0.0)
            .map(|(g, _)| g)
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() { min } else { self.grades[self.interval_at(begin)] }
    }
}
