//! Allowance ranges along the path.

use super::{AllowanceError, AllowanceResult, AllowanceValue};

/// An allowance applying over `[begin, end)`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllowanceRange {
    pub begin: f64,
    pub end:   f64,
    pub value: AllowanceValue,
}

impl AllowanceRange {
    pub fn new(begin: f64, end: f64, value: AllowanceValue) -> Self {
        Self { begin, end, value }
    }

    pub fn length(&self) -> f64 {
        self.end - self.begin
    }

    /// Sort `ranges` and fill the gaps of `[begin, end]` with `default`.
    ///
    /// Every range must lie inside `[begin, end]`, be non-empty, carry a
    /// valid value, and not overlap another one.
    pub fn fill_ranges(
        begin:   f64,
        end:     f64,
        default: AllowanceValue,
        ranges:  &[AllowanceRange],
    ) -> AllowanceResult<Vec<AllowanceRange>> {
        if !(begin.is_finite() && end.is_finite() && begin < end) {
            return Err(AllowanceError::InvalidSchedule(format!(
                "invalid allowance bounds [{begin}, {end}]"
            )));
        }
        default.validate()?;

        let mut sorted = ranges.to_vec();
        for range in &sorted {
            range.value.validate()?;
            if !(range.begin < range.end) || range.begin < begin || range.end > end {
                return Err(AllowanceError::InvalidSchedule(format!(
                    "range [{}, {}] is empty or outside [{begin}, {end}]",
                    range.begin, range.end
                )));
            }
        }
        sorted.sort_by(|a, b| a.begin.total_cmp(&b.begin));

        let mut filled = Vec::with_capacity(2 * sorted.len() + 1);
        let mut position = begin;
        for range in sorted {
            if range.begin < position {
                return Err(AllowanceError::InvalidSchedule(format!(
                    "range [{}, {}] overlaps the previous one (ending at {position})",
                    range.begin, range.end
                )));
            }
            if range.begin > position {
                filled.push(AllowanceRange::new(position, range.begin, default));
            }
            position = range.end;
            filled.push(range);
        }
        if position < end {
            filled.push(AllowanceRange::new(position, end, default));
        }
        Ok(filled)
    }
}
