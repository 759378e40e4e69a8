//! How much extra time an allowance asks for, and how it is spread.

use super::{AllowanceError, AllowanceResult};

/// Metres in 100 km, the reference distance of [`AllowanceValue::TimePerDistance`].
const HUNDRED_KM: f64 = 100_000.0;

/// How a range's extra time is shared among its sections.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllowanceDistribution {
    /// In proportion to section length.
    DistanceRatio,
    /// In proportion to section running time on the base envelope.
    TimeRatio,
}

/// Extra running time requested over a range.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllowanceValue {
    /// A fixed number of seconds.
    FixedTime {
        seconds:      f64,
        distribution: AllowanceDistribution,
    },
    /// A share of the base running time, in percent.
    Percentage {
        percentage:   f64,
        distribution: AllowanceDistribution,
    },
    /// Minutes per 100 km.
    TimePerDistance {
        minutes:      f64,
        distribution: AllowanceDistribution,
    },
}

impl AllowanceValue {
    pub fn fixed_time(seconds: f64) -> Self {
        AllowanceValue::FixedTime { seconds, distribution: AllowanceDistribution::TimeRatio }
    }

    pub fn percentage(percentage: f64) -> Self {
        AllowanceValue::Percentage { percentage, distribution: AllowanceDistribution::TimeRatio }
    }

    pub fn time_per_distance(minutes: f64) -> Self {
        AllowanceValue::TimePerDistance {
            minutes,
            distribution: AllowanceDistribution::DistanceRatio,
        }
    }

    /// No extra time.
    pub fn zero() -> Self {
        Self::fixed_time(0.0)
    }

    pub fn distribution(&self) -> AllowanceDistribution {
        match *self {
            AllowanceValue::FixedTime { distribution, .. }
            | AllowanceValue::Percentage { distribution, .. }
            | AllowanceValue::TimePerDistance { distribution, .. } => distribution,
        }
    }

    pub fn with_distribution(self, distribution: AllowanceDistribution) -> Self {
        match self {
            AllowanceValue::FixedTime { seconds, .. } => {
                AllowanceValue::FixedTime { seconds, distribution }
            }
            AllowanceValue::Percentage { percentage, .. } => {
                AllowanceValue::Percentage { percentage, distribution }
            }
            AllowanceValue::TimePerDistance { minutes, .. } => {
                AllowanceValue::TimePerDistance { minutes, distribution }
            }
        }
    }

    fn raw(&self) -> f64 {
        match *self {
            AllowanceValue::FixedTime { seconds, .. } => seconds,
            AllowanceValue::Percentage { percentage, .. } => percentage,
            AllowanceValue::TimePerDistance { minutes, .. } => minutes,
        }
    }

    pub fn validate(&self) -> AllowanceResult<()> {
        let raw = self.raw();
        if !(raw.is_finite() && raw >= 0.0) {
            return Err(AllowanceError::InvalidSchedule(format!(
                "allowance value must be finite and non-negative, got {self:?}"
            )));
        }
        Ok(())
    }

    /// Extra time, s, over a range of `length` metres that takes `base_time`
    /// seconds on the base envelope.
    pub fn extra_time(&self, base_time: f64, length: f64) -> f64 {
        match *self {
            AllowanceValue::FixedTime { seconds, .. } => seconds,
            AllowanceValue::Percentage { percentage, .. } => percentage / 100.0 * base_time,
            AllowanceValue::TimePerDistance { minutes, .. } => minutes * 60.0 * length / HUNDRED_KM,
        }
    }
}
