pub mod linear;
pub mod log;
pub mod pow;

use linear::LinearNumericScale;
use log::LogNumericScale;
use pow::PowNumericScale;

/// Scale mapping a continuous numeric domain onto a continuous numeric range
pub trait ContinuousNumericScale {
    /// Returns the current domain as (start, end)
    fn domain(&self) -> (f64, f64);

    /// Returns the current range as (start, end)
    fn range(&self) -> (f64, f64);

    /// Returns whether output clamping is enabled
    fn clamp(&self) -> bool;

    /// Maps a domain value into the range.
    ///
    /// Returns `NaN` when the value cannot be represented by the scale.
    fn scale(&self, value: f64) -> f64;
}

#[derive(Clone, Debug, PartialEq)]
pub enum NumericScale {
    Linear(LinearNumericScale),
    Pow(PowNumericScale),
    Log(LogNumericScale),
}

impl NumericScale {
    pub fn with_domain(self, domain: (f64, f64)) -> Self {
        match self {
            NumericScale::Linear(scale) => scale.with_domain(domain).into(),
            NumericScale::Pow(scale) => scale.with_domain(domain).into(),
            NumericScale::Log(scale) => scale.with_domain(domain).into(),
        }
    }

    pub fn with_range(self, range: (f64, f64)) -> Self {
        match self {
            NumericScale::Linear(scale) => scale.with_range(range).into(),
            NumericScale::Pow(scale) => scale.with_range(range).into(),
            NumericScale::Log(scale) => scale.with_range(range).into(),
        }
    }

    pub fn with_clamp(self, clamp: bool) -> Self {
        match self {
            NumericScale::Linear(scale) => scale.with_clamp(clamp).into(),
            NumericScale::Pow(scale) => scale.with_clamp(clamp).into(),
            NumericScale::Log(scale) => scale.with_clamp(clamp).into(),
        }
    }
}

impl ContinuousNumericScale for NumericScale {
    fn domain(&self) -> (f64, f64) {
        match self {
            NumericScale::Linear(scale) => scale.domain(),
            NumericScale::Pow(scale) => scale.domain(),
            NumericScale::Log(scale) => scale.domain(),
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            NumericScale::Linear(scale) => scale.range(),
            NumericScale::Pow(scale) => scale.range(),
            NumericScale::Log(scale) => scale.range(),
        }
    }

    fn clamp(&self) -> bool {
        match self {
            NumericScale::Linear(scale) => scale.clamp(),
            NumericScale::Pow(scale) => scale.clamp(),
            NumericScale::Log(scale) => scale.clamp(),
        }
    }

    fn scale(&self, value: f64) -> f64 {
        match self {
            NumericScale::Linear(scale) => scale.scale(value),
            NumericScale::Pow(scale) => scale.scale(value),
            NumericScale::Log(scale) => scale.scale(value),
        }
    }
}

impl From<LinearNumericScale> for NumericScale {
    fn from(scale: LinearNumericScale) -> Self {
        NumericScale::Linear(scale)
    }
}

impl From<PowNumericScale> for NumericScale {
    fn from(scale: PowNumericScale) -> Self {
        NumericScale::Pow(scale)
    }
}

impl From<LogNumericScale> for NumericScale {
    fn from(scale: LogNumericScale) -> Self {
        NumericScale::Log(scale)
    }
}
