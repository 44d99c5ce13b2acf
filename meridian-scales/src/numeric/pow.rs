use super::{linear::LinearNumericScale, ContinuousNumericScale};

/// Power scale, `y = m * x^exponent + b`. A `sqrt` scale is a pow scale with exponent 0.5.
#[derive(Clone, Debug, PartialEq)]
pub struct PowNumericScale {
    exponent: f64,
    linear: LinearNumericScale,
}

impl PowNumericScale {
    pub fn new(exponent: f64) -> Self {
        Self {
            exponent,
            linear: LinearNumericScale::new(&Default::default()),
        }
    }

    pub fn sqrt() -> Self {
        Self::new(0.5)
    }

    pub fn with_domain(mut self, domain: (f64, f64)) -> Self {
        self.linear = self.linear.with_domain(domain);
        self
    }

    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.linear = self.linear.with_range(range);
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.linear = self.linear.with_clamp(clamp);
        self
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    fn transform(&self, v: f64) -> f64 {
        v.signum() * v.abs().powf(self.exponent)
    }
}

impl ContinuousNumericScale for PowNumericScale {
    fn domain(&self) -> (f64, f64) {
        self.linear.domain()
    }

    fn range(&self) -> (f64, f64) {
        self.linear.range()
    }

    fn clamp(&self) -> bool {
        self.linear.clamp()
    }

    fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.linear.domain();
        let transformed = self
            .linear
            .clone()
            .with_domain((self.transform(d0), self.transform(d1)));
        transformed.scale(self.transform(value))
    }
}
