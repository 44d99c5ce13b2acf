use super::{linear::LinearNumericScale, ContinuousNumericScale};

/// Logarithmic scale over a strictly positive domain.
///
/// The base does not change the mapping between domain and range, only tick placement,
/// so values are interpolated in natural-log space.
#[derive(Clone, Debug, PartialEq)]
pub struct LogNumericScale {
    linear: LinearNumericScale,
}

impl Default for LogNumericScale {
    fn default() -> Self {
        Self {
            linear: LinearNumericScale::new(&Default::default()).with_domain((1.0, 10.0)),
        }
    }
}

impl LogNumericScale {
    pub fn new() -> Self {
        Self::default()
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
}

impl ContinuousNumericScale for LogNumericScale {
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
        if value <= 0.0 || d0 <= 0.0 || d1 <= 0.0 {
            return f64::NAN;
        }
        self.linear
            .clone()
            .with_domain((d0.ln(), d1.ln()))
            .scale(value.ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_log() {
        let scale = LogNumericScale::new()
            .with_domain((1.0, 100.0))
            .with_range((0.0, 2.0));
        assert_approx_eq!(f64, scale.scale(10.0), 1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, scale.scale(100.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_is_nan() {
        let scale = LogNumericScale::new().with_domain((1.0, 100.0));
        assert!(scale.scale(0.0).is_nan());
        assert!(scale.scale(-5.0).is_nan());
    }
}
