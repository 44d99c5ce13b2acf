use super::ContinuousNumericScale;

#[derive(Clone, Debug)]
pub struct LinearNumericScaleConfig {
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub clamp: bool,
    pub round: bool,
}

impl Default for LinearNumericScaleConfig {
    fn default() -> Self {
        Self {
            domain: (0.0, 1.0),
            range: (0.0, 1.0),
            clamp: false,
            round: false,
        }
    }
}

/// A linear scale that maps numeric input values from a domain to a range.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearNumericScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
    clamp: bool,
    round: bool,
}

impl LinearNumericScale {
    pub fn new(config: &LinearNumericScaleConfig) -> Self {
        Self {
            domain_start: config.domain.0,
            domain_end: config.domain.1,
            range_start: config.range.0,
            range_end: config.range.1,
            clamp: config.clamp,
            round: config.round,
        }
    }

    pub fn with_domain(mut self, domain: (f64, f64)) -> Self {
        self.domain_start = domain.0;
        self.domain_end = domain.1;
        self
    }

    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range_start = range.0;
        self.range_end = range.1;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    /// Whether the scale collapses to its range start
    pub fn is_degenerate(&self) -> bool {
        self.domain_start == self.domain_end
            || !self.domain_start.is_finite()
            || !self.domain_end.is_finite()
            || !self.range_start.is_finite()
            || !self.range_end.is_finite()
    }
}

impl ContinuousNumericScale for LinearNumericScale {
    fn domain(&self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    fn range(&self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    fn clamp(&self) -> bool {
        self.clamp
    }

    fn scale(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        if self.is_degenerate() {
            return self.range_start;
        }

        let scale = (self.range_end - self.range_start) / (self.domain_end - self.domain_start);
        let offset = self.range_start - scale * self.domain_start;
        let mut result = scale * value + offset;

        if self.clamp {
            let (range_min, range_max) = if self.range_start <= self.range_end {
                (self.range_start, self.range_end)
            } else {
                (self.range_end, self.range_start)
            };
            result = result.clamp(range_min, range_max);
        }
        if self.round {
            result = result.round();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_defaults() {
        let scale = LinearNumericScale::new(&Default::default());
        assert_eq!(scale.domain(), (0.0, 1.0));
        assert_eq!(scale.range(), (0.0, 1.0));
        assert!(!scale.clamp());
    }

    #[test]
    fn test_scale() {
        let scale = LinearNumericScale::new(&LinearNumericScaleConfig {
            domain: (10.0, 30.0),
            range: (0.0, 100.0),
            clamp: true,
            ..Default::default()
        });

        assert_approx_eq!(f64, scale.scale(0.0), 0.0); // clamped
        assert_approx_eq!(f64, scale.scale(10.0), 0.0);
        assert_approx_eq!(f64, scale.scale(15.0), 25.0);
        assert_approx_eq!(f64, scale.scale(25.0), 75.0);
        assert_approx_eq!(f64, scale.scale(30.0), 100.0);
        assert_approx_eq!(f64, scale.scale(40.0), 100.0); // clamped
        assert!(scale.scale(f64::NAN).is_nan());
    }

    #[test]
    fn test_unclamped_reversed_range() {
        let scale = LinearNumericScale::new(&Default::default())
            .with_domain((0.0, 10.0))
            .with_range((100.0, 0.0));
        assert_approx_eq!(f64, scale.scale(2.5), 75.0);
        assert_approx_eq!(f64, scale.scale(20.0), -100.0);
    }

    #[test]
    fn test_degenerate_domain() {
        let scale = LinearNumericScale::new(&Default::default())
            .with_domain((5.0, 5.0))
            .with_range((0.0, 500.0));
        assert_eq!(scale.scale(5.0), 0.0);
        assert_eq!(scale.scale(100.0), 0.0);
    }

    #[test]
    fn test_round() {
        let scale = LinearNumericScale::new(&Default::default())
            .with_domain((0.0, 3.0))
            .with_range((0.0, 10.0))
            .with_round(true);
        assert_eq!(scale.scale(1.0), 3.0);
    }
}
