use std::fmt::Debug;

/// A quantize scale divides a continuous domain into uniform segments and maps values to a
/// discrete range.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeScale<R>
where
    R: Clone + Debug,
{
    domain: (f64, f64),
    range: Vec<R>,
    default: R,
}

impl<R> QuantizeScale<R>
where
    R: Clone + Debug,
{
    /// `range` must not be empty
    pub fn new(domain: (f64, f64), range: Vec<R>, default: R) -> Self {
        Self {
            domain,
            range,
            default,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> &[R] {
        &self.range
    }

    /// Threshold values that divide the domain
    pub fn thresholds(&self) -> Vec<f64> {
        let n = self.range.len();
        (1..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                self.domain.0 * (1.0 - t) + self.domain.1 * t
            })
            .collect()
    }

    pub fn scale(&self, value: f64) -> R {
        let n = self.range.len();
        if !value.is_finite() || n == 0 {
            return self.default.clone();
        }
        let span = self.domain.1 - self.domain.0;
        if n == 1 || span == 0.0 || !span.is_finite() {
            return self.range[0].clone();
        }
        let normalized = (value - self.domain.0) / span;
        let idx = ((normalized * n as f64).floor().max(0.0) as usize).min(n - 1);
        self.range[idx].clone()
    }
}
