use meridian_common::value::Rgb;
use palette::{Mix, Srgb};

use crate::numeric::{ContinuousNumericScale, NumericScale};

/// Continuous color scale: a numeric scale normalizes values onto evenly spaced color stops
/// which are then mixed pairwise.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRampScale {
    numeric_scale: NumericScale,
    colors: Vec<Srgb<f32>>,
}

impl ColorRampScale {
    /// `numeric_scale` only provides the domain mapping; its range is replaced by
    /// `(0, colors.len() - 1)` with clamping enabled.
    pub fn new(numeric_scale: NumericScale, colors: &[Rgb]) -> Self {
        let stops = (0.0, colors.len().saturating_sub(1) as f64);
        let numeric_scale = numeric_scale.with_range(stops).with_clamp(true);
        Self {
            numeric_scale,
            colors: colors.iter().map(|c| c.to_srgb()).collect(),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.numeric_scale.domain()
    }

    /// Returns `None` when the value cannot be placed on the ramp
    pub fn scale(&self, value: f64) -> Option<Rgb> {
        let position = self.numeric_scale.scale(value);
        if !position.is_finite() || self.colors.is_empty() {
            return None;
        }
        let lower = position.floor() as usize;
        let upper = (position.ceil() as usize).min(self.colors.len() - 1);
        let lower = lower.min(upper);
        let factor = (position - lower as f64) as f32;
        let mixed = self.colors[lower].mix(self.colors[upper], factor);
        Some(Rgb::from_srgb(mixed))
    }
}
