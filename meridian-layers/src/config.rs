use meridian_common::{dataset::Field, value::Rgb};
use meridian_scales::{
    domain::ScaleDomain,
    error::ScaleError,
    resolver::{ScaleRange, ScaleType},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{aggregate::AggregationOp, columns::ColumnBindings, layer::LayerType};

/// Configuration of one visual channel (color, size or coverage)
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct ChannelConfig {
    /// Field driving the channel. `None` uses the channel's constant value.
    pub field: Option<Field>,
    pub scale: ScaleType,
    /// Fixed domain. Computed from the dataset when `None`.
    pub domain: Option<ScaleDomain>,
    /// Per-bin reduction for aggregated layers. Defaults to mean with a field, count without.
    pub aggregation: Option<AggregationOp>,
    /// Cap on computed ordinal domains
    pub max_categories: Option<usize>,
}

impl ChannelConfig {
    pub fn new(field: Field, scale: ScaleType) -> Self {
        Self {
            field: Some(field),
            scale,
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: ScaleDomain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationOp) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn with_max_categories(mut self, max_categories: usize) -> Self {
        self.max_categories = Some(max_categories);
        self
    }

    /// Reduction applied to the points of a bin
    pub fn aggregation_op(&self) -> AggregationOp {
        match (&self.field, self.aggregation) {
            (_, Some(op)) => op,
            (Some(_), None) => AggregationOp::Mean,
            (None, None) => AggregationOp::Count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ColorRange {
    pub name: String,
    /// `#rrggbb` colors
    pub colors: Vec<String>,
}

impl Default for ColorRange {
    fn default() -> Self {
        Self {
            name: "Global Warming".to_string(),
            colors: ["#5A1846", "#900C3F", "#C70039", "#E3611C", "#F1920E", "#FFC300"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl ColorRange {
    pub fn new<S: Into<String>>(colors: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: "Custom".to_string(),
            colors: colors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_scale_range(&self) -> Result<ScaleRange, ScaleError> {
        ScaleRange::from_hex_colors(self.colors.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct LayerVisConfig {
    pub opacity: f64,
    pub color_range: ColorRange,
    pub filled: bool,
    pub enable3d: bool,
    pub elevation_scale: f64,
    /// `[lower, upper]` percentile window of bin elevation values
    pub elevation_percentile: [f64; 2],
    pub size_range: [f64; 2],
    pub coverage: f64,
    pub coverage_range: [f64; 2],
    /// `[lower, upper]` percentile window of bin color values
    pub percentile: [f64; 2],
    /// Bin size in kilometers
    pub world_unit_size: f64,
}

impl Default for LayerVisConfig {
    fn default() -> Self {
        Self {
            opacity: 0.8,
            color_range: ColorRange::default(),
            filled: true,
            enable3d: false,
            elevation_scale: 5.0,
            elevation_percentile: [0.0, 100.0],
            size_range: [0.0, 500.0],
            coverage: 1.0,
            coverage_range: [0.0, 1.0],
            percentile: [0.0, 100.0],
            world_unit_size: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LayerConfig {
    pub data_id: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub layer_type: LayerType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub columns: ColumnBindings,
    /// Constant fill color used when no color field is bound
    #[cfg_attr(feature = "serde", serde(default = "default_layer_color"))]
    pub color: Rgb,
    #[cfg_attr(feature = "serde", serde(default))]
    pub color_channel: ChannelConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub size_channel: ChannelConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub coverage_channel: ChannelConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vis_config: LayerVisConfig,
}

#[cfg(feature = "serde")]
fn default_layer_color() -> Rgb {
    LayerConfig::DEFAULT_COLOR
}

impl LayerConfig {
    pub const DEFAULT_COLOR: Rgb = Rgb([18, 147, 154]);

    pub fn new(data_id: impl Into<String>, layer_type: LayerType, columns: ColumnBindings) -> Self {
        Self {
            data_id: data_id.into(),
            layer_type,
            columns,
            color: Self::DEFAULT_COLOR,
            color_channel: Default::default(),
            size_channel: Default::default(),
            coverage_channel: Default::default(),
            vis_config: Default::default(),
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_color_channel(mut self, channel: ChannelConfig) -> Self {
        self.color_channel = channel;
        self
    }

    pub fn with_size_channel(mut self, channel: ChannelConfig) -> Self {
        self.size_channel = channel;
        self
    }

    pub fn with_coverage_channel(mut self, channel: ChannelConfig) -> Self {
        self.coverage_channel = channel;
        self
    }

    pub fn with_vis_config(mut self, vis_config: LayerVisConfig) -> Self {
        self.vis_config = vis_config;
        self
    }
}
