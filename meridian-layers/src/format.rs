use std::sync::Arc;

use indexmap::IndexMap;
use itertools::Itertools;
use meridian_common::{
    dataset::{Dataset, Row},
    value::{Attribute, FieldValue},
};
use meridian_scales::{
    domain::{compute_field_domain, DomainOptions, ScaleDomain},
    resolver::{ScaleRange, ScaleResolver, ScaleType, VisualScale},
};

use crate::{
    aggregate::{bin_points, reduced_domain, Bin, BinReduction, GridBinner, SpatialBinner},
    columns::{AccessorResolver, Geometry, RowAccessor},
    config::{ChannelConfig, LayerConfig},
    error::LayerError,
    layer::{AccessorKey, LayerType},
};

/// A working-set row handed to the render stage
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDatum {
    /// Position of the row in the dataset
    pub index: usize,
    pub row: Row,
    pub geometry: Geometry,
}

/// Channel accessor of a layer payload
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    /// Same attribute for every datum
    Constant(Attribute),
    /// The datum's geometry (`getHexId`, `getPosition`)
    Geometry,
    /// Field value of the datum mapped through a scale
    Encoded {
        scale: Arc<VisualScale>,
        field_idx: usize,
    },
    /// Reduction over the points of a bin
    Reduction(BinReduction),
}

impl Accessor {
    pub fn constant(&self) -> Option<Attribute> {
        match self {
            Accessor::Constant(attr) => Some(*attr),
            _ => None,
        }
    }

    /// Visual attribute of one datum. `None` for geometry and bin accessors.
    pub fn encode(&self, datum: &LayerDatum) -> Option<Attribute> {
        match self {
            Accessor::Constant(attr) => Some(*attr),
            Accessor::Encoded { scale, field_idx } => Some(
                scale.scale(datum.row.get(*field_idx).unwrap_or(&FieldValue::Null)),
            ),
            Accessor::Geometry | Accessor::Reduction(_) => None,
        }
    }

    pub fn geometry<'a>(&self, datum: &'a LayerDatum) -> Option<&'a Geometry> {
        match self {
            Accessor::Geometry => Some(&datum.geometry),
            _ => None,
        }
    }

    /// Reduced value of a bin. `None` for per-datum accessors.
    pub fn reduce(&self, points: &[LayerDatum]) -> Option<FieldValue> {
        match self {
            Accessor::Reduction(reduction) => Some(reduction.evaluate(points)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerMeta {
    /// `[min_lng, min_lat, max_lng, max_lat]` of positioned data
    pub bounds: Option<[f64; 4]>,
}

/// Render-ready payload of one layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerData {
    pub data: Arc<Vec<LayerDatum>>,
    /// Spatial bins of aggregated layers, empty otherwise
    pub bins: Vec<Bin>,
    pub accessors: IndexMap<AccessorKey, Accessor>,
    pub meta: LayerMeta,
    row_accessor: Option<Arc<RowAccessor>>,
}

impl LayerData {
    pub fn get(&self, key: AccessorKey) -> Option<&Accessor> {
        self.accessors.get(&key)
    }

    /// Payload keys in emission order, starting with `data`
    pub fn keys(&self) -> Vec<String> {
        std::iter::once("data".to_string())
            .chain(self.accessors.keys().map(|k| k.to_string()))
            .collect()
    }

    /// Accessor the working set was built with, `None` when required columns were unbound
    pub fn row_accessor(&self) -> Option<&Arc<RowAccessor>> {
        self.row_accessor.as_ref()
    }

    /// Domain of a bin accessor's reduced values within a `[lower, upper]` percentile window
    pub fn bin_domain(
        &self,
        key: AccessorKey,
        scale_type: ScaleType,
        percentile: [f64; 2],
        options: &DomainOptions,
    ) -> Option<ScaleDomain> {
        match self.get(key)? {
            Accessor::Reduction(reduction) => Some(reduced_domain(
                &self.bins,
                reduction,
                scale_type,
                percentile,
                options,
            )),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct FormatOptions<'a> {
    /// Reuse the previous working set when the row accessor is unchanged
    pub same_data: bool,
    /// Cell function of aggregated layers. Grid layers fall back to cells of
    /// `world_unit_size` kilometers.
    pub binner: Option<&'a dyn SpatialBinner>,
}

/// Builds layer payloads from datasets and layer configurations
#[derive(Debug, Clone, Copy)]
pub struct LayerDataFormatter<'a> {
    accessors: &'a AccessorResolver,
    scales: &'a ScaleResolver,
}

impl Default for LayerDataFormatter<'static> {
    fn default() -> Self {
        Self::new(AccessorResolver::global(), ScaleResolver::global())
    }
}

impl<'a> LayerDataFormatter<'a> {
    pub fn new(accessors: &'a AccessorResolver, scales: &'a ScaleResolver) -> Self {
        Self { accessors, scales }
    }

    /// Format `dataset` for the layer described by `config`.
    ///
    /// Rows whose geometry is null are dropped. Unbound required columns give an empty
    /// working set with constant accessors. Only configuration errors are returned.
    #[tracing::instrument(skip_all)]
    pub fn format(
        &self,
        dataset: &Dataset,
        config: &LayerConfig,
        previous: Option<&LayerData>,
        options: &FormatOptions,
    ) -> Result<LayerData, LayerError> {
        let layer_type = config.layer_type;
        let row_accessor = self
            .accessors
            .resolve(&config.columns, layer_type.required_columns());

        let data = match (&row_accessor, previous) {
            (None, _) => {
                tracing::warn!(
                    "{} layer on `{}` has unbound columns, rendering no data",
                    layer_type,
                    dataset.id()
                );
                Arc::new(Vec::new())
            }
            (Some(accessor), Some(previous))
                if options.same_data
                    && previous
                        .row_accessor
                        .as_ref()
                        .is_some_and(|prev| Arc::ptr_eq(prev, accessor)) =>
            {
                tracing::debug!("reusing {} previous rows", previous.data.len());
                previous.data.clone()
            }
            (Some(accessor), _) => Arc::new(working_set(dataset, accessor)),
        };

        let mut accessors = IndexMap::new();
        for key in layer_type.accessor_keys() {
            let accessor = match key {
                AccessorKey::GetHexId | AccessorKey::GetPosition => Accessor::Geometry,
                AccessorKey::GetFillColor => self.channel_accessor(
                    dataset,
                    &config.color_channel,
                    row_accessor.is_some(),
                    config.vis_config.color_range.to_scale_range()?,
                    Attribute::Color(config.color),
                )?,
                AccessorKey::GetElevation => self.channel_accessor(
                    dataset,
                    &config.size_channel,
                    row_accessor.is_some(),
                    ScaleRange::Numeric(config.vis_config.size_range.to_vec()),
                    Attribute::Number(0.0),
                )?,
                AccessorKey::GetCoverage => self.channel_accessor(
                    dataset,
                    &config.coverage_channel,
                    row_accessor.is_some(),
                    ScaleRange::Numeric(config.vis_config.coverage_range.to_vec()),
                    Attribute::Number(config.vis_config.coverage),
                )?,
                AccessorKey::GetColorValue => {
                    bin_reduction(dataset, &config.color_channel, row_accessor.is_some())
                }
                AccessorKey::GetElevationValue => {
                    bin_reduction(dataset, &config.size_channel, row_accessor.is_some())
                }
            };
            accessors.insert(*key, accessor);
        }

        let bins = if layer_type.is_aggregated() {
            let grid;
            let binner = match (options.binner, layer_type) {
                (Some(binner), _) => Some(binner),
                (None, LayerType::Grid) => {
                    grid = GridBinner::from_km(config.vis_config.world_unit_size);
                    Some(&grid as &dyn SpatialBinner)
                }
                (None, _) => None,
            };
            binner
                .map(|binner| bin_points(&data, binner))
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(LayerData {
            meta: LayerMeta {
                bounds: position_bounds(&data),
            },
            data,
            bins,
            accessors,
            row_accessor,
        })
    }

    /// Resolve the scale that maps a bin accessor's reduced values onto the channel range.
    ///
    /// `None` for keys that are not bin reductions of `layer_data`.
    pub fn bin_scale(
        &self,
        layer_data: &LayerData,
        config: &LayerConfig,
        key: AccessorKey,
    ) -> Result<Option<Arc<VisualScale>>, LayerError> {
        let vis = &config.vis_config;
        let (channel, range, percentile) = match key {
            AccessorKey::GetElevationValue => (
                &config.size_channel,
                ScaleRange::Numeric(vis.size_range.to_vec()),
                vis.elevation_percentile,
            ),
            AccessorKey::GetColorValue => (
                &config.color_channel,
                vis.color_range.to_scale_range()?,
                vis.percentile,
            ),
            _ => return Ok(None),
        };
        let options = DomainOptions {
            buckets: range.len(),
            max_categories: channel.max_categories,
        };
        let Some(domain) = layer_data.bin_domain(key, channel.scale, percentile, &options) else {
            return Ok(None);
        };
        Ok(Some(self.scales.resolve(channel.scale, &domain, &range, None)?))
    }

    fn channel_accessor(
        &self,
        dataset: &Dataset,
        channel: &ChannelConfig,
        has_data: bool,
        range: ScaleRange,
        default: Attribute,
    ) -> Result<Accessor, LayerError> {
        let Some(field) = channel.field.as_ref().filter(|_| has_data) else {
            return Ok(Accessor::Constant(default));
        };
        if field.index >= dataset.fields().len() {
            tracing::warn!(
                "channel field `{}` is not in dataset `{}`",
                field.name,
                dataset.id()
            );
            return Ok(Accessor::Constant(default));
        }

        let domain = match &channel.domain {
            Some(domain) => domain.clone(),
            None => compute_field_domain(
                dataset,
                field.index,
                channel.scale,
                &DomainOptions {
                    buckets: range.len(),
                    max_categories: channel.max_categories,
                },
            ),
        };
        if domain.is_empty() {
            tracing::debug!("no values for `{}`, using a constant scale", field.name);
        }

        let scale = self
            .scales
            .resolve(channel.scale, &domain, &range, Some(default))?;
        Ok(Accessor::Encoded {
            scale,
            field_idx: field.index,
        })
    }
}

fn working_set(dataset: &Dataset, accessor: &RowAccessor) -> Vec<LayerDatum> {
    let rows = dataset.rows();
    dataset
        .render_index()
        .iter()
        .filter_map(|&index| {
            let row = rows.get(index)?;
            let geometry = accessor.geometry(row)?;
            Some(LayerDatum {
                index,
                row: row.clone(),
                geometry,
            })
        })
        .collect()
}

fn bin_reduction(dataset: &Dataset, channel: &ChannelConfig, has_data: bool) -> Accessor {
    let field = channel
        .field
        .clone()
        .filter(|f| has_data && f.index < dataset.fields().len());
    Accessor::Reduction(BinReduction::new(
        channel.aggregation_op(),
        field,
        dataset.render_filter().cloned(),
    ))
}

fn position_bounds(data: &[LayerDatum]) -> Option<[f64; 4]> {
    let positions = data
        .iter()
        .filter_map(|d| d.geometry.as_position())
        .collect_vec();
    let (min_lng, max_lng) = positions
        .iter()
        .map(|p| p[0])
        .minmax_by(f64::total_cmp)
        .into_option()?;
    let (min_lat, max_lat) = positions
        .iter()
        .map(|p| p[1])
        .minmax_by(f64::total_cmp)
        .into_option()?;
    Some([min_lng, min_lat, max_lng, max_lat])
}
