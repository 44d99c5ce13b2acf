use std::{collections::HashSet, str::FromStr, sync::Arc};

use indexmap::IndexMap;
use itertools::Itertools;
use meridian_common::{
    dataset::{Field, FieldType, RenderFilter},
    value::FieldValue,
};
use meridian_scales::{
    domain::{compute_domain, DomainOptions, ScaleDomain},
    resolver::ScaleType,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{error::LayerError, format::LayerDatum};

#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Display, EnumString, VariantNames,
)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
#[strum(serialize_all = "snake_case")]
pub enum AggregationOp {
    /// Number of non-null values, or of rows when no field is bound
    #[default]
    Count,
    #[strum(to_string = "mean", serialize = "average")]
    #[cfg_attr(feature = "serde", serde(alias = "average"))]
    Mean,
    Mode,
    Sum,
    Min,
    Max,
    Median,
    CountUnique,
}

impl AggregationOp {
    pub fn parse(name: &str) -> Result<Self, LayerError> {
        Self::from_str(name).map_err(|_| LayerError::UnknownAggregation(name.to_string()))
    }

    /// Whether the operation needs numeric values
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            AggregationOp::Count | AggregationOp::Mode | AggregationOp::CountUnique
        )
    }

    /// The operation to use on a field of `field_type`.
    ///
    /// Numeric operations on string and boolean fields fall back to `Mode`.
    pub fn for_field_type(self, field_type: FieldType) -> Self {
        if self.is_numeric() && !field_type.is_numeric() {
            AggregationOp::Mode
        } else {
            self
        }
    }
}

/// Reduce `values` with `op`. Nulls and `NaN` never contribute.
///
/// Operations with no contributing values return `Null` rather than `NaN`. `Count` and
/// `CountUnique` return `0`.
pub fn aggregate<'a, I>(values: I, op: AggregationOp) -> FieldValue
where
    I: IntoIterator<Item = &'a FieldValue>,
{
    let values = values.into_iter().filter(|v| !v.is_null());

    match op {
        AggregationOp::Count => FieldValue::Integer(values.count() as i64),
        AggregationOp::CountUnique => {
            FieldValue::Integer(values.collect::<HashSet<_>>().len() as i64)
        }
        AggregationOp::Mode => mode(values),
        AggregationOp::Min | AggregationOp::Max => {
            let numeric = values.filter_map(|v| v.as_f64().map(|n| (n, v)));
            let extreme = if op == AggregationOp::Min {
                numeric.min_by(|a, b| a.0.total_cmp(&b.0))
            } else {
                numeric.max_by(|a, b| a.0.total_cmp(&b.0))
            };
            extreme.map(|(_, v)| v.clone()).unwrap_or_default()
        }
        AggregationOp::Sum | AggregationOp::Mean | AggregationOp::Median => {
            let numbers: Vec<f64> = values.filter_map(FieldValue::as_f64).collect();
            if numbers.is_empty() {
                return FieldValue::Null;
            }
            let sum: f64 = numbers.iter().sum();
            FieldValue::Real(match op {
                AggregationOp::Sum => sum,
                AggregationOp::Mean => sum / numbers.len() as f64,
                _ => median(numbers),
            })
        }
    }
}

/// Most frequent value, ties go to the value seen first
fn mode<'a>(values: impl Iterator<Item = &'a FieldValue>) -> FieldValue {
    let mut counts: IndexMap<&FieldValue, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&FieldValue, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v.clone()).unwrap_or_default()
}

fn median(numbers: Vec<f64>) -> f64 {
    let sorted = numbers.into_iter().sorted_by(f64::total_cmp).collect_vec();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Key of a spatial bin
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinKey(pub [i64; 2]);

/// Assigns a `[lng, lat]` position to a bin. `None` leaves the point unbinned.
pub trait SpatialBinner {
    fn bin_key(&self, position: [f64; 2]) -> Option<BinKey>;
}

impl<F> SpatialBinner for F
where
    F: Fn([f64; 2]) -> Option<BinKey>,
{
    fn bin_key(&self, position: [f64; 2]) -> Option<BinKey> {
        self(position)
    }
}

const KM_PER_DEGREE: f64 = 111.32;

/// Square cells of `cell_size` degrees anchored at `[0, 0]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBinner {
    cell_size: f64,
}

impl GridBinner {
    pub fn new(cell_size: f64) -> Self {
        Self { cell_size }
    }

    /// Cells of roughly `km` kilometers per side
    pub fn from_km(km: f64) -> Self {
        Self::new(km / KM_PER_DEGREE)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }
}

impl SpatialBinner for GridBinner {
    fn bin_key(&self, [lng, lat]: [f64; 2]) -> Option<BinKey> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0)
            || !lng.is_finite()
            || !lat.is_finite()
        {
            return None;
        }
        Some(BinKey([
            (lng / self.cell_size).floor() as i64,
            (lat / self.cell_size).floor() as i64,
        ]))
    }
}

/// Points of the working set sharing one spatial cell
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub key: BinKey,
    pub points: Vec<LayerDatum>,
}

impl Bin {
    /// Mean position of the bin's points
    pub fn centroid(&self) -> Option<[f64; 2]> {
        let positions = self
            .points
            .iter()
            .filter_map(|p| p.geometry.as_position())
            .collect_vec();
        if positions.is_empty() {
            return None;
        }
        let n = positions.len() as f64;
        let (lng, lat) = positions
            .iter()
            .fold((0.0, 0.0), |(lng, lat), p| (lng + p[0], lat + p[1]));
        Some([lng / n, lat / n])
    }
}

/// Group positioned points into bins, in first-seen bin order.
///
/// Every point lands in at most one bin. Points without a position or bin key are skipped.
pub fn bin_points(points: &[LayerDatum], binner: &dyn SpatialBinner) -> Vec<Bin> {
    let mut bins: IndexMap<BinKey, Vec<LayerDatum>> = IndexMap::new();
    for point in points {
        let Some(key) = point
            .geometry
            .as_position()
            .and_then(|position| binner.bin_key(position))
        else {
            continue;
        };
        bins.entry(key).or_default().push(point.clone());
    }
    bins.into_iter()
        .map(|(key, points)| Bin { key, points })
        .collect()
}

/// Deferred reduction of one channel over a bin's points
#[derive(Debug, Clone, PartialEq)]
pub struct BinReduction {
    op: AggregationOp,
    field: Option<Field>,
    render_filter: Option<Arc<RenderFilter>>,
}

impl BinReduction {
    pub fn new(
        op: AggregationOp,
        field: Option<Field>,
        render_filter: Option<Arc<RenderFilter>>,
    ) -> Self {
        let op = match &field {
            Some(field) => op.for_field_type(field.field_type),
            None => AggregationOp::Count,
        };
        Self {
            op,
            field,
            render_filter,
        }
    }

    pub fn op(&self) -> AggregationOp {
        self.op
    }

    pub fn field(&self) -> Option<&Field> {
        self.field.as_ref()
    }

    /// Reduce the points that pass the render filter
    pub fn evaluate(&self, points: &[LayerDatum]) -> FieldValue {
        let contributing = points.iter().filter(|p| {
            self.render_filter
                .as_ref()
                .map_or(true, |filter| filter.contains(&p.row))
        });

        match &self.field {
            None => FieldValue::Integer(contributing.count() as i64),
            Some(field) => aggregate(
                contributing.filter_map(|p| p.row.get(field.index)),
                self.op,
            ),
        }
    }
}

/// Domain of the reduced bin values.
///
/// Numeric values outside the `[lower, upper]` percentile window are dropped before the
/// domain is computed. Bins that reduce to null are ignored.
pub fn reduced_domain(
    bins: &[Bin],
    reduction: &BinReduction,
    scale_type: ScaleType,
    percentile: [f64; 2],
    options: &DomainOptions,
) -> ScaleDomain {
    let values = bins
        .iter()
        .map(|bin| reduction.evaluate(&bin.points))
        .filter(|v| !v.is_null())
        .collect_vec();

    let numbers = values
        .iter()
        .filter_map(FieldValue::as_f64)
        .sorted_by(f64::total_cmp)
        .collect_vec();
    let window = percentile_window(&numbers, percentile);

    let rows = values
        .into_iter()
        .filter(|v| match (v.as_f64(), window) {
            (Some(n), Some((lo, hi))) => n >= lo && n <= hi,
            _ => true,
        })
        .map(|v| [v])
        .collect_vec();
    let indices = (0..rows.len()).collect_vec();
    compute_domain(&rows, &indices, |row| row.first(), scale_type, options)
}

/// Values at the `[lower, upper]` percentiles of `sorted`, interpolating between neighbors
fn percentile_window(sorted: &[f64], [lower, upper]: [f64; 2]) -> Option<(f64, f64)> {
    let quantile = |p: f64| {
        let pos = (sorted.len() - 1) as f64 * (p / 100.0).clamp(0.0, 1.0);
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(sorted.len() - 1);
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    };
    if sorted.is_empty() {
        return None;
    }
    Some((quantile(lower), quantile(upper)))
}
