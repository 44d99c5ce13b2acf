use std::hash::{Hash, Hasher};

use indexmap::IndexSet;
use meridian_common::{dataset::Dataset, value::FieldValue};
use ordered_float::OrderedFloat;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{quantile::quantile_breakpoints, resolver::ScaleType};

/// Input values a scale is calibrated against
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", content = "values", rename_all = "snake_case")
)]
pub enum ScaleDomain {
    /// No eligible values were found
    #[default]
    Empty,
    /// `[min, max]` of a continuous domain
    Interval(f64, f64),
    /// Sample population a quantile scale derives its breakpoints from
    Sample(Vec<f64>),
    /// Precomputed quantile breakpoints
    Breakpoints(Vec<f64>),
    /// Distinct values in first-seen order
    Categories(Vec<FieldValue>),
}

impl ScaleDomain {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScaleDomain::Empty => "empty",
            ScaleDomain::Interval(..) => "interval",
            ScaleDomain::Sample(_) => "sample",
            ScaleDomain::Breakpoints(_) => "breakpoints",
            ScaleDomain::Categories(_) => "categorical",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ScaleDomain::Empty => true,
            ScaleDomain::Interval(..) => false,
            ScaleDomain::Sample(v) => v.is_empty(),
            ScaleDomain::Breakpoints(_) => false,
            ScaleDomain::Categories(v) => v.is_empty(),
        }
    }

    /// Numeric `(min, max)` covered by the domain. `None` for empty and categorical domains.
    pub fn extent(&self) -> Option<(f64, f64)> {
        match self {
            ScaleDomain::Interval(start, end) => Some((*start, *end)),
            ScaleDomain::Sample(values) | ScaleDomain::Breakpoints(values) => {
                numeric_extent(values.iter().copied())
            }
            ScaleDomain::Empty | ScaleDomain::Categories(_) => None,
        }
    }
}

impl Eq for ScaleDomain {}

impl Hash for ScaleDomain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ScaleDomain::Empty => {}
            ScaleDomain::Interval(start, end) => {
                OrderedFloat(*start).hash(state);
                OrderedFloat(*end).hash(state);
            }
            ScaleDomain::Sample(values) | ScaleDomain::Breakpoints(values) => {
                values.len().hash(state);
                values.iter().for_each(|v| OrderedFloat(*v).hash(state));
            }
            ScaleDomain::Categories(values) => values.hash(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainOptions {
    /// Number of quantile buckets, normally the range length
    pub buckets: usize,
    /// Maximum number of ordinal categories. Later values fall into the "other" bucket.
    pub max_categories: Option<usize>,
}

impl Default for DomainOptions {
    fn default() -> Self {
        Self {
            buckets: 6,
            max_categories: None,
        }
    }
}

/// Compute the domain of a channel over the rows selected by `indices`.
///
/// Null and `NaN` values never contribute. Indices past the end of `rows` are ignored.
pub fn compute_domain<R, F>(
    rows: &[R],
    indices: &[usize],
    accessor: F,
    scale_type: ScaleType,
    options: &DomainOptions,
) -> ScaleDomain
where
    R: AsRef<[FieldValue]>,
    F: Fn(&[FieldValue]) -> Option<&FieldValue>,
{
    let values = indices
        .iter()
        .filter_map(|&i| rows.get(i))
        .filter_map(|row| accessor(row.as_ref()))
        .filter(|v| !v.is_null());

    match scale_type {
        ScaleType::Linear | ScaleType::Sqrt | ScaleType::Quantize => {
            numeric_extent(values.filter_map(FieldValue::as_f64))
                .map(|(min, max)| ScaleDomain::Interval(min, max))
                .unwrap_or(ScaleDomain::Empty)
        }
        ScaleType::Log => numeric_extent(values.filter_map(FieldValue::as_f64).filter(|v| *v > 0.0))
            .map(|(min, max)| ScaleDomain::Interval(min, max))
            .unwrap_or(ScaleDomain::Empty),
        ScaleType::Quantile => {
            let mut sorted: Vec<f64> = values
                .filter_map(FieldValue::as_f64)
                .filter(|v| v.is_finite())
                .collect();
            if sorted.is_empty() {
                return ScaleDomain::Empty;
            }
            sorted.sort_by(f64::total_cmp);
            ScaleDomain::Breakpoints(quantile_breakpoints(&sorted, options.buckets))
        }
        ScaleType::Ordinal => {
            let mut categories = IndexSet::new();
            let mut overflow = false;
            for value in values {
                if categories.contains(value) {
                    continue;
                }
                match options.max_categories {
                    Some(max) if categories.len() >= max => overflow = true,
                    _ => {
                        categories.insert(value.clone());
                    }
                }
            }
            if overflow {
                tracing::debug!(
                    "ordinal domain capped at {} categories, remaining values use the default",
                    categories.len()
                );
            }
            if categories.is_empty() {
                ScaleDomain::Empty
            } else {
                ScaleDomain::Categories(categories.into_iter().collect())
            }
        }
    }
}

/// Compute the domain of one field of a dataset.
///
/// Reads `filtered_index_for_domain` when present, else `filtered_index`, else all rows, so
/// the encoding stays stable while interactive filters change the rendered rows.
pub fn compute_field_domain(
    dataset: &Dataset,
    field_idx: usize,
    scale_type: ScaleType,
    options: &DomainOptions,
) -> ScaleDomain {
    compute_domain(
        dataset.rows(),
        dataset.domain_index(),
        |row| row.get(field_idx),
        scale_type,
        options,
    )
}

fn numeric_extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| !v.is_nan())
        .fold(None, |extent, v| match extent {
            None => Some((v, v)),
            Some((min, max)) => Some((f64::min(min, v), f64::max(max, v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_common::dataset::{Field, FieldType};

    fn rows() -> Vec<Vec<FieldValue>> {
        vec![
            vec!["b".into(), 64.into()],
            vec!["a".into(), FieldValue::Null],
            vec!["b".into(), 19.into()],
            vec![FieldValue::Null, FieldValue::Real(f64::NAN)],
            vec!["c".into(), 73.into()],
            vec!["d".into(), (-2.5).into()],
        ]
    }

    #[test]
    fn test_linear_domain_skips_nulls() {
        let rows = rows();
        let domain = compute_domain(
            &rows,
            &[0, 1, 2, 3, 4],
            |row| row.get(1),
            ScaleType::Linear,
            &Default::default(),
        );
        assert_eq!(domain, ScaleDomain::Interval(19.0, 73.0));
    }

    #[test]
    fn test_log_domain_skips_non_positive() {
        let rows = rows();
        let domain = compute_domain(
            &rows,
            &[0, 5],
            |row| row.get(1),
            ScaleType::Log,
            &Default::default(),
        );
        assert_eq!(domain, ScaleDomain::Interval(64.0, 64.0));
    }

    #[test]
    fn test_empty_domain() {
        let rows = rows();
        let domain = compute_domain(
            &rows,
            &[1, 3],
            |row| row.get(1),
            ScaleType::Quantile,
            &Default::default(),
        );
        assert_eq!(domain, ScaleDomain::Empty);
    }

    #[test]
    fn test_ordinal_first_seen_order() {
        let rows = rows();
        let indices: Vec<usize> = (0..rows.len()).collect();
        let domain = compute_domain(
            &rows,
            &indices,
            |row| row.first(),
            ScaleType::Ordinal,
            &Default::default(),
        );
        assert_eq!(
            domain,
            ScaleDomain::Categories(vec!["b".into(), "a".into(), "c".into(), "d".into()])
        );
    }

    #[test]
    fn test_ordinal_cap() {
        let rows = rows();
        let indices: Vec<usize> = (0..rows.len()).collect();
        let domain = compute_domain(
            &rows,
            &indices,
            |row| row.first(),
            ScaleType::Ordinal,
            &DomainOptions {
                max_categories: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(
            domain,
            ScaleDomain::Categories(vec!["b".into(), "a".into()])
        );
    }

    #[test]
    fn test_quantile_domain() {
        let rows: Vec<Vec<FieldValue>> = [1.0, 1.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0]
            .iter()
            .map(|v| vec![FieldValue::from(*v)])
            .collect();
        let indices: Vec<usize> = (0..rows.len()).collect();
        let domain = compute_domain(
            &rows,
            &indices,
            |row| row.first(),
            ScaleType::Quantile,
            &DomainOptions {
                buckets: 3,
                ..Default::default()
            },
        );
        assert_eq!(domain, ScaleDomain::Breakpoints(vec![3.0, 4.0]));
    }

    #[test]
    fn test_field_domain_prefers_domain_index() {
        let fields = vec![
            Field::new("hex_id", FieldType::String, 0),
            Field::new("value", FieldType::Integer, 1),
        ];
        let dataset = Dataset::try_new("h3-hex-id", fields, rows())
            .and_then(|d| d.with_filtered_index(vec![0, 1, 2, 3, 4, 5]))
            .and_then(|d| d.with_filtered_index_for_domain(vec![0, 2]))
            .unwrap();

        let domain = compute_field_domain(&dataset, 1, ScaleType::Linear, &Default::default());
        assert_eq!(domain, ScaleDomain::Interval(19.0, 64.0));
    }
}
