use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{error::DatasetError, value::FieldValue};

/// A dataset row. Rows are shared between the dataset and every payload built from it.
pub type Row = Arc<[FieldValue]>;

#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Display, EnumString, VariantNames,
)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
#[strum(serialize_all = "snake_case")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Real,
    Timestamp,
    Boolean,
}

impl FieldType {
    /// Whether values of this type can be averaged, summed and interpolated
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::Real | FieldType::Timestamp
        )
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Field {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub field_type: FieldType,
    /// Position of the field's value inside each row
    pub index: usize,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, index: usize) -> Self {
        Self {
            name: name.into(),
            field_type,
            index,
        }
    }
}

/// Inclusive numeric range on one field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct FilterRange {
    pub field_idx: usize,
    pub min: f64,
    pub max: f64,
}

/// Value ranges applied by the render stage rather than by `filtered_index`.
///
/// Rows that fail the filter stay in the working set but do not contribute to
/// aggregated bin values.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderFilter {
    pub ranges: Vec<FilterRange>,
}

impl RenderFilter {
    pub fn new(ranges: Vec<FilterRange>) -> Self {
        Self { ranges }
    }

    /// Whether every range contains the row's value. Null values never pass.
    pub fn contains(&self, row: &[FieldValue]) -> bool {
        self.ranges.iter().all(|range| {
            row.get(range.field_idx)
                .and_then(FieldValue::as_f64)
                .map(|v| v >= range.min && v <= range.max)
                .unwrap_or(false)
        })
    }
}

/// Read-only snapshot of a tabular dataset handed to the formatter.
#[derive(Debug, Clone)]
pub struct Dataset {
    id: String,
    fields: Vec<Field>,
    rows: Vec<Row>,
    all_indexes: Vec<usize>,
    filtered_index: Option<Vec<usize>>,
    filtered_index_for_domain: Option<Vec<usize>>,
    render_filter: Option<Arc<RenderFilter>>,
}

impl Dataset {
    /// Build a dataset, checking that every row has one value per field
    pub fn try_new(
        id: impl Into<String>,
        fields: Vec<Field>,
        rows: Vec<Vec<FieldValue>>,
    ) -> Result<Self, DatasetError> {
        let arity = fields.len();
        for field in &fields {
            if field.index >= arity {
                return Err(DatasetError::FieldIndexOutOfBounds {
                    name: field.name.clone(),
                    index: field.index,
                    arity,
                });
            }
        }

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != arity {
                    Err(DatasetError::RowArity {
                        row: i,
                        expected: arity,
                        found: row.len(),
                    })
                } else {
                    Ok(Row::from(row))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: id.into(),
            fields,
            all_indexes: (0..rows.len()).collect(),
            rows,
            filtered_index: None,
            filtered_index_for_domain: None,
            render_filter: None,
        })
    }

    /// Sets the indices of rows passing row-level filters
    pub fn with_filtered_index(mut self, index: Vec<usize>) -> Result<Self, DatasetError> {
        self.validate_index(&index)?;
        self.filtered_index = Some(index);
        Ok(self)
    }

    /// Sets the indices used only for domain computation
    pub fn with_filtered_index_for_domain(
        mut self,
        index: Vec<usize>,
    ) -> Result<Self, DatasetError> {
        self.validate_index(&index)?;
        self.filtered_index_for_domain = Some(index);
        Ok(self)
    }

    pub fn with_render_filter(mut self, filter: RenderFilter) -> Self {
        self.render_filter = Some(Arc::new(filter));
        self
    }

    fn validate_index(&self, index: &[usize]) -> Result<(), DatasetError> {
        let len = self.rows.len();
        if let Some(&index) = index.iter().find(|&&i| i >= len) {
            return Err(DatasetError::IndexOutOfBounds { index, len });
        }
        if let Some(w) = index.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DatasetError::UnsortedIndex {
                prev: w[0],
                next: w[1],
            });
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn all_indexes(&self) -> &[usize] {
        &self.all_indexes
    }

    pub fn filtered_index(&self) -> Option<&[usize]> {
        self.filtered_index.as_deref()
    }

    pub fn filtered_index_for_domain(&self) -> Option<&[usize]> {
        self.filtered_index_for_domain.as_deref()
    }

    pub fn render_filter(&self) -> Option<&Arc<RenderFilter>> {
        self.render_filter.as_ref()
    }

    /// Indices of the rows handed to the render stage
    pub fn render_index(&self) -> &[usize] {
        self.filtered_index().unwrap_or(&self.all_indexes)
    }

    /// Indices used to compute scale domains.
    ///
    /// Falls back from `filtered_index_for_domain` to `filtered_index` to all rows.
    pub fn domain_index(&self) -> &[usize] {
        self.filtered_index_for_domain()
            .or(self.filtered_index())
            .unwrap_or(&self.all_indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<Field> {
        vec![
            Field::new("hex_id", FieldType::String, 0),
            Field::new("value", FieldType::Integer, 1),
        ]
    }

    fn rows() -> Vec<Vec<FieldValue>> {
        vec![
            vec!["89283082c2fffff".into(), 64.into()],
            vec!["8928308288fffff".into(), 73.into()],
            vec!["89283082c07ffff".into(), FieldValue::Null],
        ]
    }

    #[test]
    fn test_domain_index_fallback() -> Result<(), DatasetError> {
        let dataset = Dataset::try_new("h3-hex-id", fields(), rows())?;
        assert_eq!(dataset.domain_index(), &[0, 1, 2]);

        let dataset = dataset.with_filtered_index(vec![0, 2])?;
        assert_eq!(dataset.domain_index(), &[0, 2]);
        assert_eq!(dataset.render_index(), &[0, 2]);

        let dataset = dataset.with_filtered_index_for_domain(vec![1])?;
        assert_eq!(dataset.domain_index(), &[1]);
        assert_eq!(dataset.render_index(), &[0, 2]);
        Ok(())
    }

    #[test]
    fn test_invalid_indices() -> Result<(), DatasetError> {
        let dataset = Dataset::try_new("h3-hex-id", fields(), rows())?;
        assert_eq!(
            dataset.clone().with_filtered_index(vec![0, 3]).unwrap_err(),
            DatasetError::IndexOutOfBounds { index: 3, len: 3 }
        );
        assert_eq!(
            dataset.with_filtered_index(vec![1, 1]).unwrap_err(),
            DatasetError::UnsortedIndex { prev: 1, next: 1 }
        );
        Ok(())
    }

    #[test]
    fn test_row_arity() {
        let err = Dataset::try_new("bad", fields(), vec![vec![FieldValue::Null]]).unwrap_err();
        assert_eq!(
            err,
            DatasetError::RowArity {
                row: 0,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_render_filter_rejects_nulls() {
        let filter = RenderFilter::new(vec![FilterRange {
            field_idx: 1,
            min: 60.0,
            max: 70.0,
        }]);
        let rows = rows();
        assert!(filter.contains(&rows[0]));
        assert!(!filter.contains(&rows[1]));
        assert!(!filter.contains(&rows[2]));
    }
}
