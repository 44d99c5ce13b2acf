use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
};

use indexmap::IndexMap;
use lazy_static::lazy_static;
use lru::LruCache;
use meridian_common::{dataset::Field, value::FieldValue};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::layer::LayerType;

static NULL: FieldValue = FieldValue::Null;

const TOKEN_FIELDS: &[&str] = &["token", "s2_token"];
const HEX_ID_FIELDS: &[&str] = &["hex_id", "hexagon_id", "h3_id"];
const POINT_FIELD_PAIRS: &[(&str, &str)] = &[
    ("lat", "lng"),
    ("lat", "lon"),
    ("latitude", "longitude"),
];

/// A logical column bound to a dataset field
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ColumnBinding {
    /// Name of the bound field
    pub value: String,
    pub field_idx: Option<usize>,
}

/// Logical column name to field binding, e.g. `token` or `lat`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ColumnBindings(IndexMap<String, ColumnBinding>);

impl ColumnBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: &str, field: &Field) -> Self {
        self.0.insert(
            column.to_string(),
            ColumnBinding {
                value: field.name.clone(),
                field_idx: Some(field.index),
            },
        );
        self
    }

    pub fn with_binding(mut self, column: &str, binding: ColumnBinding) -> Self {
        self.0.insert(column.to_string(), binding);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnBinding> {
        self.0.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnBinding)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The value that places a row on the map
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Cell token or id (S2 token, H3 index)
    Token(String),
    /// `[lng, lat]`
    Position([f64; 2]),
}

impl Geometry {
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Geometry::Token(token) => Some(token),
            Geometry::Position(_) => None,
        }
    }

    pub fn as_position(&self) -> Option<[f64; 2]> {
        match self {
            Geometry::Position(position) => Some(*position),
            Geometry::Token(_) => None,
        }
    }
}

/// Reads bound columns out of dataset rows by position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowAccessor {
    columns: Vec<(String, usize)>,
}

impl RowAccessor {
    pub fn columns(&self) -> &[(String, usize)] {
        &self.columns
    }

    pub fn field_idx(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, idx)| *idx)
    }

    /// Value of `column` in `row`, `Null` when the column is unbound or past the row's end
    pub fn value<'a>(&self, row: &'a [FieldValue], column: &str) -> &'a FieldValue {
        self.field_idx(column)
            .and_then(|idx| row.get(idx))
            .unwrap_or(&NULL)
    }

    /// Geometry of a row, `None` when any geometry column is null.
    ///
    /// Rows are positioned by `lat`/`lng` when both are bound, otherwise by the first
    /// column's token. Empty tokens count as null.
    pub fn geometry(&self, row: &[FieldValue]) -> Option<Geometry> {
        if self.field_idx("lat").is_some() && self.field_idx("lng").is_some() {
            let lat = self.value(row, "lat").as_f64()?;
            let lng = self.value(row, "lng").as_f64()?;
            return Some(Geometry::Position([lng, lat]));
        }

        let (_, idx) = self.columns.first()?;
        match row.get(*idx)? {
            FieldValue::String(token) if token.is_empty() => None,
            FieldValue::String(token) => Some(Geometry::Token(token.clone())),
            value if value.is_null() => None,
            value => Some(Geometry::Token(value.to_string())),
        }
    }
}

lazy_static! {
    static ref GLOBAL_ACCESSOR_RESOLVER: AccessorResolver = AccessorResolver::default();
}

/// Memoizes row accessors by the positional indices they resolve to
#[derive(Debug)]
pub struct AccessorResolver {
    cache: Mutex<LruCache<Vec<(String, usize)>, Arc<RowAccessor>>>,
}

impl Default for AccessorResolver {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl AccessorResolver {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn global() -> &'static AccessorResolver {
        &GLOBAL_ACCESSOR_RESOLVER
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<Vec<(String, usize)>, Arc<RowAccessor>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resolve the accessor for the `required` columns.
    ///
    /// Returns `None` when a required column has no bound field. Bindings that resolve to the
    /// same positions share one accessor.
    pub fn resolve(
        &self,
        bindings: &ColumnBindings,
        required: &[&str],
    ) -> Option<Arc<RowAccessor>> {
        let mut columns = Vec::with_capacity(required.len());
        for column in required {
            match bindings.get(column).and_then(|b| b.field_idx) {
                Some(idx) => columns.push((column.to_string(), idx)),
                None => {
                    tracing::warn!("required column `{}` is not bound to a field", column);
                    return None;
                }
            }
        }

        if let Some(accessor) = self.lock().get(&columns) {
            tracing::debug!("row accessor cache hit for {:?}", columns);
            return Some(accessor.clone());
        }

        let accessor = Arc::new(RowAccessor {
            columns: columns.clone(),
        });
        self.lock().put(columns, accessor.clone());
        Some(accessor)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Propose column bindings for a layer type from field names.
///
/// Returns one candidate per matching field (or lat/lng pair), in field order.
pub fn find_default_columns(layer_type: LayerType, fields: &[Field]) -> Vec<ColumnBindings> {
    match layer_type {
        LayerType::S2 => find_token_columns("token", TOKEN_FIELDS, fields),
        LayerType::H3 => find_token_columns("hex_id", HEX_ID_FIELDS, fields),
        LayerType::Hexagon | LayerType::Grid => find_point_columns(fields),
    }
}

fn find_token_columns(column: &str, names: &[&str], fields: &[Field]) -> Vec<ColumnBindings> {
    fields
        .iter()
        .filter(|f| names.contains(&f.name.to_lowercase().as_str()))
        .map(|f| ColumnBindings::new().with_column(column, f))
        .collect()
}

fn find_point_columns(fields: &[Field]) -> Vec<ColumnBindings> {
    let mut found = Vec::new();
    for lat_field in fields {
        let lat_name = lat_field.name.to_lowercase();
        for (lat, lng) in POINT_FIELD_PAIRS {
            let Some(prefix) = lat_name.strip_suffix(lat) else {
                continue;
            };
            if !(prefix.is_empty() || prefix.ends_with('_') || prefix.ends_with('.')) {
                continue;
            }
            let lng_name = format!("{prefix}{lng}");
            if let Some(lng_field) = fields.iter().find(|f| f.name.to_lowercase() == lng_name) {
                found.push(
                    ColumnBindings::new()
                        .with_column("lat", lat_field)
                        .with_column("lng", lng_field),
                );
                break;
            }
        }
    }
    found
}
