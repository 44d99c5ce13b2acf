use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;

/// A discrete scale that maps input values to a fixed set of output values.
///
/// Domain entries are paired with range entries by position. When the domain is longer than
/// the range, the range is reused cyclically. Inputs not found in the domain map to the
/// default value.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalScale<D, R>
where
    D: Clone + Hash + Eq + Debug,
    R: Clone + Debug,
{
    mapping: IndexMap<D, R>,
    default_value: R,
}

impl<D, R> OrdinalScale<D, R>
where
    D: Clone + Hash + Eq + Debug,
    R: Clone + Debug,
{
    /// `range` must not be empty unless `domain` is empty too
    pub fn new(domain: &[D], range: &[R], default_value: R) -> Self {
        let mapping = domain
            .iter()
            .cloned()
            .zip(range.iter().cloned().cycle())
            .collect::<IndexMap<_, _>>();

        Self {
            mapping,
            default_value,
        }
    }

    pub fn default_value(&self) -> &R {
        &self.default_value
    }

    pub fn domain(&self) -> Vec<D> {
        self.mapping.keys().cloned().collect()
    }

    pub fn range(&self) -> Vec<R> {
        self.mapping.values().cloned().collect()
    }

    pub fn scale(&self, value: &D) -> R {
        self.mapping
            .get(value)
            .unwrap_or(&self.default_value)
            .clone()
    }
}
