use std::{
    hash::{Hash, Hasher},
    num::NonZeroUsize,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use lazy_static::lazy_static;
use lru::LruCache;
use meridian_common::value::{Attribute, FieldValue, Rgb};
use ordered_float::OrderedFloat;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{
    color::ColorRampScale,
    domain::ScaleDomain,
    error::ScaleError,
    numeric::{
        linear::LinearNumericScale, log::LogNumericScale, pow::PowNumericScale,
        ContinuousNumericScale, NumericScale,
    },
    ordinal::OrdinalScale,
    quantile::QuantileScale,
    quantize::QuantizeScale,
};

#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Display, EnumString, VariantNames,
)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[strum(serialize_all = "lowercase")]
pub enum ScaleType {
    #[default]
    Linear,
    Sqrt,
    Log,
    Quantize,
    Quantile,
    Ordinal,
}

impl ScaleType {
    /// Parse a scale type name, failing with `UnknownScaleType`
    pub fn parse(name: &str) -> Result<Self, ScaleError> {
        Self::from_str(name).map_err(|_| ScaleError::UnknownScaleType(name.to_string()))
    }

    /// Whether the scale interpolates over a continuous numeric domain
    pub fn is_continuous(&self) -> bool {
        matches!(self, ScaleType::Linear | ScaleType::Sqrt | ScaleType::Log)
    }
}

/// Ordered output values of a scale
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ScaleRange {
    Numeric(Vec<f64>),
    Colors(Vec<Rgb>),
}

impl ScaleRange {
    /// Build a color range from `#rrggbb` strings
    pub fn from_hex_colors<S: AsRef<str>>(colors: &[S]) -> Result<Self, ScaleError> {
        let colors = colors
            .iter()
            .map(|c| c.as_ref().parse::<Rgb>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScaleRange::Colors(colors))
    }

    pub fn len(&self) -> usize {
        match self {
            ScaleRange::Numeric(v) => v.len(),
            ScaleRange::Colors(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first(&self) -> Option<Attribute> {
        self.attributes().into_iter().next()
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        match self {
            ScaleRange::Numeric(v) => v.iter().copied().map(Attribute::Number).collect(),
            ScaleRange::Colors(v) => v.iter().copied().map(Attribute::Color).collect(),
        }
    }
}

impl Eq for ScaleRange {}

impl Hash for ScaleRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ScaleRange::Numeric(values) => {
                0u8.hash(state);
                values.len().hash(state);
                values.iter().for_each(|v| OrderedFloat(*v).hash(state));
            }
            ScaleRange::Colors(colors) => {
                1u8.hash(state);
                colors.hash(state);
            }
        }
    }
}

/// Pure mapping from a field value to a visual attribute
#[derive(Debug, Clone, PartialEq)]
pub enum VisualScale {
    Constant(Attribute),
    /// Single-valued domain or range. Nulls still map to `default`.
    Uniform {
        value: Attribute,
        default: Attribute,
    },
    Numeric {
        scale: NumericScale,
        default: Attribute,
    },
    Color {
        scale: ColorRampScale,
        default: Attribute,
    },
    Quantize(QuantizeScale<Attribute>),
    Quantile(QuantileScale<Attribute>),
    Ordinal(OrdinalScale<FieldValue, Attribute>),
}

impl VisualScale {
    pub fn scale(&self, value: &FieldValue) -> Attribute {
        match self {
            VisualScale::Constant(attr) => *attr,
            VisualScale::Uniform { value: attr, default } => {
                if value.as_f64().is_some_and(f64::is_finite) {
                    *attr
                } else {
                    *default
                }
            }
            VisualScale::Numeric { scale, default } => value
                .as_f64()
                .map(|v| scale.scale(v))
                .filter(|v| v.is_finite())
                .map(Attribute::Number)
                .unwrap_or(*default),
            VisualScale::Color { scale, default } => value
                .as_f64()
                .and_then(|v| scale.scale(v))
                .map(Attribute::Color)
                .unwrap_or(*default),
            VisualScale::Quantize(scale) => scale.scale(value.as_f64().unwrap_or(f64::NAN)),
            VisualScale::Quantile(scale) => scale.scale(value.as_f64().unwrap_or(f64::NAN)),
            VisualScale::Ordinal(scale) => {
                if value.is_null() {
                    *scale.default_value()
                } else {
                    scale.scale(value)
                }
            }
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            VisualScale::Constant(_) | VisualScale::Uniform { .. }
        )
    }
}

/// Build the scale for a (type, domain, range, default) combination.
///
/// Empty domains, single-valued domains and single-entry ranges degenerate to constant
/// functions, though single-valued ones still send nulls to `default`. Nulls and values outside an ordinal domain map to `default`, or to the first
/// range entry when no default is given.
pub fn build_scale(
    scale_type: ScaleType,
    domain: &ScaleDomain,
    range: &ScaleRange,
    default: Option<Attribute>,
) -> Result<VisualScale, ScaleError> {
    let Some(first) = range.first() else {
        return Err(ScaleError::EmptyRange);
    };
    let default = default.unwrap_or(first);

    if domain.is_empty() {
        return Ok(VisualScale::Constant(default));
    }

    let incompatible = || ScaleError::IncompatibleDomain {
        scale_type: scale_type.to_string(),
        domain: domain.kind_name(),
    };

    match scale_type {
        ScaleType::Linear | ScaleType::Sqrt | ScaleType::Log => {
            let (start, end) = domain.extent().ok_or_else(incompatible)?;
            if start == end || range.len() == 1 {
                return Ok(VisualScale::Uniform {
                    value: first,
                    default,
                });
            }
            let numeric: NumericScale = match scale_type {
                ScaleType::Sqrt => PowNumericScale::sqrt().into(),
                ScaleType::Log => LogNumericScale::new().into(),
                _ => LinearNumericScale::new(&Default::default()).into(),
            };
            let numeric = numeric.with_domain((start, end));

            Ok(match range {
                ScaleRange::Numeric(values) => VisualScale::Numeric {
                    scale: numeric.with_range((values[0], values[values.len() - 1])),
                    default,
                },
                ScaleRange::Colors(colors) => VisualScale::Color {
                    scale: ColorRampScale::new(numeric, colors),
                    default,
                },
            })
        }
        ScaleType::Quantize => {
            let extent = domain.extent().ok_or_else(incompatible)?;
            Ok(VisualScale::Quantize(QuantizeScale::new(
                extent,
                range.attributes(),
                default,
            )))
        }
        ScaleType::Quantile => match domain {
            ScaleDomain::Breakpoints(breakpoints) => Ok(VisualScale::Quantile(
                QuantileScale::from_breakpoints(breakpoints.clone(), range.attributes(), default),
            )),
            ScaleDomain::Sample(sample) => Ok(VisualScale::Quantile(QuantileScale::from_sample(
                sample,
                range.attributes(),
                default,
            ))),
            ScaleDomain::Interval(start, end) => Ok(VisualScale::Quantile(
                QuantileScale::from_sample(&[*start, *end], range.attributes(), default),
            )),
            _ => Err(incompatible()),
        },
        ScaleType::Ordinal => match domain {
            ScaleDomain::Categories(categories) => Ok(VisualScale::Ordinal(OrdinalScale::new(
                categories,
                &range.attributes(),
                default,
            ))),
            _ => Err(incompatible()),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScaleKey {
    scale_type: ScaleType,
    domain: ScaleDomain,
    range: ScaleRange,
    default: Option<Attribute>,
}

lazy_static! {
    static ref GLOBAL_SCALE_RESOLVER: ScaleResolver = ScaleResolver::default();
}

/// Memoizes built scales by the structure of their inputs.
///
/// Scales are pure functions of their key, so concurrent writers of the same key are
/// last-writer-wins.
#[derive(Debug)]
pub struct ScaleResolver {
    cache: Mutex<LruCache<ScaleKey, Arc<VisualScale>>>,
}

impl Default for ScaleResolver {
    fn default() -> Self {
        Self::with_capacity(128)
    }
}

impl ScaleResolver {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Process-wide resolver
    pub fn global() -> &'static ScaleResolver {
        &GLOBAL_SCALE_RESOLVER
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<ScaleKey, Arc<VisualScale>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached scale for these inputs, building it on a miss
    pub fn resolve(
        &self,
        scale_type: ScaleType,
        domain: &ScaleDomain,
        range: &ScaleRange,
        default: Option<Attribute>,
    ) -> Result<Arc<VisualScale>, ScaleError> {
        let key = ScaleKey {
            scale_type,
            domain: domain.clone(),
            range: range.clone(),
            default,
        };
        if let Some(scale) = self.lock().get(&key) {
            tracing::debug!("scale cache hit for {} scale", scale_type);
            return Ok(scale.clone());
        }

        let scale = Arc::new(build_scale(scale_type, domain, range, default)?);
        self.lock().put(key, scale.clone());
        Ok(scale)
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
