use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
    str::FromStr,
};

use ordered_float::OrderedFloat;
use palette::Srgb;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ColorParseError;

/// A single cell of a dataset row.
///
/// Timestamps are stored as `Integer` epoch milliseconds; the owning field's
/// `FieldType` says how to interpret them.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum FieldValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl FieldValue {
    /// Whether the value is missing. `NaN` reals count as missing.
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Real(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value, `None` for nulls, `NaN` and strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Real(v) if !v.is_nan() => Some(*v),
            FieldValue::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            (FieldValue::Real(a), FieldValue::Real(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Null => {}
            FieldValue::Boolean(v) => v.hash(state),
            FieldValue::Integer(v) => v.hash(state),
            FieldValue::Real(v) => OrderedFloat(*v).hash(state),
            FieldValue::String(v) => v.hash(state),
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Boolean(v) => write!(f, "{v}"),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Real(v) => write!(f, "{v}"),
            FieldValue::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// 8-bit sRGB color as consumed by the render stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn to_srgb(self) -> Srgb<f32> {
        Srgb::new(self.0[0], self.0[1], self.0[2]).into_format()
    }

    pub fn from_srgb(color: Srgb<f32>) -> Self {
        let c: Srgb<u8> = color.into_format();
        Self([c.red, c.green, c.blue])
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    /// Parses `#rrggbb` / `#rgb` hex strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = Srgb::<u8>::from_str(s.trim()).map_err(|_| ColorParseError(s.to_string()))?;
        Ok(Self([color.red, color.green, color.blue]))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Self(value)
    }
}

/// Output of a visual scale
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum Attribute {
    Number(f64),
    Color(Rgb),
}

impl Attribute {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Attribute::Number(v) => Some(*v),
            Attribute::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgb> {
        match self {
            Attribute::Color(c) => Some(*c),
            Attribute::Number(_) => None,
        }
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Attribute::Number(v) => {
                0u8.hash(state);
                OrderedFloat(*v).hash(state);
            }
            Attribute::Color(c) => {
                1u8.hash(state);
                c.hash(state);
            }
        }
    }
}

impl From<f64> for Attribute {
    fn from(value: f64) -> Self {
        Attribute::Number(value)
    }
}

impl From<Rgb> for Attribute {
    fn from(value: Rgb) -> Self {
        Attribute::Color(value)
    }
}
