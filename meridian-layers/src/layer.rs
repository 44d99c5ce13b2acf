use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::error::LayerError;

#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Display, EnumString, VariantNames,
)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[strum(serialize_all = "lowercase")]
pub enum LayerType {
    /// Polygons addressed by S2 cell tokens
    #[default]
    S2,
    /// Hexagons addressed by H3 cell ids
    H3,
    /// Points binned into hexagons
    Hexagon,
    /// Points binned into square cells
    Grid,
}

/// Keys of the payload emitted for a layer, in emission order
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Display, EnumString, VariantNames)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
#[strum(serialize_all = "camelCase")]
pub enum AccessorKey {
    GetHexId,
    GetPosition,
    GetFillColor,
    GetElevation,
    GetCoverage,
    GetColorValue,
    GetElevationValue,
}

impl LayerType {
    pub fn parse(name: &str) -> Result<Self, LayerError> {
        Self::from_str(name).map_err(|_| LayerError::UnknownLayerType(name.to_string()))
    }

    /// Whether rows are grouped into spatial bins before encoding
    pub fn is_aggregated(&self) -> bool {
        matches!(self, LayerType::Hexagon | LayerType::Grid)
    }

    /// Columns that must be bound and non-null for a row to be rendered
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            LayerType::S2 => &["token"],
            LayerType::H3 => &["hex_id"],
            LayerType::Hexagon | LayerType::Grid => &["lat", "lng"],
        }
    }

    pub fn accessor_keys(&self) -> &'static [AccessorKey] {
        use AccessorKey::*;
        match self {
            LayerType::S2 => &[GetFillColor, GetElevation],
            LayerType::H3 => &[GetHexId, GetFillColor, GetElevation, GetCoverage],
            LayerType::Hexagon | LayerType::Grid => {
                &[GetPosition, GetColorValue, GetElevationValue]
            }
        }
    }

    /// Visual settings a layer of this type exposes
    pub fn vis_config_keys(&self) -> &'static [&'static str] {
        match self {
            LayerType::S2 => &[
                "opacity",
                "colorRange",
                "filled",
                "enable3d",
                "elevationScale",
                "elevationPercentile",
                "sizeRange",
            ],
            LayerType::H3 => &[
                "opacity",
                "colorRange",
                "coverage",
                "enable3d",
                "sizeRange",
                "coverageRange",
                "elevationScale",
            ],
            LayerType::Hexagon | LayerType::Grid => &[
                "opacity",
                "worldUnitSize",
                "colorRange",
                "coverage",
                "sizeRange",
                "percentile",
                "elevationPercentile",
                "elevationScale",
                "enable3d",
            ],
        }
    }
}
