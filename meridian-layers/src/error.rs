use meridian_common::error::DatasetError;
use meridian_scales::error::ScaleError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerError {
    #[error("Scale error: {0}")]
    ScaleError(#[from] ScaleError),

    #[error("Dataset error: {0}")]
    DatasetError(#[from] DatasetError),

    #[error("Unknown layer type: `{0}`")]
    UnknownLayerType(String),

    #[error("Unknown aggregation: `{0}`")]
    UnknownAggregation(String),
}
