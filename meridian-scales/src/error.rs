use meridian_common::error::ColorParseError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    #[error("Unknown scale type: `{0}`")]
    UnknownScaleType(String),

    #[error("Scale type `{scale_type}` cannot use a {domain} domain")]
    IncompatibleDomain {
        scale_type: String,
        domain: &'static str,
    },

    #[error("Empty range")]
    EmptyRange,

    #[error("Invalid range color: {0}")]
    InvalidColor(#[from] ColorParseError),
}
