pub mod color;
pub mod domain;
pub mod error;
pub mod numeric;
pub mod ordinal;
pub mod quantile;
pub mod quantize;
pub mod resolver;
