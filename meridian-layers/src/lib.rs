pub mod aggregate;
pub mod columns;
pub mod config;
pub mod error;
pub mod format;
pub mod layer;
