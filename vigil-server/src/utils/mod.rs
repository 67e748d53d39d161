//! Utilities
//!
//! Error translation and logging infrastructure.

pub mod error;
pub mod logger;

pub use error::{ApiError, ApiResult};
