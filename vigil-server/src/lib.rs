//! Vigil Server - HTTP boundary for the check service
//!
//! Translates HTTP requests into typed calls on the [`vigil_core`] service
//! contracts and service results (or structured errors) back into responses,
//! decorated with cross-cutting read-only data (attached labels, pagination
//! links).
//!
//! # Module structure
//!
//! ```text
//! vigil-server/src/
//! ├── core/     # config, state, server loop
//! ├── api/      # HTTP routes and handlers
//! └── utils/    # error mapping, logging
//! ```

pub mod api;
pub mod core;
pub mod utils;

// Re-export the public surface.
pub use crate::core::{AppState, Config, Server};
pub use utils::error::{ApiError, ApiResult};
pub use utils::logger::init_logger;
