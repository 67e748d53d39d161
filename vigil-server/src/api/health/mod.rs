//! Health API module

mod handler;

use axum::{routing::get, Router};

use crate::core::AppState;

/// Health router - public route, no authentication
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(handler::health))
}
