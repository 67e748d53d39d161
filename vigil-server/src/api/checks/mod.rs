//! Check API module

mod handler;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::core::AppState;

pub use handler::{CheckResponse, ChecksResponse, PaginationLinks};

pub fn router() -> Router<AppState> {
    Router::new().nest("/checks", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            patch(handler::update)
                .get(handler::get_by_id)
                .delete(handler::delete),
        )
}
