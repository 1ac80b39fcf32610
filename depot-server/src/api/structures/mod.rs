//! Structure API Module (只读)

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Structure router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/structures", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{po}", get(handler::get_by_po))
}
