//! User Account API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{require_admin, require_superadmin};
use crate::core::ServerState;

/// User router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    // 列表：admin 可见
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_admin));

    // 增删改：仅超级管理员
    let manage_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route(
            "/{id}",
            axum::routing::put(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_superadmin));

    read_routes.merge(manage_routes)
}
