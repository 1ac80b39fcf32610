//! Hardware API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_superadmin;
use crate::core::ServerState;

/// Hardware router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/hardware", routes())
}

fn routes() -> Router<ServerState> {
    // 读取路由：登录即可 (下单表单需要库存列表)
    let read_routes = Router::new().route("/", get(handler::list));

    // 管理路由：仅超级管理员
    let manage_routes = Router::new()
        .route("/", axum::routing::post(handler::add))
        .route(
            "/{id}",
            axum::routing::put(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_superadmin));

    read_routes.merge(manage_routes)
}
