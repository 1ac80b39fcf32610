//! Admin Order API Module
//!
//! 管理端订单操作 (行状态修改、删除)；全部要求 admin 角色。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Admin order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/emp/{emp_id}", get(handler::list_by_emp))
        .route(
            "/{id}",
            put(handler::update_line_status).delete(handler::delete_order),
        )
        .layer(middleware::from_fn(require_admin))
}
