//! Order API Module
//!
//! 订单提交与退还经由核对引擎；查询为直接读取。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 下单/退还/查询：登录即可 (员工基础操作)
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/return", post(handler::process_return))
        .route("/{emp_id}", get(handler::list_by_emp))
}
