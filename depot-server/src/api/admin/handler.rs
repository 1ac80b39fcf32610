//! Admin Order API Handlers
//!
//! 不经核对引擎的普通 CRUD；库存与分配不受影响
//! (管理端明确承担该责任)。

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::{Actor, AuditAction};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderLineStatus};
use crate::db::repository::OrderRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/admin/orders - 所有订单
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let orders = repo
        .find_all()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(orders))
}

/// GET /api/admin/orders/emp/:emp_id - 某员工的订单
pub async fn list_by_emp(
    State(state): State<ServerState>,
    Path(emp_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let orders = repo
        .find_by_emp(&emp_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(orders))
}

/// 行状态更新请求
#[derive(Debug, Deserialize)]
pub struct UpdateLineStatusRequest {
    #[serde(rename = "itemId")]
    pub item_id: String,
    pub status: OrderLineStatus,
}

#[derive(Debug, Serialize)]
pub struct UpdateOrderResponse {
    pub message: String,
    pub order: Order,
}

/// PUT /api/admin/orders/:id - 修改一个行项的状态
pub async fn update_line_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLineStatusRequest>,
) -> AppResult<Json<UpdateOrderResponse>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    let mut lines = order.lines.clone();
    let line = lines
        .iter_mut()
        .find(|l| l.line_id == payload.item_id)
        .ok_or_else(|| AppError::not_found(format!("Order line {} not found", payload.item_id)))?;

    let previous = line.status;
    line.status = payload.status;

    let order_id = order
        .id
        .clone()
        .ok_or_else(|| AppError::internal("order missing record id"))?;
    let updated = repo.set_lines(&order_id, lines).await?;

    state
        .audit_service
        .log(
            AuditAction::OrderUpdated,
            Actor::user(&user.id, &user.username),
            json!({
                "orderId": order_id.to_string(),
                "lineId": payload.item_id,
                "previousStatus": previous,
                "newStatus": payload.status,
            }),
        )
        .await;

    Ok(Json(UpdateOrderResponse {
        message: "Order updated successfully".to_string(),
        order: updated,
    }))
}

/// DELETE /api/admin/orders/:id - 删除订单
pub async fn delete_order(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;

    state
        .audit_service
        .log(
            AuditAction::OrderDeleted,
            Actor::user(&user.id, &user.username),
            json!({
                "orderId": id,
                "empId": &deleted.emp_id,
                "structurePO": &deleted.structure_po,
            }),
        )
        .await;

    Ok(Json(deleted))
}
