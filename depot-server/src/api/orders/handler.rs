//! Order API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::audit::Actor;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::reconcile::{
    OrderLineRequest, OrderSubmission, ReturnItemRequest, ReturnOutcome, ReturnSubmission,
};
use crate::utils::{AppError, AppResult};

// =============================================================================
// Wire DTOs (legacy camelCase contract)
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub emp_id: String,
    pub emp_name: String,
    #[serde(rename = "structurePO")]
    pub structure_po: String,
    pub structure_name: String,
    pub orders: Vec<OrderLinePayload>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLinePayload {
    #[serde(rename = "hardwareOldNumber")]
    pub hardware_old_number: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub message: String,
    #[serde(rename = "newOrder")]
    pub new_order: Order,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub returner_emp_id: String,
    pub returner_name: String,
    #[serde(rename = "structurePO")]
    pub structure_po: String,
    pub structure_name: String,
    pub returning: Vec<ReturnItemPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemPayload {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(rename = "hardwareOldNumber")]
    pub hardware_old_number: String,
    pub returned_quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub message: String,
    pub results: ReturnOutcome,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/orders - 提交订单 (核对引擎)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<CreateOrderResponse>)> {
    let actor = Actor::employee(&payload.emp_id, &payload.emp_name);

    let submission = OrderSubmission {
        emp_id: payload.emp_id,
        emp_name: payload.emp_name,
        structure_po: payload.structure_po,
        structure_name: payload.structure_name,
        lines: payload
            .orders
            .into_iter()
            .map(|l| OrderLineRequest {
                hardware_old_number: l.hardware_old_number,
                quantity: l.quantity,
            })
            .collect(),
    };

    let order = state.engine().create_order(submission, &actor).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order created successfully".to_string(),
            new_order: order,
        }),
    ))
}

/// GET /api/orders - 所有订单
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let orders = repo
        .find_all()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(orders))
}

/// GET /api/orders/:emp_id - 某员工的订单
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

/// POST /api/orders/return - 退还处理 (核对引擎)
pub async fn process_return(
    State(state): State<ServerState>,
    Extension(_user): Extension<CurrentUser>,
    Json(payload): Json<ReturnRequest>,
) -> AppResult<Json<ReturnResponse>> {
    let actor = Actor::employee(&payload.returner_emp_id, &payload.returner_name);

    let submission = ReturnSubmission {
        returner_emp_id: payload.returner_emp_id,
        returner_name: payload.returner_name,
        structure_po: payload.structure_po,
        structure_name: payload.structure_name,
        returns: payload
            .returning
            .into_iter()
            .map(|r| ReturnItemRequest {
                order_id: r.order_id,
                hardware_old_number: r.hardware_old_number,
                returned_quantity: r.returned_quantity,
            })
            .collect(),
    };

    let results = state.engine().process_returns(submission, &actor).await?;

    Ok(Json(ReturnResponse {
        message: "Return processed".to_string(),
        results,
    }))
}
