//! 核对引擎请求/结果类型
//!
//! 引擎输入为已反序列化的内部结构 (snake_case)；
//! 退还结果直接序列化进 API 响应，字段名保持 camelCase 契约。

use serde::Serialize;

/// Order submission
#[derive(Debug, Clone)]
pub struct OrderSubmission {
    pub emp_id: String,
    pub emp_name: String,
    pub structure_po: String,
    pub structure_name: String,
    pub lines: Vec<OrderLineRequest>,
}

/// One requested line of an order submission
#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    pub hardware_old_number: String,
    pub quantity: i64,
}

/// Return submission
#[derive(Debug, Clone)]
pub struct ReturnSubmission {
    pub returner_emp_id: String,
    pub returner_name: String,
    pub structure_po: String,
    pub structure_name: String,
    pub returns: Vec<ReturnItemRequest>,
}

/// One requested return item
///
/// `order_id` 为目标行项的 `lineId`；缺省时按最旧订单优先冲销。
#[derive(Debug, Clone)]
pub struct ReturnItemRequest {
    pub order_id: Option<String>,
    pub hardware_old_number: String,
    pub returned_quantity: i64,
}

/// Partitioned return outcome
///
/// 单项失败不影响其余项；端点整体只在结构缺失或请求
/// 形状非法时失败。
#[derive(Debug, Default, Serialize)]
pub struct ReturnOutcome {
    pub success: Vec<ReturnItemSuccess>,
    pub skipped: Vec<ReturnItemSkipped>,
    pub errors: Vec<ReturnItemFailure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemSuccess {
    pub hardware_old_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// 实际退还量 (定向退还对行项余量收口)
    pub returned_quantity: i64,
    pub remaining_stock: i64,
    pub remaining_allocation: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemSkipped {
    pub hardware_old_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemFailure {
    pub hardware_old_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub error: String,
}
