//! Order Model
//!
//! 订单内嵌行项列表；退还只就地修改行项 (数量减少、状态流转)，
//! 订单文档本身从不因退还被删除。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use uuid::Uuid;

use super::serde_helpers;

/// Order line status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderLineStatus {
    Pending,
    Completed,
    Returned,
}

/// One hardware line embedded in an order
///
/// `line_id` 是行项自身的标识，定向退还通过它定位行项。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "lineId")]
    pub line_id: String,
    #[serde(rename = "hardwareOldNumber")]
    pub hardware_old_number: String,
    pub quantity: i64,
    pub status: OrderLineStatus,
}

impl OrderLine {
    /// 新的待处理行项 (生成行项 id)
    pub fn pending(hardware_old_number: impl Into<String>, quantity: i64) -> Self {
        Self {
            line_id: Uuid::new_v4().to_string(),
            hardware_old_number: hardware_old_number.into(),
            quantity,
            status: OrderLineStatus::Pending,
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(rename = "empId")]
    pub emp_id: String,
    #[serde(rename = "empName")]
    pub emp_name: String,
    #[serde(rename = "structurePO")]
    pub structure_po: String,
    #[serde(rename = "structureName")]
    pub structure_name: String,
    #[serde(rename = "orders")]
    pub lines: Vec<OrderLine>,
    #[serde(rename = "date")]
    pub created_at: i64,
}

/// Create order payload (engine-internal; wire DTO lives at the API layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub emp_id: String,
    pub emp_name: String,
    pub structure_po: String,
    pub structure_name: String,
    pub lines: Vec<OrderLine>,
}
