//! Hardware Item Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Hardware inventory item
///
/// `old_number` 存储为规范化形式 (trim + uppercase)；
/// 库存数量不变量: `quantity >= 0`，所有变更都是受该下界约束的增量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hardware {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(rename = "hardwareName", default)]
    pub name: Option<String>,
    #[serde(rename = "hardwareOldNumber")]
    pub old_number: String,
    #[serde(rename = "hardwarePO")]
    pub purchase_order: String,
    #[serde(rename = "hardwareGroupName")]
    pub group_name: String,
    pub quantity: i64,
    #[serde(rename = "hardwareDescription")]
    pub description: String,
    #[serde(rename = "dateAdded")]
    pub created_at: i64,
}

/// Create hardware payload
///
/// 批量导入路径的去重键为 (`hardwarePO`, `hardwareOldNumber`)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareCreate {
    #[serde(rename = "hardwareName", default)]
    pub name: Option<String>,
    #[serde(rename = "hardwareOldNumber")]
    pub old_number: String,
    #[serde(rename = "hardwarePO")]
    pub purchase_order: String,
    #[serde(rename = "hardwareGroupName")]
    pub group_name: String,
    pub quantity: i64,
    #[serde(rename = "hardwareDescription")]
    pub description: String,
}

/// Update hardware payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareUpdate {
    #[serde(rename = "hardwareName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "hardwareOldNumber", skip_serializing_if = "Option::is_none")]
    pub old_number: Option<String>,
    #[serde(rename = "hardwarePO", skip_serializing_if = "Option::is_none")]
    pub purchase_order: Option<String>,
    #[serde(rename = "hardwareGroupName", skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "hardwareDescription", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
