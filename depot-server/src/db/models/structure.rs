//! Structure Model
//!
//! "Structure" 即一个项目/工单，由采购单号 (PO) 唯一标识，
//! 硬件按结构领用，`hardware_allocation` 记录当前领用量。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Running allocation of one hardware number against a structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    #[serde(rename = "hardwareOldNumber")]
    pub hardware_old_number: String,
    pub quantity: i64,
}

/// Structure entity
///
/// 首次引用未知 PO 的订单会惰性创建结构。
/// 分配数量只会被引擎验证过的退还减少。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(rename = "structurePO")]
    pub structure_po: String,
    #[serde(rename = "structureName")]
    pub structure_name: String,
    #[serde(rename = "hardwareAllocation", default)]
    pub hardware_allocation: Vec<Allocation>,
}

impl Structure {
    /// 查找指定硬件编号的分配项 (编号已规范化)
    pub fn allocation_for(&self, old_number: &str) -> Option<&Allocation> {
        self.hardware_allocation
            .iter()
            .find(|a| a.hardware_old_number == old_number)
    }

    /// 增加分配量，条目不存在时创建
    pub fn add_allocation(&mut self, old_number: &str, quantity: i64) {
        match self
            .hardware_allocation
            .iter_mut()
            .find(|a| a.hardware_old_number == old_number)
        {
            Some(entry) => entry.quantity += quantity,
            None => self.hardware_allocation.push(Allocation {
                hardware_old_number: old_number.to_string(),
                quantity,
            }),
        }
    }

    /// 扣减分配量
    ///
    /// 调用方必须先验证分配量充足；条目缺失或量不足时返回 false
    /// 且不做任何修改。
    pub fn deduct_allocation(&mut self, old_number: &str, quantity: i64) -> bool {
        match self
            .hardware_allocation
            .iter_mut()
            .find(|a| a.hardware_old_number == old_number)
        {
            Some(entry) if entry.quantity >= quantity => {
                entry.quantity -= quantity;
                true
            }
            _ => false,
        }
    }
}
