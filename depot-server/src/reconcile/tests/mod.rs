//! 核对引擎测试
//!
//! 全部运行在内存 SurrealDB 上，覆盖订单创建、退还冲销
//! 与并发扣减场景。

mod test_concurrency;
mod test_create;
mod test_returns;

use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::audit::{Actor, AuditQuery, AuditService, AuditWorker};
use crate::db::DbService;
use crate::db::models::{Hardware, HardwareCreate, OrderLineStatus};
use crate::db::repository::{HardwareRepository, OrderRepository, StructureRepository};
use crate::reconcile::{
    KeyedLocks, OrderLineRequest, OrderSubmission, ReconcileEngine, ReturnItemRequest,
    ReturnSubmission,
};

/// 测试上下文：共享数据库/审计/锁，可构造多个引擎模拟并发请求
pub struct TestContext {
    pub db: Surreal<Db>,
    pub audit: Arc<AuditService>,
    pub locks: Arc<KeyedLocks>,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = DbService::memory().await.expect("in-memory db").db;
        let (audit, rx) = AuditService::new(db.clone(), 64);
        tokio::spawn(AuditWorker::new(audit.storage().clone()).run(rx));

        Self {
            db,
            audit,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub fn engine(&self) -> ReconcileEngine {
        ReconcileEngine::new(
            self.db.clone(),
            self.audit.clone(),
            self.locks.clone(),
            Duration::from_secs(5),
        )
    }

    pub async fn seed_hardware(&self, old_number: &str, quantity: i64) -> Hardware {
        HardwareRepository::new(self.db.clone())
            .create(HardwareCreate {
                name: None,
                old_number: old_number.to_string(),
                purchase_order: "PO-SEED".to_string(),
                group_name: "Test Group".to_string(),
                quantity,
                description: "test hardware".to_string(),
            })
            .await
            .expect("seed hardware")
    }

    pub async fn stock(&self, old_number: &str) -> i64 {
        HardwareRepository::new(self.db.clone())
            .find_by_old_number(old_number)
            .await
            .expect("stock query")
            .map(|h| h.quantity)
            .unwrap_or(-1)
    }

    pub async fn allocation(&self, structure_po: &str, old_number: &str) -> i64 {
        StructureRepository::new(self.db.clone())
            .find_by_po(structure_po)
            .await
            .expect("structure query")
            .and_then(|s| s.allocation_for(old_number).map(|a| a.quantity))
            .unwrap_or(0)
    }

    pub async fn line_status(&self, structure_po: &str, line_id: &str) -> Option<OrderLineStatus> {
        let orders = OrderRepository::new(self.db.clone())
            .find_by_structure(structure_po)
            .await
            .expect("orders query");
        orders
            .iter()
            .flat_map(|o| o.lines.iter())
            .find(|l| l.line_id == line_id)
            .map(|l| l.status)
    }

    pub async fn audit_total(&self) -> u64 {
        let (_, total) = self
            .audit
            .query(&AuditQuery::default())
            .await
            .expect("audit query");
        total
    }
}

pub fn actor() -> Actor {
    Actor::employee("E1", "Test Employee")
}

pub fn submission(structure_po: &str, lines: &[(&str, i64)]) -> OrderSubmission {
    OrderSubmission {
        emp_id: "E1".to_string(),
        emp_name: "Test Employee".to_string(),
        structure_po: structure_po.to_string(),
        structure_name: format!("Structure {}", structure_po),
        lines: lines
            .iter()
            .map(|(number, quantity)| OrderLineRequest {
                hardware_old_number: number.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

pub fn return_submission(structure_po: &str, items: Vec<ReturnItemRequest>) -> ReturnSubmission {
    ReturnSubmission {
        returner_emp_id: "E1".to_string(),
        returner_name: "Test Employee".to_string(),
        structure_po: structure_po.to_string(),
        structure_name: format!("Structure {}", structure_po),
        returns: items,
    }
}

pub fn return_item(old_number: &str, quantity: i64) -> ReturnItemRequest {
    ReturnItemRequest {
        order_id: None,
        hardware_old_number: old_number.to_string(),
        returned_quantity: quantity,
    }
}

pub fn targeted_return_item(
    line_id: &str,
    old_number: &str,
    quantity: i64,
) -> ReturnItemRequest {
    ReturnItemRequest {
        order_id: Some(line_id.to_string()),
        hardware_old_number: old_number.to_string(),
        returned_quantity: quantity,
    }
}
