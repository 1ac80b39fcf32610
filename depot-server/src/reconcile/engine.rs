//! Reconcile Engine
//!
//! 订单创建与退还处理的唯一写入方：
//! 订单行项状态/数量和结构分配量只由本引擎修改，
//! 硬件库存由本引擎和管理端 CRUD 共同修改 (后者不做核对)。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::error::ReconcileError;
use super::locks::KeyedLocks;
use super::types::*;
use crate::audit::{Actor, AuditAction, AuditService};
use crate::db::models::{Order, OrderCreate, OrderLine, OrderLineStatus};
use crate::db::repository::{
    HardwareRepository, OrderRepository, RepoResult, StructureRepository,
};
use shared::util::normalize_hardware_number;

/// 退还单项的内部处理结果
enum ItemOutcome {
    Success(ReturnItemSuccess),
    Skipped(ReturnItemSkipped),
}

/// Order/return reconciliation engine
///
/// 每个请求按需构造 (数次 Arc clone)；所有状态都在数据库和
/// 共享的键控锁里。
pub struct ReconcileEngine {
    db: Surreal<Db>,
    audit: Arc<AuditService>,
    locks: Arc<KeyedLocks>,
    op_timeout: Duration,
}

impl ReconcileEngine {
    pub fn new(
        db: Surreal<Db>,
        audit: Arc<AuditService>,
        locks: Arc<KeyedLocks>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            db,
            audit,
            locks,
            op_timeout,
        }
    }

    fn hardware_repo(&self) -> HardwareRepository {
        HardwareRepository::new(self.db.clone())
    }

    fn structure_repo(&self) -> StructureRepository {
        StructureRepository::new(self.db.clone())
    }

    fn order_repo(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone())
    }

    /// 有界持久化调用 — 超时映射为 ServiceUnavailable
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = RepoResult<T>>,
    ) -> Result<T, ReconcileError> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(ReconcileError::from),
            Err(_) => Err(ReconcileError::ServiceUnavailable(
                "persistence call timed out".to_string(),
            )),
        }
    }

    // =========================================================================
    // Order Creation
    // =========================================================================

    /// 创建订单：验证、扣库存、记分配、落订单、写审计
    ///
    /// 整个提交是原子的：先在锁内预验证所有行项，全部通过后才开始
    /// 扣减；任何一步持久化失败会回滚已生效的扣减。
    pub async fn create_order(
        &self,
        submission: OrderSubmission,
        actor: &Actor,
    ) -> Result<Order, ReconcileError> {
        // 1. 请求形状验证
        if submission.emp_id.trim().is_empty() {
            return Err(ReconcileError::Validation("empId is required".to_string()));
        }
        if submission.structure_po.trim().is_empty() {
            return Err(ReconcileError::Validation(
                "structurePO is required".to_string(),
            ));
        }
        if submission.lines.is_empty() {
            return Err(ReconcileError::Validation(
                "order must contain at least one line".to_string(),
            ));
        }
        for line in &submission.lines {
            if line.quantity <= 0 {
                return Err(ReconcileError::Validation(format!(
                    "quantity must be positive for hardware {}",
                    line.hardware_old_number
                )));
            }
        }

        // 2. 按规范化编号聚合需求量 (同一编号可能出现在多行)
        let mut required: BTreeMap<String, i64> = BTreeMap::new();
        for line in &submission.lines {
            *required
                .entry(normalize_hardware_number(&line.hardware_old_number))
                .or_insert(0) += line.quantity;
        }

        // 3. 锁：硬件编号升序，然后结构
        let _hw_guards = self.locks.lock_hardware_set(required.keys()).await;
        let _structure_guard = self.locks.lock_structure(&submission.structure_po).await;

        let hardware_repo = self.hardware_repo();

        // 4. 预验证所有行项 — 未全部通过前不做任何修改
        for (number, quantity) in &required {
            let hardware = self
                .bounded(hardware_repo.find_by_old_number(number))
                .await?
                .ok_or_else(|| {
                    ReconcileError::NotFound(format!("Hardware item {} not found", number))
                })?;
            if *quantity > hardware.quantity {
                return Err(ReconcileError::InsufficientStock {
                    hardware: number.clone(),
                    requested: *quantity,
                    available: hardware.quantity,
                });
            }
        }

        // 5. 条件扣减库存；失败即回滚已生效部分
        let mut applied: Vec<(String, i64)> = Vec::new();
        let mut remaining_stock: BTreeMap<String, i64> = BTreeMap::new();
        for (number, quantity) in &required {
            match self
                .bounded(hardware_repo.try_decrement_stock(number, *quantity))
                .await
            {
                Ok(Some(hardware)) => {
                    remaining_stock.insert(number.clone(), hardware.quantity);
                    applied.push((number.clone(), *quantity));
                }
                Ok(None) => {
                    // 条件未满足：锁外路径 (管理端 CRUD) 并发改了库存
                    self.rollback_stock(&applied).await;
                    let available = self
                        .bounded(hardware_repo.find_by_old_number(number))
                        .await
                        .ok()
                        .flatten()
                        .map(|h| h.quantity)
                        .unwrap_or(0);
                    return Err(ReconcileError::InsufficientStock {
                        hardware: number.clone(),
                        requested: *quantity,
                        available,
                    });
                }
                Err(e) => {
                    self.rollback_stock(&applied).await;
                    return Err(e);
                }
            }
        }

        // 6. 结构分配记账 (惰性创建结构)
        let structure_repo = self.structure_repo();
        let mut structure = match self
            .bounded(
                structure_repo.find_or_create(&submission.structure_po, &submission.structure_name),
            )
            .await
        {
            Ok(s) => s,
            Err(e) => {
                self.rollback_stock(&applied).await;
                return Err(e);
            }
        };
        for (number, quantity) in &required {
            structure.add_allocation(number, *quantity);
        }
        if let Err(e) = self
            .bounded(structure_repo.set_allocations(
                &submission.structure_po,
                structure.hardware_allocation.clone(),
            ))
            .await
        {
            self.rollback_stock(&applied).await;
            return Err(e);
        }

        // 7. 落订单文档
        let lines: Vec<OrderLine> = submission
            .lines
            .iter()
            .map(|l| {
                OrderLine::pending(normalize_hardware_number(&l.hardware_old_number), l.quantity)
            })
            .collect();
        let order = match self
            .bounded(self.order_repo().create(OrderCreate {
                emp_id: submission.emp_id.clone(),
                emp_name: submission.emp_name.clone(),
                structure_po: submission.structure_po.clone(),
                structure_name: submission.structure_name.clone(),
                lines,
            }))
            .await
        {
            Ok(order) => order,
            Err(e) => {
                self.rollback_allocation(&submission.structure_po, &required).await;
                self.rollback_stock(&applied).await;
                return Err(e);
            }
        };

        // 8. 审计：每个行项一条
        let order_id = order.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
        for line in &order.lines {
            self.audit
                .log(
                    AuditAction::OrderCreated,
                    actor.clone(),
                    json!({
                        "orderId": &order_id,
                        "hardwareOldNumber": &line.hardware_old_number,
                        "quantity": line.quantity,
                        "remainingStock": remaining_stock.get(&line.hardware_old_number),
                        "structurePO": &submission.structure_po,
                        "structureName": &submission.structure_name,
                    }),
                )
                .await;
        }

        tracing::info!(
            order_id = %order_id,
            emp_id = %submission.emp_id,
            structure_po = %submission.structure_po,
            lines = order.lines.len(),
            "Order created"
        );

        Ok(order)
    }

    /// 回滚已生效的库存扣减 (锁仍持有)
    async fn rollback_stock(&self, applied: &[(String, i64)]) {
        let hardware_repo = self.hardware_repo();
        for (number, quantity) in applied {
            if let Err(e) = self
                .bounded(hardware_repo.increment_stock(number, *quantity))
                .await
            {
                tracing::error!(
                    hardware = %number,
                    quantity,
                    error = %e,
                    "Stock rollback failed — inventory requires manual correction"
                );
            }
        }
    }

    /// 回滚已生效的分配记账 (锁仍持有)
    async fn rollback_allocation(&self, structure_po: &str, required: &BTreeMap<String, i64>) {
        let structure_repo = self.structure_repo();
        let result = async {
            let mut structure = self
                .bounded(structure_repo.find_by_po(structure_po))
                .await?
                .ok_or_else(|| {
                    ReconcileError::NotFound(format!("Structure {} not found", structure_po))
                })?;
            for (number, quantity) in required {
                structure.deduct_allocation(number, *quantity);
            }
            self.bounded(
                structure_repo.set_allocations(structure_po, structure.hardware_allocation),
            )
            .await
        }
        .await;

        if let Err(e) = result {
            tracing::error!(
                structure_po = %structure_po,
                error = %e,
                "Allocation rollback failed — structure requires manual correction"
            );
        }
    }

    // =========================================================================
    // Return Processing
    // =========================================================================

    /// 处理退还请求
    ///
    /// 结构缺失使整个请求失败；此外各项独立处理，
    /// 结果分入 success/skipped/errors 三组。
    pub async fn process_returns(
        &self,
        submission: ReturnSubmission,
        actor: &Actor,
    ) -> Result<ReturnOutcome, ReconcileError> {
        if submission.structure_po.trim().is_empty() {
            return Err(ReconcileError::Validation(
                "structurePO is required".to_string(),
            ));
        }

        // 结构必须存在 — 整体失败条件
        self.bounded(self.structure_repo().find_by_po(&submission.structure_po))
            .await?
            .ok_or_else(|| {
                ReconcileError::NotFound(format!(
                    "Structure {} not found",
                    submission.structure_po
                ))
            })?;

        let mut outcome = ReturnOutcome::default();
        for item in &submission.returns {
            match self
                .process_return_item(&submission.structure_po, item, actor)
                .await
            {
                Ok(ItemOutcome::Success(s)) => outcome.success.push(s),
                Ok(ItemOutcome::Skipped(s)) => outcome.skipped.push(s),
                Err(e) => outcome.errors.push(ReturnItemFailure {
                    hardware_old_number: normalize_hardware_number(&item.hardware_old_number),
                    order_id: item.order_id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        tracing::info!(
            structure_po = %submission.structure_po,
            success = outcome.success.len(),
            skipped = outcome.skipped.len(),
            errors = outcome.errors.len(),
            "Return request processed"
        );

        Ok(outcome)
    }

    /// 处理单个退还项
    ///
    /// 定向 (`order_id` 给定)：只冲销该行项，实际退还量对行项余量
    /// 收口，行项已为 0 时跳过。
    /// 非定向：预验证所有候选行项的在途量之和，足额后按
    /// 最旧订单优先、最旧行项优先冲销 — 不产生部分生效。
    async fn process_return_item(
        &self,
        structure_po: &str,
        item: &ReturnItemRequest,
        actor: &Actor,
    ) -> Result<ItemOutcome, ReconcileError> {
        if item.returned_quantity <= 0 {
            return Err(ReconcileError::Validation(
                "returnedQuantity must be positive".to_string(),
            ));
        }
        let number = normalize_hardware_number(&item.hardware_old_number);

        // 锁：硬件，然后结构 (与订单创建一致的全局顺序)
        let _hw_guard = self.locks.lock_hardware(&number).await;
        let _structure_guard = self.locks.lock_structure(structure_po).await;

        let structure_repo = self.structure_repo();
        let order_repo = self.order_repo();

        // 锁内重新读取 — 之前的项可能已修改结构
        let mut structure = self
            .bounded(structure_repo.find_by_po(structure_po))
            .await?
            .ok_or_else(|| {
                ReconcileError::NotFound(format!("Structure {} not found", structure_po))
            })?;

        let mut orders = self.bounded(order_repo.find_by_structure(structure_po)).await?;

        // 定向退还先定位行项 (误指向防护、已清零跳过)
        let target = match &item.order_id {
            Some(line_id) => {
                let mut found = None;
                'outer: for (oi, order) in orders.iter().enumerate() {
                    for (li, line) in order.lines.iter().enumerate() {
                        if line.line_id == *line_id {
                            found = Some((oi, li));
                            break 'outer;
                        }
                    }
                }
                let (oi, li) = found.ok_or_else(|| {
                    ReconcileError::NotFound(format!("Order line {} not found", line_id))
                })?;

                let line = &orders[oi].lines[li];
                // 行项与请求编号不一致 — 误指向防护
                if line.hardware_old_number != number {
                    return Err(ReconcileError::Conflict(format!(
                        "Order line {} is for hardware {}, not {}",
                        line_id, line.hardware_old_number, number
                    )));
                }
                if line.quantity == 0 {
                    return Ok(ItemOutcome::Skipped(ReturnItemSkipped {
                        hardware_old_number: number,
                        order_id: item.order_id.clone(),
                        reason: "line already fully returned".to_string(),
                    }));
                }
                Some((oi, li))
            }
            None => None,
        };

        // 分配量防护：不能退还超过该结构曾领用的量
        let allocated = structure.allocation_for(&number).map(|a| a.quantity);
        match allocated {
            Some(allocated) if allocated >= item.returned_quantity => {}
            _ => {
                return Err(ReconcileError::InsufficientAllocation {
                    hardware: number,
                    requested: item.returned_quantity,
                    allocated: allocated.unwrap_or(0),
                });
            }
        }

        // 制定冲销计划: (order_idx, line_idx, deduct)
        let (plan, actual, targeted) = match target {
            Some((oi, li)) => {
                // 实际退还量对行项余量收口
                let actual = item.returned_quantity.min(orders[oi].lines[li].quantity);
                (vec![(oi, li, actual)], actual, true)
            }
            None => {
                let mut candidates = Vec::new();
                let mut outstanding: i64 = 0;
                for (oi, order) in orders.iter().enumerate() {
                    for (li, line) in order.lines.iter().enumerate() {
                        if line.hardware_old_number == number && line.quantity > 0 {
                            outstanding += line.quantity;
                            candidates.push((oi, li));
                        }
                    }
                }

                if outstanding == 0 {
                    return Ok(ItemOutcome::Skipped(ReturnItemSkipped {
                        hardware_old_number: number,
                        order_id: None,
                        reason: "no outstanding quantity for this hardware".to_string(),
                    }));
                }
                // 在途量预验证 — 不足则整项报错，不做部分冲销
                if outstanding < item.returned_quantity {
                    return Err(ReconcileError::InsufficientOutstanding {
                        hardware: number,
                        requested: item.returned_quantity,
                        outstanding,
                    });
                }

                let mut remaining = item.returned_quantity;
                let mut plan = Vec::new();
                for (oi, li) in candidates {
                    if remaining == 0 {
                        break;
                    }
                    let take = remaining.min(orders[oi].lines[li].quantity);
                    plan.push((oi, li, take));
                    remaining -= take;
                }
                (plan, item.returned_quantity, false)
            }
        };

        // 内存中冲销行项
        let mut touched: BTreeSet<usize> = BTreeSet::new();
        for (oi, li, take) in &plan {
            let line = &mut orders[*oi].lines[*li];
            line.quantity -= take;
            if line.quantity == 0 {
                line.status = OrderLineStatus::Returned;
            }
            touched.insert(*oi);
        }

        // 写回受影响的订单
        for oi in &touched {
            let order = &orders[*oi];
            let id = order
                .id
                .clone()
                .ok_or_else(|| ReconcileError::Database("order missing record id".to_string()))?;
            self.bounded(order_repo.set_lines(&id, order.lines.clone()))
                .await?;
        }

        // 分配扣减 + 保存
        if !structure.deduct_allocation(&number, actual) {
            return Err(ReconcileError::Database(
                "allocation drifted during return processing".to_string(),
            ));
        }
        let updated = self
            .bounded(
                structure_repo.set_allocations(structure_po, structure.hardware_allocation.clone()),
            )
            .await?;
        let remaining_allocation = updated
            .allocation_for(&number)
            .map(|a| a.quantity)
            .unwrap_or(0);

        // 库存回加
        let hardware = self
            .bounded(self.hardware_repo().increment_stock(&number, actual))
            .await?;

        // 审计
        let action = if targeted {
            AuditAction::OrderReturned
        } else {
            AuditAction::HardwareReturned
        };
        self.audit
            .log(
                action,
                actor.clone(),
                json!({
                    "hardwareOldNumber": &number,
                    "orderId": &item.order_id,
                    "returnedQuantity": actual,
                    "remainingStock": hardware.quantity,
                    "remainingAllocation": remaining_allocation,
                    "structurePO": structure_po,
                }),
            )
            .await;

        Ok(ItemOutcome::Success(ReturnItemSuccess {
            hardware_old_number: number,
            order_id: item.order_id.clone(),
            returned_quantity: actual,
            remaining_stock: hardware.quantity,
            remaining_allocation,
        }))
    }
}
