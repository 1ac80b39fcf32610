//! 订单/退还核对引擎
//!
//! 本模块是系统的核心：订单创建时的库存扣减与结构分配记账，
//! 退还时跨历史订单的逆向冲销。
//!
//! # 不变量
//!
//! - 硬件库存 `quantity >= 0`，所有扣减为条件更新
//! - 结构分配量 `>= 0`，只被验证过的退还减少
//! - 订单提交要么全部生效要么全部回滚
//! - 每个生效的副作用操作写一条审计日志
//!
//! # 并发模型
//!
//! 引擎自身无后台任务；并发订单/退还通过按硬件编号与结构 PO
//! 键控的异步互斥锁串行化，锁获取遵循全局顺序
//! (硬件编号升序，然后结构)，不会死锁。

pub mod engine;
pub mod error;
pub mod locks;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::ReconcileEngine;
pub use error::ReconcileError;
pub use locks::KeyedLocks;
pub use types::{
    OrderLineRequest, OrderSubmission, ReturnItemFailure, ReturnItemRequest, ReturnItemSkipped,
    ReturnItemSuccess, ReturnOutcome, ReturnSubmission,
};
