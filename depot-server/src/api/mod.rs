//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`orders`] - 订单提交、查询、退还
//! - [`admin`] - 管理端订单操作
//! - [`hardware`] - 硬件库存管理接口
//! - [`structures`] - 结构 (工单) 查询接口
//! - [`users`] - 用户账户管理接口
//! - [`audit_log`] - 审计日志查询接口

pub mod admin;
pub mod audit_log;
pub mod auth;
pub mod hardware;
pub mod health;
pub mod orders;
pub mod structures;
pub mod users;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
