//! 审计日志模块
//!
//! Append-only 审计日志：每个重要副作用操作一条记录，
//! SHA256 哈希链防篡改，mpsc 后台 worker 异步写入。

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use storage::{AuditStorage, AuditStorageError};
pub use types::{
    Actor, ActorKind, AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry,
    AuditEntryView, AuditListResponse, AuditQuery,
};
pub use worker::AuditWorker;
