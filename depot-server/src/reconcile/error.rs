//! 核对引擎错误类型

use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::AppError;

/// Engine error taxonomy
///
/// 业务规则错误 (库存/分配/在途量不足) 携带违规的硬件编号，
/// 消息直接面向调用方。
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient stock for hardware {hardware}: requested {requested}, available {available}")]
    InsufficientStock {
        hardware: String,
        requested: i64,
        available: i64,
    },

    #[error(
        "Insufficient allocation for hardware {hardware}: requested {requested}, allocated {allocated}"
    )]
    InsufficientAllocation {
        hardware: String,
        requested: i64,
        allocated: i64,
    },

    #[error(
        "Insufficient outstanding quantity for hardware {hardware}: requested {requested}, outstanding {outstanding}"
    )]
    InsufficientOutstanding {
        hardware: String,
        requested: i64,
        outstanding: i64,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<RepoError> for ReconcileError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => ReconcileError::NotFound(msg),
            RepoError::Duplicate(msg) => ReconcileError::Conflict(msg),
            RepoError::Validation(msg) => ReconcileError::Validation(msg),
            RepoError::Database(msg) => ReconcileError::Database(msg),
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Validation(msg) => AppError::Validation(msg),
            ReconcileError::NotFound(msg) => AppError::NotFound(msg),
            e @ ReconcileError::InsufficientStock { .. }
            | e @ ReconcileError::InsufficientAllocation { .. }
            | e @ ReconcileError::InsufficientOutstanding { .. } => {
                AppError::BusinessRule(e.to_string())
            }
            ReconcileError::Conflict(msg) => AppError::Conflict(msg),
            ReconcileError::Database(msg) => AppError::Database(msg),
            ReconcileError::ServiceUnavailable(msg) => AppError::ServiceUnavailable(msg),
        }
    }
}
