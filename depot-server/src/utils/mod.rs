//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型及 HTTP 映射
//! - 日志初始化

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult};
