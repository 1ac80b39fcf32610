//! Depot Server - 硬件订购与库存跟踪后端
//!
//! # 架构概述
//!
//! 本模块是 Depot Server 的主入口，提供以下核心功能：
//!
//! - **核对引擎** (`reconcile`): 订单创建与退还的库存核对
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **审计** (`audit`): Append-only 审计日志（哈希链）
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! depot-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、角色检查
//! ├── audit/         # 审计日志
//! ├── reconcile/     # 订单/退还核对引擎
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod reconcile;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use reconcile::{ReconcileEngine, ReconcileError};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    ____                   __
   / __ \___  ____  ____  / /_
  / / / / _ \/ __ \/ __ \/ __/
 / /_/ /  __/ /_/ / /_/ / /_
/_____/\___/ .___/\____/\__/
          /_/
    "#
    );
}
