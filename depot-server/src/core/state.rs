use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::audit::{AuditService, AuditWorker};
use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::reconcile::{KeyedLocks, ReconcileEngine};
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是服务端的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | audit_service | Arc<AuditService> | 审计日志服务 |
/// | locks | Arc<KeyedLocks> | 按资源键控的互斥锁 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 审计日志服务
    pub audit_service: Arc<AuditService>,
    /// 硬件/结构键控锁 (核对引擎串行化)
    pub locks: Arc<KeyedLocks>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/depot.db)
    /// 3. 审计服务 + 后台 worker
    /// 4. JWT 服务
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {}", e)))?;

        let db_path = config.database_dir().join("depot.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        Ok(Self::with_db(config.clone(), db_service.db))
    }

    /// 使用给定数据库构造状态并启动审计 worker
    ///
    /// 测试场景通过 [`DbService::memory`] 传入内存数据库
    pub fn with_db(config: Config, db: Surreal<Db>) -> Self {
        let (audit_service, audit_rx) = AuditService::new(db.clone(), config.audit_buffer_size);
        tokio::spawn(AuditWorker::new(audit_service.storage().clone()).run(audit_rx));

        Self {
            config,
            db,
            jwt_service: Arc::new(JwtService::default()),
            audit_service,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 构造核对引擎
    ///
    /// 引擎持有数据库、审计服务和键控锁的共享引用，
    /// 每个请求按需构造，成本为数次 Arc clone。
    pub fn engine(&self) -> ReconcileEngine {
        ReconcileEngine::new(
            self.db.clone(),
            self.audit_service.clone(),
            self.locks.clone(),
            Duration::from_millis(self.config.request_timeout_ms),
        )
    }
}
