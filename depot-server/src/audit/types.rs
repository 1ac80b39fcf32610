//! 审计日志类型定义
//!
//! 所有条目不可变、不可删除，支持 SHA256 哈希链防篡改。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 订单 / 库存核对 ═══
    /// 订单创建（每个行项一条）
    OrderCreated,
    /// 定向行项退还
    OrderReturned,
    /// 非定向硬件退还
    HardwareReturned,

    // ═══ 库存管理 ═══
    /// 硬件入库
    HardwareAdded,
    /// 硬件更新
    HardwareUpdated,
    /// 硬件删除
    HardwareDeleted,

    // ═══ 订单管理 ═══
    /// 订单行状态修改（管理端）
    OrderUpdated,
    /// 订单删除（管理端）
    OrderDeleted,

    // ═══ 账户管理 ═══
    /// 用户创建
    UserAdded,
    /// 用户更新
    UserUpdated,
    /// 用户删除
    UserDeleted,

    // ═══ 认证 ═══
    /// 登录成功
    LoginSuccess,
    /// 登录失败
    LoginFailed,
    /// 登出
    Logout,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 操作者类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// 登录用户账户
    User,
    /// 下单/退还表单中的员工（不一定有账户）
    Employee,
    /// 系统自身
    System,
}

/// 结构化操作者引用
///
/// 取代旧系统混用用户名和工号的自由文本 `performedBy`；
/// 展示格式只在查询响应边界生成。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub kind: ActorKind,
    pub id: String,
    pub display_name: String,
}

impl Actor {
    pub fn user(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            kind: ActorKind::User,
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn employee(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            kind: ActorKind::Employee,
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn system() -> Self {
        Self {
            kind: ActorKind::System,
            id: "system".to_string(),
            display_name: "system".to_string(),
        }
    }

    /// 旧版 `performedBy` 展示字符串（仅用于查询响应）
    pub fn legacy_display(&self) -> String {
        match self.kind {
            ActorKind::User => self.display_name.clone(),
            ActorKind::Employee => format!("{} (EmpID: {})", self.display_name, self.id),
            ActorKind::System => "system".to_string(),
        }
    }
}

/// 审计日志条目（不可变）
///
/// 每条记录包含 SHA256 哈希链：
/// - `prev_hash`: 前一条记录的哈希
/// - `curr_hash`: 当前记录的哈希（包含 prev_hash + 所有字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 全局递增序列号（唯一标识）
    pub sequence: u64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    /// 操作类型
    pub action: AuditAction,
    /// 操作者
    pub actor: Actor,
    /// 结构化详情（JSON）
    pub details: serde_json::Value,
    /// 前一条审计日志哈希
    pub prev_hash: String,
    /// 当前记录哈希（SHA256）
    pub curr_hash: String,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 操作类型过滤
    pub action: Option<AuditAction>,
    /// 操作者 ID 过滤
    pub actor_id: Option<String>,
    /// 分页偏移
    #[serde(default)]
    pub offset: usize,
    /// 分页大小（默认 50）
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            action: None,
            actor_id: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

/// 审计日志列表响应
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntryView>,
    pub total: u64,
}

/// 查询响应中的审计条目（附带旧版展示字符串）
#[derive(Debug, Serialize)]
pub struct AuditEntryView {
    #[serde(flatten)]
    pub entry: AuditEntry,
    /// 旧版 `performedBy` 格式，仅展示用
    #[serde(rename = "performedBy")]
    pub performed_by: String,
}

impl From<AuditEntry> for AuditEntryView {
    fn from(entry: AuditEntry) -> Self {
        let performed_by = entry.actor.legacy_display();
        Self {
            entry,
            performed_by,
        }
    }
}

/// 审计链验证结果
#[derive(Debug, Serialize)]
pub struct AuditChainVerification {
    /// 验证的记录总数
    pub total_entries: u64,
    /// 链是否完整
    pub chain_intact: bool,
    /// 断裂点列表
    pub breaks: Vec<AuditChainBreak>,
}

/// 审计链断裂点
#[derive(Debug, Serialize)]
pub struct AuditChainBreak {
    /// 断裂处的序列号
    pub sequence: u64,
    /// 期望的哈希
    pub expected: String,
    /// 实际的哈希
    pub actual: String,
}
