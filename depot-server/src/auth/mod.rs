//! 认证模块
//!
//! JWT 令牌 + 角色检查中间件。核心操作 (reconcile) 不接收角色，
//! 授权边界完全在路由中间件。

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth, require_superadmin};
