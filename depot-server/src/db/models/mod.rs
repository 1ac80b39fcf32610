//! Database Models
//!
//! 文档字段沿用既有前端/导入契约的 camelCase 命名
//! (例如 `hardwareOldNumber`)，Rust 侧字段保持 snake_case，
//! 通过 serde rename 映射。

// Serde helpers
pub mod serde_helpers;

// Inventory domain
pub mod hardware;
pub mod structure;

// Orders
pub mod order;

// Auth
pub mod user;

// Re-exports
pub use hardware::{Hardware, HardwareCreate, HardwareUpdate};
pub use order::{Order, OrderCreate, OrderLine, OrderLineStatus};
pub use structure::{Allocation, Structure};
pub use user::{User, UserCreate, UserRole, UserUpdate};
