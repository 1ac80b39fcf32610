//! Shared types for the Depot hardware-ordering system
//!
//! Common request/response DTOs and utility functions used across crates.

pub mod client;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
