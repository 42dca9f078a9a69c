//! Data models
//!
//! Shared between branch-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflake ids, all timestamps are epoch millis.
//! Wire JSON is camelCase.

pub mod assignment;
pub mod branch;
pub mod inventory;
pub mod notification;
pub mod sale;
pub mod transfer;

// Re-exports
pub use assignment::*;
pub use branch::*;
pub use inventory::*;
pub use notification::*;
pub use sale::*;
pub use transfer::*;
