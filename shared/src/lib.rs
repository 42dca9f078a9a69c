//! Shared types for the branch back office
//!
//! Common types used by branch-server and its clients: unified error
//! codes, persisted/wire models, notification stream events and
//! id/time helpers.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{NotificationKind, NotificationPayload, StreamEvent};
