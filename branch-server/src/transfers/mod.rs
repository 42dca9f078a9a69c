//! 门店调拨（拆分）审批流程
//!
//! - [`TransferManager`] - 创建 / 审批 / 驳回 / 重新提交
//! - [`TransferError`] - 调拨错误，在 HTTP 边界转换为 `AppError`

pub mod error;
pub mod manager;

pub use error::{TransferError, TransferResult};
pub use manager::TransferManager;
