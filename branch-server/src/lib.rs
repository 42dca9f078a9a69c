//! Crab Branch Server - 多门店库存调拨与通知服务
//!
//! # 架构概述
//!
//! - **库存账本** (`inventory`): 按 (商品, 门店) 原子增减，库存永不为负
//! - **调拨审批** (`transfers`): pending → approved_completed / rejected → resent
//! - **授权** (`auth`): 基于门店分配与角色的纯函数授权门
//! - **通知** (`notifications`): 先落库再扇出，SSE 实时流 + 回放缓冲
//! - **HTTP API** (`api`): axum 路由和处理器
//!
//! # 模块结构
//!
//! ```text
//! branch-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── db/            # SQLite 连接池与仓储
//! ├── auth/          # 授权门
//! ├── inventory/     # 库存账本、键锁
//! ├── transfers/     # 调拨单状态机
//! ├── sales/         # 销售扣减钩子
//! ├── notifications/ # 通知存储、连接注册表、门店频道
//! ├── api/           # HTTP 路由和处理器
//! ├── middleware/    # 请求日志
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod inventory;
pub mod middleware;
pub mod notifications;
pub mod sales;
pub mod transfers;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use inventory::InventoryLedger;
pub use notifications::{ConnectionRegistry, NotificationBroker, Notifier};
pub use transfers::TransferManager;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境：加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> Result<Config, std::io::Error> {
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    std::fs::create_dir_all(config.database_dir())?;
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    // 开发环境输出到终端，其余写入滚动日志文件
    let file_dir = if config.is_development() {
        None
    } else {
        Some(log_dir.as_path())
    };
    init_logger_with_file(Some(&config.log_level), file_dir);
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ______           __
  / ____/________ _/ /_
 / /   / ___/ __ `/ __ \
/ /___/ /  / /_/ / /_/ /
\____/_/   \__,_/_.___/
    ____                       __
   / __ )_________ _____  _____/ /_
  / __  / ___/ __ `/ __ \/ ___/ __ \
 / /_/ / /  / /_/ / / / / /__/ / / /
/_____/_/   \__,_/_/ /_/\___/_/ /_/
    "#
    );
}
