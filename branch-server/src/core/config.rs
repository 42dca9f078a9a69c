use std::path::PathBuf;

/// A full replay window of notifications fits in one connection's queue
const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// 通知频道后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelBackend {
    /// 进程内回放缓冲 + 本地扇出
    Memory,
    /// Redis 列表回放 + pub/sub 扇出（多实例部署）
    Redis,
}

impl ChannelBackend {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "redis" => Self::Redis,
            _ => Self::Memory,
        }
    }
}

/// 服务器配置 - 门店后台的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/crab/branch | 工作目录 (database/, logs/) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_PATH | <WORK_DIR>/database/branch.db | SQLite 文件 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | HEARTBEAT_INTERVAL_SECS | 60 | SSE 心跳间隔(秒) |
/// | REPLAY_BUFFER_SIZE | 100 | 每个门店的回放条数 (上限 100) |
/// | SUBSCRIBER_BUFFER | 256 | 每个连接的队列深度，不低于回放缓冲上限 |
/// | CHANNEL_BACKEND | memory | memory / redis |
/// | REDIS_URL | redis://127.0.0.1:6379 | redis 后端地址 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/branch HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库文件路径 (None = <work_dir>/database/branch.db)
    pub database_path: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// SSE 心跳间隔 (秒)
    pub heartbeat_interval_secs: u64,
    /// 每个门店回放缓冲区条数
    pub replay_buffer_size: usize,
    /// 每个订阅连接的发送队列深度
    pub subscriber_buffer: usize,
    /// 通知频道后端
    pub channel_backend: ChannelBackend,
    /// Redis 地址
    pub redis_url: String,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/crab/branch".into()),
            http_port: env_or("HTTP_PORT", 3000),
            database_path: std::env::var("DATABASE_PATH").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            heartbeat_interval_secs: env_or("HEARTBEAT_INTERVAL_SECS", 60),
            replay_buffer_size: env_or("REPLAY_BUFFER_SIZE", shared::message::REPLAY_CAPACITY)
                .clamp(1, shared::message::REPLAY_CAPACITY),
            subscriber_buffer: env_or("SUBSCRIBER_BUFFER", DEFAULT_SUBSCRIBER_BUFFER)
                .max(shared::message::REPLAY_CAPACITY),
            channel_backend: ChannelBackend::parse(
                &std::env::var("CHANNEL_BACKEND").unwrap_or_default(),
            ),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义工作目录，其余取默认值
    ///
    /// 常用于测试场景
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = None;
        config.channel_backend = ChannelBackend::Memory;
        config
    }

    /// 数据库文件路径
    pub fn database_file(&self) -> PathBuf {
        match &self.database_path {
            Some(p) => PathBuf::from(p),
            None => self.database_dir().join("branch.db"),
        }
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
