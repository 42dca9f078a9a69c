use parking_lot::Mutex;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::{BackgroundTasks, ChannelBackend, Config, Result};
use crate::db::DbService;
use crate::db::repository::branch;
use crate::inventory::InventoryLedger;
use crate::notifications::{
    BranchChannel, ConnectionRegistry, InProcessChannel, NotificationBroker, NotificationStore, Notifier,
};
use crate::sales::SalesService;
use crate::transfers::TransferManager;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求 clone 一次的成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | ledger | Arc<InventoryLedger> | 库存账本 |
/// | transfers | Arc<TransferManager> | 调拨单状态机 |
/// | sales | Arc<SalesService> | 销售扣减 |
/// | store | NotificationStore | 通知持久化 |
/// | broker | Arc<NotificationBroker> | 通知落库 + 扇出 |
/// | registry | Arc<ConnectionRegistry> | 实时订阅连接 |
/// | channel | Arc<dyn BranchChannel> | 回放缓冲 + 扇出传输 |
/// | shutdown | CancellationToken | 全局关闭信号 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub ledger: Arc<InventoryLedger>,
    pub transfers: Arc<TransferManager>,
    pub sales: Arc<SalesService>,
    pub store: NotificationStore,
    pub broker: Arc<NotificationBroker>,
    pub registry: Arc<ConnectionRegistry>,
    pub channel: Arc<dyn BranchChannel>,
    pub shutdown: CancellationToken,
    started_at: Instant,
    tasks: Arc<Mutex<Option<BackgroundTasks>>>,
    #[cfg(feature = "redis")]
    redis: Option<redis::Client>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 打开数据库并执行迁移，按配置选择通知频道后端，
    /// 进程内后端会用已持久化的门店通知预热回放缓冲。
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(config.database_file()).await?;
        let pool = db.pool;

        let registry = Arc::new(ConnectionRegistry::new(config.subscriber_buffer));

        #[cfg(feature = "redis")]
        let mut redis_client = None;

        let channel: Arc<dyn BranchChannel> = match config.channel_backend {
            #[cfg(feature = "redis")]
            ChannelBackend::Redis => {
                let channel = crate::notifications::channel::RedisChannel::new(
                    &config.redis_url,
                    config.replay_buffer_size,
                )
                .map_err(|e| crate::core::ServerError::Config(e.to_string()))?;
                redis_client = Some(channel.client());
                Arc::new(channel)
            }
            #[cfg(not(feature = "redis"))]
            ChannelBackend::Redis => {
                tracing::warn!("CHANNEL_BACKEND=redis but the redis feature is not compiled in, using memory");
                Arc::new(Self::warm_memory_channel(&pool, &registry, config.replay_buffer_size).await?)
            }
            ChannelBackend::Memory => {
                Arc::new(Self::warm_memory_channel(&pool, &registry, config.replay_buffer_size).await?)
            }
        };
        tracing::info!(backend = channel.backend(), "Notification channel ready");

        let store = NotificationStore::new(pool.clone());
        let broker = Arc::new(NotificationBroker::new(pool.clone(), store.clone(), channel.clone()));
        let notifier: Arc<dyn Notifier> = broker.clone();

        let ledger = Arc::new(InventoryLedger::new(pool.clone()));
        let transfers = Arc::new(TransferManager::new(pool.clone(), ledger.clone(), notifier.clone()));
        let sales = Arc::new(SalesService::new(pool.clone(), ledger.clone(), notifier));

        Ok(Self {
            config: config.clone(),
            pool,
            ledger,
            transfers,
            sales,
            store,
            broker,
            registry,
            channel,
            shutdown: CancellationToken::new(),
            started_at: Instant::now(),
            tasks: Arc::new(Mutex::new(None)),
            #[cfg(feature = "redis")]
            redis: redis_client,
        })
    }

    /// 进程内频道，回放缓冲用每个门店最近的门店级通知预热
    async fn warm_memory_channel(
        pool: &SqlitePool,
        registry: &Arc<ConnectionRegistry>,
        capacity: usize,
    ) -> Result<InProcessChannel> {
        let channel = InProcessChannel::new(registry.clone(), capacity);
        let store = NotificationStore::new(pool.clone());
        for b in branch::find_all(pool).await.map_err(shared::error::AppError::from)? {
            let recent = store
                .recent_branch_wide(b.id, capacity)
                .await
                .map_err(shared::error::AppError::from)?;
            if !recent.is_empty() {
                tracing::debug!(branch_id = b.id, count = recent.len(), "Replay buffer preloaded");
                channel.preload(b.id, recent);
            }
        }
        Ok(channel)
    }

    /// 启动后台任务：心跳，以及 Redis 后端的频道监听器
    pub fn start_background_tasks(&self) {
        let mut tasks = BackgroundTasks::with_token(self.shutdown.clone());

        let registry = self.registry.clone();
        tasks.spawn_periodic(
            "sse_heartbeat",
            Duration::from_secs(self.config.heartbeat_interval_secs.max(1)),
            move || {
                let registry = registry.clone();
                async move {
                    let delivered = registry.heartbeat();
                    tracing::trace!(delivered, "Heartbeat sent");
                }
            },
        );

        #[cfg(feature = "redis")]
        if let Some(client) = self.redis.clone() {
            tasks.spawn(
                "redis_channel_listener",
                crate::core::TaskKind::Listener,
                crate::notifications::channel::run_listener(
                    client,
                    self.registry.clone(),
                    self.shutdown.clone(),
                ),
            );
        }

        tasks.log_summary();
        *self.tasks.lock() = Some(tasks);
    }

    /// 已退出的后台任务数 (None = 尚未启动)
    pub fn failed_background_tasks(&self) -> Option<usize> {
        self.tasks.lock().as_ref().map(BackgroundTasks::check_health)
    }

    /// 取消所有后台任务并等待退出
    pub async fn shutdown_background_tasks(&self) {
        self.shutdown.cancel();
        let tasks = self.tasks.lock().take();
        if let Some(tasks) = tasks {
            tasks
                .shutdown(Duration::from_millis(self.config.shutdown_timeout_ms))
                .await;
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
