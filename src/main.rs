mod api;
mod application;
mod domain;
mod infrastructure;
mod ports;

#[cfg(test)]
mod test_support;

use api::AppState;
use application::{CachedOrderRepository, OrderConsumer};
use infrastructure::{
    AppConfig, CacheBackend, InMemoryOrderRepository, KafkaOrderFeed, PostgresOrderRepository,
    RedisOrderRepository,
};
use ports::OrderRepositoryPort;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 初始化日志，可通过 RUST_LOG 覆盖
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting Order Service...");

    let config = AppConfig::from_env()?;

    // 创建数据库连接池
    info!("Connecting to database...");
    let pool = PgPool::connect(&config.database_url).await?;
    info!("Database connected successfully");

    // 创建仓储：数据库 + 缓存
    let database = Arc::new(PostgresOrderRepository::new(Arc::new(pool)));
    let cache: Arc<dyn OrderRepositoryPort> = match config.cache_backend {
        CacheBackend::Memory => Arc::new(InMemoryOrderRepository::new()),
        CacheBackend::Redis => {
            info!("Connecting to redis...");
            Arc::new(RedisOrderRepository::connect(&config.redis_url).await?)
        }
    };
    info!("Using {:?} cache backend", config.cache_backend);
    let order_repository = Arc::new(CachedOrderRepository::new(database, cache));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 启动消息消费者
    let feed = Arc::new(KafkaOrderFeed::new(
        &config.kafka_brokers,
        &config.kafka_group_id,
    ));
    let consumer = Arc::new(OrderConsumer::new(
        order_repository.clone(),
        feed,
        config.kafka_topic.clone(),
    ));
    let receiver = consumer.subscribe().await?;
    let consumer_task = tokio::spawn(consumer.run(receiver, shutdown_rx.clone()));

    // 创建路由
    let app = api::create_router(AppState { order_repository });

    let addr = config.bind_address();
    info!("Server listening on {}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  GET  /orders/:order_uid - Query order");

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    consumer_task.await?;
    info!("Shutdown complete");

    Ok(())
}

/// 等待 Ctrl+C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
