use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::Order;
use crate::ports::order_repository_port::OrderRepositoryPort;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

/// Redis订单仓储，可替代内存缓存
///
/// 值以 JSON 存储，不设置过期时间。配送信息的数据库主键不会进入缓存。
#[derive(Clone)]
pub struct RedisOrderRepository {
    connection: MultiplexedConnection,
}

impl RedisOrderRepository {
    pub fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    /// 根据连接地址建立连接
    pub async fn connect(url: &str) -> DomainResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| DomainError::Configuration(format!("Invalid redis url: {}", e)))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DomainError::Cache(format!("Failed to connect to redis: {}", e)))?;

        Ok(Self::new(connection))
    }
}

fn cache_key(order_uid: &str) -> String {
    format!("order:{}", order_uid)
}

#[async_trait]
impl OrderRepositoryPort for RedisOrderRepository {
    async fn get_order(&self, order_uid: &str) -> DomainResult<Order> {
        let mut connection = self.connection.clone();

        let cached: Option<String> = connection
            .get(cache_key(order_uid))
            .await
            .map_err(|e| DomainError::Cache(format!("Failed to fetch order from redis: {}", e)))?;

        let raw = cached.ok_or_else(|| DomainError::NotFound(order_uid.to_string()))?;
        let mut order: Order = serde_json::from_str(&raw)
            .map_err(|e| DomainError::Cache(format!("Failed to parse cached order: {}", e)))?;
        order.assign_item_owner();

        Ok(order)
    }

    /// 使用 SET NX，已存在的键不会被覆盖
    async fn create_order(&self, order: &Order) -> DomainResult<Order> {
        let mut stored = order.clone();
        stored.assign_item_owner();

        let payload = serde_json::to_string(&stored)?;
        let mut connection = self.connection.clone();

        let created: bool = connection
            .set_nx(cache_key(&stored.order_uid), payload)
            .await
            .map_err(|e| DomainError::Cache(format!("Failed to save order to redis: {}", e)))?;

        if !created {
            return Err(DomainError::AlreadyExists(stored.order_uid));
        }

        debug!("Order cached in redis: {}", stored.order_uid);
        Ok(stored)
    }
}
