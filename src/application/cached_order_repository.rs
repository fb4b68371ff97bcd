use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::Order;
use crate::ports::OrderRepositoryPort;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 缓存仓储：组合主数据库与缓存两个仓储
///
/// 读取时先查缓存，命中直接返回；未命中或缓存出错时回退到数据库，
/// 并把查到的订单回填到缓存。写入时先写数据库，成功后再尽力写缓存。
/// 数据库是唯一可信来源，缓存中不会出现未成功落库的订单；缓存写失败只记录日志。
pub struct CachedOrderRepository<D: ?Sized, C: ?Sized> {
    database: Arc<D>,
    cache: Arc<C>,
}

impl<D, C> CachedOrderRepository<D, C>
where
    D: OrderRepositoryPort + ?Sized,
    C: OrderRepositoryPort + ?Sized,
{
    pub fn new(database: Arc<D>, cache: Arc<C>) -> Self {
        Self { database, cache }
    }

    /// 尽力写入缓存，失败只记录日志
    async fn cache_best_effort(&self, order: &Order, reason: &'static str) {
        match self.cache.create_order(order).await {
            Ok(_) => debug!(order_uid = %order.order_uid, reason, "Order written to cache"),
            Err(e) => warn!(
                order_uid = %order.order_uid,
                reason,
                error = %e,
                "Failed to write order to cache"
            ),
        }
    }
}

#[async_trait]
impl<D, C> OrderRepositoryPort for CachedOrderRepository<D, C>
where
    D: OrderRepositoryPort + ?Sized,
    C: OrderRepositoryPort + ?Sized,
{
    async fn get_order(&self, order_uid: &str) -> DomainResult<Order> {
        match self.cache.get_order(order_uid).await {
            Ok(order) => return Ok(order),
            Err(DomainError::NotFound(_)) => {}
            Err(e) => warn!(order_uid, error = %e, "Failed to fetch order from cache"),
        }

        let order = match self.database.get_order(order_uid).await {
            Ok(order) => order,
            Err(DomainError::NotFound(_)) => {
                return Err(DomainError::NotFound(order_uid.to_string()));
            }
            Err(e) => {
                error!(order_uid, error = %e, "Failed to fetch order from database");
                return Err(e);
            }
        };

        self.cache_best_effort(&order, "backfill").await;
        Ok(order)
    }

    async fn create_order(&self, order: &Order) -> DomainResult<Order> {
        let stored = self.database.create_order(order).await.map_err(|e| {
            error!(order_uid = %order.order_uid, error = %e, "Failed to save order to database");
            e
        })?;

        self.cache_best_effort(&stored, "create").await;
        Ok(stored)
    }
}
