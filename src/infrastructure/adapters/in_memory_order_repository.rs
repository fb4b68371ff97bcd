use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::Order;
use crate::ports::order_repository_port::OrderRepositoryPort;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// 内存订单仓储，作为缓存层使用
///
/// 基于 DashMap，多读多写无需外部加锁。没有过期和淘汰，进程重启即清空。
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<DashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepositoryPort for InMemoryOrderRepository {
    async fn get_order(&self, order_uid: &str) -> DomainResult<Order> {
        self.orders
            .get(order_uid)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DomainError::NotFound(order_uid.to_string()))
    }

    /// 重复的订单号直接报错，不覆盖已有值
    async fn create_order(&self, order: &Order) -> DomainResult<Order> {
        let mut stored = order.clone();
        stored.assign_item_owner();

        match self.orders.entry(stored.order_uid.clone()) {
            Entry::Occupied(_) => Err(DomainError::AlreadyExists(stored.order_uid)),
            Entry::Vacant(slot) => {
                slot.insert(stored.clone());
                debug!("Order cached in memory: {}", stored.order_uid);
                Ok(stored)
            }
        }
    }
}
