use crate::domain::errors::DomainResult;
use crate::domain::Order;
use async_trait::async_trait;

/// 订单仓储端口接口
///
/// 持久化仓储、内存缓存以及组合二者的缓存仓储都实现此接口，可互换使用。
#[async_trait]
pub trait OrderRepositoryPort: Send + Sync {
    /// 根据订单号查找订单，不存在时返回 `DomainError::NotFound`
    async fn get_order(&self, order_uid: &str) -> DomainResult<Order>;

    /// 保存新订单，返回实际存储的订单
    ///
    /// 订单号已存在时返回 `DomainError::AlreadyExists`，不会覆盖。
    async fn create_order(&self, order: &Order) -> DomainResult<Order>;
}
