use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::Order;
use crate::ports::{FeedMessage, OrderFeedPort, OrderRepositoryPort};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// 订单消息消费者
///
/// 每条消息：解码 → 校验 → 保存。任何一步失败都只记录日志并丢弃该消息，
/// 不重试、不重新投递，订阅本身继续运行（至多一次语义）。
pub struct OrderConsumer<R: ?Sized, F: ?Sized> {
    repository: Arc<R>,
    feed: Arc<F>,
    subject: String,
}

impl<R, F> OrderConsumer<R, F>
where
    R: OrderRepositoryPort + ?Sized + 'static,
    F: OrderFeedPort + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>, feed: Arc<F>, subject: impl Into<String>) -> Self {
        Self {
            repository,
            feed,
            subject: subject.into(),
        }
    }

    /// 订阅配置的主题，失败直接返回给调用方
    pub async fn subscribe(&self) -> DomainResult<mpsc::Receiver<FeedMessage>> {
        let receiver = self.feed.subscribe(&self.subject).await?;
        info!("Subscribed to subject \"{}\"", self.subject);
        Ok(receiver)
    }

    /// 消费循环：每条消息在独立任务中处理
    ///
    /// 收到关闭信号或消息源结束后停止接收，并等待已开始处理的消息完成。
    pub async fn run(
        self: Arc<Self>,
        mut receiver: mpsc::Receiver<FeedMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(subject = %self.subject, "Order consumer shutting down");
                        break;
                    }
                }
                received = receiver.recv() => match received {
                    Some(message) => {
                        let consumer = Arc::clone(&self);
                        in_flight.spawn(async move { consumer.process_message(message).await });
                    }
                    None => {
                        info!(subject = %self.subject, "Order feed closed");
                        break;
                    }
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Message handler task failed");
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Message handler task failed");
            }
        }

        debug!(subject = %self.subject, "Order consumer stopped");
    }

    async fn process_message(&self, message: FeedMessage) {
        debug!(
            subject = %message.subject,
            bytes = message.payload.len(),
            "Received message"
        );

        if let Err(e) = self.handle_message(&message).await {
            match &e {
                DomainError::Serialization(_) | DomainError::Validation(_) => {
                    warn!(subject = %message.subject, error = %e, "Discarding invalid message");
                }
                _ => {
                    error!(subject = %message.subject, error = %e, "Discarding message, failed to save order");
                }
            }
        }
    }

    /// 解码、校验并保存一条消息，返回保存后的订单
    pub async fn handle_message(&self, message: &FeedMessage) -> DomainResult<Order> {
        let order: Order = serde_json::from_slice(&message.payload)?;
        order.validate()?;

        let stored = self.repository.create_order(&order).await?;
        info!(
            items = stored.item_count(),
            "Saved new order with UID {}", stored.order_uid
        );
        Ok(stored)
    }
}
