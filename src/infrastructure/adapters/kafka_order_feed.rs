use crate::domain::errors::{DomainError, DomainResult};
use crate::ports::order_feed_port::{FeedMessage, OrderFeedPort};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::Message;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const FEED_BUFFER: usize = 256;

/// 接收失败后的重试间隔
const RECV_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Kafka/Redpanda 订单消息源
///
/// 不提交 offset，每次启动都从 broker 的默认位置开始消费。
#[derive(Debug, Clone)]
pub struct KafkaOrderFeed {
    brokers: String,
    group_id: String,
}

impl KafkaOrderFeed {
    pub fn new(brokers: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: group_id.into(),
        }
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.group_id)
            .set("enable.auto.commit", "false");
        config
    }
}

#[async_trait]
impl OrderFeedPort for KafkaOrderFeed {
    async fn subscribe(&self, subject: &str) -> DomainResult<mpsc::Receiver<FeedMessage>> {
        let consumer: StreamConsumer = self
            .client_config()
            .create()
            .map_err(|e| DomainError::Broker(format!("Failed to create Kafka consumer: {}", e)))?;

        consumer.subscribe(&[subject]).map_err(|e| {
            DomainError::Broker(format!("Failed to subscribe to topic \"{}\": {}", subject, e))
        })?;

        let (sender, receiver) = mpsc::channel(FEED_BUFFER);
        tokio::spawn(forward_messages(consumer, subject.to_string(), sender));

        Ok(receiver)
    }
}

/// 把 Kafka 消息转发到通道，接收端关闭后退出
async fn forward_messages(
    consumer: StreamConsumer,
    subject: String,
    sender: mpsc::Sender<FeedMessage>,
) {
    loop {
        let message = tokio::select! {
            _ = sender.closed() => break,
            received = consumer.recv() => match received {
                Ok(message) => FeedMessage {
                    subject: subject.clone(),
                    payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                },
                Err(e) => {
                    warn!(topic = %subject, error = %e, "Failed to receive message from Kafka");
                    if wait_before_retry(&sender).await {
                        continue;
                    }
                    break;
                }
            },
        };

        if sender.send(message).await.is_err() {
            break;
        }
    }

    debug!(topic = %subject, "Kafka forwarding task stopped");
}

/// 接收失败后暂停一段时间，返回 false 表示接收端已关闭
async fn wait_before_retry(sender: &mpsc::Sender<FeedMessage>) -> bool {
    tokio::select! {
        _ = sender.closed() => false,
        _ = tokio::time::sleep(RECV_RETRY_DELAY) => true,
    }
}
