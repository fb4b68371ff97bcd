use crate::domain::errors::DomainResult;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// 从消息队列收到的一条原始消息
#[derive(Debug, Clone)]
pub struct FeedMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

/// 订单消息源端口接口
#[async_trait]
pub trait OrderFeedPort: Send + Sync {
    /// 订阅指定主题，返回消息接收端
    ///
    /// 订阅失败直接返回错误，不做重试。发送端关闭表示消息源已结束。
    async fn subscribe(&self, subject: &str) -> DomainResult<mpsc::Receiver<FeedMessage>>;
}
