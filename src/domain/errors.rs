use thiserror::Error;

/// 领域层错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 订单未找到
    #[error("Order not found: {0}")]
    NotFound(String),

    /// 订单已存在（唯一性冲突）
    #[error("Order already exists: {0}")]
    AlreadyExists(String),

    /// 关联记录冲突（如支付交易号已被其他订单使用），订单未保存
    #[error("Conflicting record: {0}")]
    Conflict(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 缓存错误
    #[error("Cache error: {0}")]
    Cache(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 消息队列错误
    #[error("Broker error: {0}")]
    Broker(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }
}

/// 订单校验错误，按检查顺序排列
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("order uid is empty")]
    MissingOrderUid,

    #[error("delivery info is empty")]
    MissingDelivery,

    #[error("payment info is empty")]
    MissingPayment,

    #[error("payment is invalid: {0}")]
    InvalidPayment(PaymentViolation),

    #[error("item list is nil")]
    MissingItems,

    #[error("item {index} is invalid: {violation}")]
    InvalidItem {
        index: usize,
        violation: ItemViolation,
    },
}

/// 支付信息校验失败原因
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentViolation {
    #[error("transaction is empty")]
    EmptyTransaction,
}

/// 商品校验失败原因
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemViolation {
    #[error("illegal chrt_id (0)")]
    ZeroChrtId,
}

/// 领域结果类型
pub type DomainResult<T> = Result<T, DomainError>;
