use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 缓存层实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// 进程内存
    Memory,
    /// Redis
    Redis,
}

impl FromStr for CacheBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(DomainError::Configuration(format!(
                "Unknown CACHE_BACKEND: {}",
                other
            ))),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL连接串
    pub database_url: String,

    /// Kafka broker 地址列表
    pub kafka_brokers: String,

    /// 订阅的主题
    pub kafka_topic: String,

    /// 消费组ID
    pub kafka_group_id: String,

    pub server_host: String,
    pub server_port: u16,

    pub cache_backend: CacheBackend,

    /// 仅在使用 Redis 缓存时生效
    pub redis_url: String,
}

impl AppConfig {
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| DomainError::Configuration(format!("{} must be set", key)))
        };
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let server_port = or_default("SERVER_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| DomainError::Configuration(format!("Invalid SERVER_PORT: {}", e)))?;

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            kafka_brokers: require("KAFKA_BROKERS")?,
            kafka_topic: require("KAFKA_TOPIC")?,
            kafka_group_id: or_default("KAFKA_GROUP_ID", "order-service"),
            server_host: or_default("SERVER_HOST", "0.0.0.0"),
            server_port,
            cache_backend: or_default("CACHE_BACKEND", "memory").parse()?,
            redis_url: or_default("REDIS_URL", "redis://127.0.0.1:6379"),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
