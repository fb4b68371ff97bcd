pub mod adapters;
pub mod config;

pub use adapters::{
    InMemoryOrderRepository, KafkaOrderFeed, PostgresOrderRepository, RedisOrderRepository,
};
pub use config::{AppConfig, CacheBackend};
