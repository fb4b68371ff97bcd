pub mod in_memory_order_repository;
pub mod kafka_order_feed;
pub mod postgres_order_repository;
pub mod redis_order_repository;

pub use in_memory_order_repository::InMemoryOrderRepository;
pub use kafka_order_feed::KafkaOrderFeed;
pub use postgres_order_repository::PostgresOrderRepository;
pub use redis_order_repository::RedisOrderRepository;
