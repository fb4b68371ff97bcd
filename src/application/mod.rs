pub mod cached_order_repository;
pub mod dto;
pub mod order_consumer;

pub use cached_order_repository::CachedOrderRepository;
pub use dto::ErrorResponse;
pub use order_consumer::OrderConsumer;
