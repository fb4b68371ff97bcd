pub mod order_feed_port;
pub mod order_repository_port;

pub use order_feed_port::{FeedMessage, OrderFeedPort};
pub use order_repository_port::OrderRepositoryPort;
