pub mod entities;
pub mod errors;

pub use entities::{Delivery, Item, Order, Payment};
pub use errors::{DomainError, DomainResult, ValidationError};
