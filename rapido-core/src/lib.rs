pub mod models;
pub mod repository;

pub use models::{Customer, Delivery, Order, DEFAULT_ORDER_STATUS};
pub use repository::{CustomerRepository, DeliveryRepository, OrderRepository};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,
    /// Unique constraint hit, or a conditional write lost against a newer version.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
