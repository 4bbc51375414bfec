use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Customer, Delivery, Order};
use crate::StoreResult;

/// Repository for the order/delivery pair.
///
/// Every write takes or touches both records and is atomic: either all of
/// its statements are committed or none are.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert an order together with its delivery.
    async fn insert_order(&self, order: &Order, delivery: &Delivery) -> StoreResult<Uuid>;

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;

    /// All orders, newest first.
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;

    /// Overwrite the pair if the stored version still equals `expected_version`.
    ///
    /// Returns `StoreError::Conflict` when another writer got there first and
    /// `StoreError::NotFound` when the order is gone.
    async fn update_order(
        &self,
        order: &Order,
        delivery: &Delivery,
        expected_version: i64,
    ) -> StoreResult<()>;

    /// Set the same status label on the order and its delivery.
    /// Returns `false` if the order does not exist.
    async fn update_status(&self, id: Uuid, status: &str) -> StoreResult<bool>;

    /// Delete the delivery, then the order. Returns `false` if the order does not exist.
    async fn delete_order(&self, id: Uuid) -> StoreResult<bool>;
}

/// Access to deliveries. Apart from the status label, writes go through
/// [`OrderRepository`].
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    async fn get_delivery(&self, id: Uuid) -> StoreResult<Option<Delivery>>;

    async fn get_delivery_by_order(&self, order_id: Uuid) -> StoreResult<Option<Delivery>>;

    async fn list_deliveries(&self) -> StoreResult<Vec<Delivery>>;

    /// Set the status of one delivery, leaving its order alone.
    /// Returns `false` if the delivery does not exist.
    async fn update_delivery_status(&self, id: Uuid, status: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<Uuid>;

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>>;

    async fn find_by_cpf(&self, cpf: &str) -> StoreResult<Option<Customer>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Customer>>;

    async fn list_customers(&self) -> StoreResult<Vec<Customer>>;

    /// Returns `false` if the customer does not exist.
    async fn update_customer(&self, customer: &Customer) -> StoreResult<bool>;

    /// Returns `false` if the customer does not exist.
    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool>;

    async fn count_orders(&self, customer_id: Uuid) -> StoreResult<i64>;

    async fn customer_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.get_customer(id).await?.is_some())
    }
}
