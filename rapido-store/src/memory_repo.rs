//! In-memory implementation of every repository trait.
//!
//! Useful for tests and local runs without Postgres. Paired writes are
//! applied to a staged copy of the tables and swapped in only when every
//! step succeeded, so a failure injected between steps leaves no trace,
//! the same way a rolled-back transaction would.

use async_trait::async_trait;
use rapido_core::{
    Customer, CustomerRepository, Delivery, DeliveryRepository, Order, OrderRepository,
    StoreError, StoreResult,
};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Steps of the paired writes at which a failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertOrder,
    InsertDelivery,
    UpdateOrder,
    UpdateDelivery,
    UpdateStatus,
    DeleteDelivery,
    DeleteOrder,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: HashMap<Uuid, Customer>,
    orders: HashMap<Uuid, Order>,
    deliveries: HashMap<Uuid, Delivery>,
}

impl Tables {
    fn delivery_id_for(&self, order_id: Uuid) -> Option<Uuid> {
        self.deliveries
            .values()
            .find(|d| d.order_id == order_id)
            .map(|d| d.id)
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_point: Mutex<Option<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            fail_point: Mutex::new(None),
        }
    }

    /// Make the next write that reaches `point` fail. Fires once.
    pub async fn fail_at(&self, point: FailPoint) {
        *self.fail_point.lock().await = Some(point);
    }

    async fn check(&self, point: FailPoint) -> StoreResult<()> {
        let mut armed = self.fail_point.lock().await;
        if *armed == Some(point) {
            *armed = None;
            return Err(StoreError::Backend(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: &Order, delivery: &Delivery) -> StoreResult<Uuid> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        self.check(FailPoint::InsertOrder).await?;
        if !staged.customers.contains_key(&order.customer_id) {
            return Err(StoreError::Conflict("orders_customer_id_fkey".to_string()));
        }
        if staged.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict("orders_pkey".to_string()));
        }
        staged.orders.insert(order.id, order.clone());

        self.check(FailPoint::InsertDelivery).await?;
        if staged.delivery_id_for(order.id).is_some() || staged.deliveries.contains_key(&delivery.id) {
            return Err(StoreError::Conflict("deliveries_order_id_key".to_string()));
        }
        let mut delivery = delivery.clone();
        delivery.order_id = order.id;
        staged.deliveries.insert(delivery.id, delivery);

        *tables = staged;
        Ok(order.id)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order(
        &self,
        order: &Order,
        delivery: &Delivery,
        expected_version: i64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        self.check(FailPoint::UpdateOrder).await?;
        let stored = staged.orders.get_mut(&order.id).ok_or(StoreError::NotFound)?;
        if stored.version != expected_version {
            return Err(StoreError::Conflict(format!(
                "order {} expected version {}, found {}",
                order.id, expected_version, stored.version
            )));
        }
        let status = stored.status.clone();
        let created_at = stored.created_at;
        *stored = Order {
            status,
            created_at,
            version: expected_version + 1,
            ..order.clone()
        };

        self.check(FailPoint::UpdateDelivery).await?;
        let delivery_id = staged
            .delivery_id_for(order.id)
            .ok_or_else(|| StoreError::Backend(format!("order {} has no delivery", order.id)))?;
        if let Some(stored) = staged.deliveries.get_mut(&delivery_id) {
            stored.apply_breakdown(&delivery.breakdown());
        }

        *tables = staged;
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        let Some(order) = staged.orders.get_mut(&id) else {
            return Ok(false);
        };
        order.status = status.to_string();
        order.version += 1;
        order.updated_at = chrono::Utc::now();

        self.check(FailPoint::UpdateStatus).await?;
        if let Some(delivery_id) = staged.delivery_id_for(id) {
            if let Some(delivery) = staged.deliveries.get_mut(&delivery_id) {
                delivery.status = status.to_string();
            }
        }

        *tables = staged;
        Ok(true)
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        self.check(FailPoint::DeleteDelivery).await?;
        if let Some(delivery_id) = staged.delivery_id_for(id) {
            staged.deliveries.remove(&delivery_id);
        }

        self.check(FailPoint::DeleteOrder).await?;
        if staged.orders.remove(&id).is_none() {
            return Ok(false);
        }

        *tables = staged;
        Ok(true)
    }
}

#[async_trait]
impl DeliveryRepository for MemoryStore {
    async fn get_delivery(&self, id: Uuid) -> StoreResult<Option<Delivery>> {
        Ok(self.tables.read().await.deliveries.get(&id).cloned())
    }

    async fn get_delivery_by_order(&self, order_id: Uuid) -> StoreResult<Option<Delivery>> {
        let tables = self.tables.read().await;
        Ok(tables.deliveries.values().find(|d| d.order_id == order_id).cloned())
    }

    async fn list_deliveries(&self) -> StoreResult<Vec<Delivery>> {
        Ok(self.tables.read().await.deliveries.values().cloned().collect())
    }

    async fn update_delivery_status(&self, id: Uuid, status: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.deliveries.get_mut(&id) {
            Some(delivery) => {
                delivery.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<Uuid> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.customers.values().any(|c| {
            c.cpf.inner() == customer.cpf.inner() || c.email.inner() == customer.email.inner()
        });
        if duplicate || tables.customers.contains_key(&customer.id) {
            return Err(StoreError::Conflict("customers unique constraint".to_string()));
        }
        tables.customers.insert(customer.id, customer.clone());
        Ok(customer.id)
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn find_by_cpf(&self, cpf: &str) -> StoreResult<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.values().find(|c| c.cpf.inner() == cpf).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.values().find(|c| c.email.inner() == email).cloned())
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let tables = self.tables.read().await;
        let mut customers: Vec<Customer> = tables.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn update_customer(&self, customer: &Customer) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.customers.values().any(|c| {
            c.id != customer.id
                && (c.cpf.inner() == customer.cpf.inner() || c.email.inner() == customer.email.inner())
        });
        if duplicate {
            return Err(StoreError::Conflict("customers unique constraint".to_string()));
        }
        match tables.customers.get_mut(&customer.id) {
            Some(stored) => {
                *stored = customer.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.orders.values().any(|o| o.customer_id == id) {
            return Err(StoreError::Conflict("orders_customer_id_fkey".to_string()));
        }
        Ok(tables.customers.remove(&id).is_some())
    }

    async fn count_orders(&self, customer_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.orders.values().filter(|o| o.customer_id == customer_id).count() as i64)
    }
}
