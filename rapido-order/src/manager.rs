use crate::changes::{ChangeError, ChangeHandler};
use crate::models::{NewOrder, OrderPatch};
use chrono::Utc;
use rapido_core::{
    CustomerRepository, Delivery, DeliveryRepository, Order, OrderRepository, StoreError,
    DEFAULT_ORDER_STATUS,
};
use rapido_pricing::{PricingEngine, PricingError, PricingInput, Urgency};
use std::sync::Arc;
use uuid::Uuid;

/// Runs the order/delivery operations. Each write reaches the repository as a
/// single paired call, so the store commits both records or neither.
pub struct OrderManager {
    orders: Arc<dyn OrderRepository>,
    deliveries: Arc<dyn DeliveryRepository>,
    customers: Arc<dyn CustomerRepository>,
    engine: PricingEngine,
    initial_status: String,
}

impl OrderManager {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        deliveries: Arc<dyn DeliveryRepository>,
        customers: Arc<dyn CustomerRepository>,
        engine: PricingEngine,
    ) -> Self {
        Self {
            orders,
            deliveries,
            customers,
            engine,
            initial_status: DEFAULT_ORDER_STATUS.to_string(),
        }
    }

    /// Status given to new orders and their deliveries.
    pub fn with_initial_status(mut self, status: impl Into<String>) -> Self {
        self.initial_status = status.into();
        self
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    /// Price a new order and store it together with its delivery.
    pub async fn create_order(&self, new: NewOrder) -> Result<Uuid, OrderError> {
        let urgency: Urgency = new.urgency.parse()?;

        self.ensure_customer(new.customer_id).await?;

        let breakdown = self.engine.compute_breakdown(&PricingInput {
            distance: new.distance,
            weight: new.weight,
            rate_per_km: new.rate_per_km,
            rate_per_kg: new.rate_per_kg,
            urgency,
        })?;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            order_date: new.order_date,
            urgency,
            distance: new.distance,
            weight: new.weight,
            rate_per_km: new.rate_per_km,
            rate_per_kg: new.rate_per_kg,
            total_value: breakdown.final_value,
            status: self.initial_status.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let delivery = Delivery::new(order.id, &breakdown, self.initial_status.clone());

        let order_id = self.orders.insert_order(&order, &delivery).await.map_err(|e| {
            tracing::error!("Failed to insert order for customer {}: {}", new.customer_id, e);
            OrderError::from(e)
        })?;

        tracing::info!("Order {} created, total {}", order_id, order.total_value);
        Ok(order_id)
    }

    /// Merge `patch` into the stored order, reprice, and write both records
    /// back if nobody else changed them in the meantime.
    pub async fn update_order(&self, order_id: Uuid, patch: OrderPatch) -> Result<(), OrderError> {
        // a pair without its delivery is a storage fault, reported before the patch is looked at
        let (mut order, mut delivery) = self.get_order(order_id).await?;

        if let Some(customer_id) = patch.customer_id {
            self.ensure_customer(customer_id).await?;
        }

        ChangeHandler::apply_patch(&self.engine, &mut order, &mut delivery, &patch)?;

        let expected_version = order.version;
        order.version += 1;
        order.updated_at = Utc::now();

        match self.orders.update_order(&order, &delivery, expected_version).await {
            Ok(()) => {
                tracing::info!("Order {} updated to version {}, total {}", order_id, order.version, order.total_value);
                Ok(())
            }
            Err(StoreError::Conflict(msg)) => {
                tracing::warn!("Concurrent update rejected for order {}: {}", order_id, msg);
                Err(OrderError::Conflict(format!("Order {} was modified concurrently", order_id)))
            }
            Err(StoreError::NotFound) => Err(OrderError::order_not_found(order_id)),
            Err(e) => {
                tracing::error!("Failed to update order {}: {}", order_id, e);
                Err(e.into())
            }
        }
    }

    /// Set the same status label on an order and its delivery.
    ///
    /// Labels are free-form; any label may follow any other.
    pub async fn transition_status(&self, order_id: Uuid, status: &str) -> Result<(), OrderError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(OrderError::Validation("status is required".to_string()));
        }

        let updated = self.orders.update_status(order_id, status).await.map_err(|e| {
            tracing::error!("Failed to update status of order {}: {}", order_id, e);
            OrderError::from(e)
        })?;
        if !updated {
            return Err(OrderError::order_not_found(order_id));
        }

        tracing::info!("Order {} moved to status '{}'", order_id, status);
        Ok(())
    }

    /// Set the status of a delivery without touching its order.
    pub async fn transition_delivery_status(&self, delivery_id: Uuid, status: &str) -> Result<(), OrderError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(OrderError::Validation("status is required".to_string()));
        }

        let updated = self
            .deliveries
            .update_delivery_status(delivery_id, status)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update status of delivery {}: {}", delivery_id, e);
                OrderError::from(e)
            })?;
        if !updated {
            return Err(OrderError::NotFound(format!("Delivery {} not found", delivery_id)));
        }

        tracing::info!("Delivery {} moved to status '{}'", delivery_id, status);
        Ok(())
    }

    /// Remove an order and its delivery.
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), OrderError> {
        let deleted = self.orders.delete_order(order_id).await.map_err(|e| {
            tracing::error!("Failed to delete order {}: {}", order_id, e);
            OrderError::from(e)
        })?;
        if !deleted {
            return Err(OrderError::order_not_found(order_id));
        }

        tracing::info!("Order {} deleted", order_id);
        Ok(())
    }

    /// Fetch an order with its delivery.
    pub async fn get_order(&self, order_id: Uuid) -> Result<(Order, Delivery), OrderError> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::order_not_found(order_id))?;

        let delivery = self
            .deliveries
            .get_delivery_by_order(order_id)
            .await?
            .ok_or_else(|| {
                tracing::error!("Order {} has no delivery record", order_id);
                OrderError::Storage(format!("Delivery missing for order {}", order_id))
            })?;

        Ok((order, delivery))
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_orders().await?)
    }

    async fn ensure_customer(&self, customer_id: Uuid) -> Result<(), OrderError> {
        if self.customers.customer_exists(customer_id).await? {
            Ok(())
        } else {
            Err(OrderError::NotFound(format!("Customer {} not found", customer_id)))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl OrderError {
    fn order_not_found(order_id: Uuid) -> Self {
        OrderError::NotFound(format!("Order {} not found", order_id))
    }
}

impl From<PricingError> for OrderError {
    fn from(err: PricingError) -> Self {
        OrderError::Validation(err.to_string())
    }
}

impl From<ChangeError> for OrderError {
    fn from(err: ChangeError) -> Self {
        OrderError::Validation(err.to_string())
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => OrderError::NotFound(err.to_string()),
            StoreError::Conflict(msg) => OrderError::Conflict(msg),
            StoreError::Backend(msg) => OrderError::Storage(msg),
        }
    }
}
