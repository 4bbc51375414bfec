use rapido_core::{CustomerRepository, DeliveryRepository, OrderRepository};
use rapido_order::{CustomerService, OrderManager};
use rapido_pricing::PricingEngine;
use rapido_store::app_config::BusinessRules;
use rapido_store::MemoryStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderManager>,
    pub customers: Arc<CustomerService>,
    pub deliveries: Arc<dyn DeliveryRepository>,
}

impl AppState {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        delivery_repo: Arc<dyn DeliveryRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        rules: &BusinessRules,
    ) -> Self {
        let manager = OrderManager::new(
            order_repo,
            delivery_repo.clone(),
            customer_repo.clone(),
            PricingEngine::new(rules.pricing.clone()),
        )
        .with_initial_status(rules.initial_status.clone());

        Self {
            orders: Arc::new(manager),
            customers: Arc::new(CustomerService::new(customer_repo)),
            deliveries: delivery_repo,
        }
    }

    /// State backed by one in-memory store, for tests and local runs.
    pub fn in_memory(store: Arc<MemoryStore>, rules: &BusinessRules) -> Self {
        Self::new(store.clone(), store.clone(), store, rules)
    }
}
