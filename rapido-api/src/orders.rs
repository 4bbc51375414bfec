use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use rapido_core::{Delivery, Order};
use rapido_order::{NewOrder, OrderPatch};
use rapido_shared::parse_id;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppJson};
use crate::state::AppState;
use crate::Confirmation;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Fields are optional so a missing one is reported by name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub urgency: Option<String>,
    pub distance: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub rate_per_km: Option<Decimal>,
    pub rate_per_kg: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub customer_id: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub urgency: Option<String>,
    pub distance: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub rate_per_km: Option<Decimal>,
    pub rate_per_kg: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub new_status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithDelivery {
    #[serde(flatten)]
    pub order: Order,
    pub delivery: Delivery,
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))
}

impl CreateOrderRequest {
    fn into_new_order(self) -> Result<NewOrder, AppError> {
        let customer_id = required("customerId", self.customer_id)?;

        Ok(NewOrder {
            customer_id: parse_id("customerId", &customer_id)?,
            order_date: required("orderDate", self.order_date)?,
            urgency: required("urgency", self.urgency)?,
            distance: required("distance", self.distance)?,
            weight: required("weight", self.weight)?,
            rate_per_km: required("ratePerKm", self.rate_per_km)?,
            rate_per_kg: required("ratePerKg", self.rate_per_kg)?,
        })
    }
}

impl UpdateOrderRequest {
    fn into_patch(self) -> Result<OrderPatch, AppError> {
        let customer_id = match self.customer_id {
            Some(raw) => Some(parse_id("customerId", &raw)?),
            None => None,
        };

        Ok(OrderPatch {
            customer_id,
            order_date: self.order_date,
            urgency: self.urgency,
            distance: self.distance,
            weight: self.weight,
            rate_per_km: self.rate_per_km,
            rate_per_kg: self.rate_per_kg,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{order_id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/orders/{order_id}/status", put(update_status))
}

/// GET /orders
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /orders/{order_id}
/// The order together with its delivery
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderWithDelivery>, AppError> {
    let order_id = parse_id("orderId", &order_id)?;
    let (order, delivery) = state.orders.get_order(order_id).await?;

    Ok(Json(OrderWithDelivery { order, delivery }))
}

/// POST /orders
/// Price the order and store it with its delivery
pub async fn create_order(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Confirmation>), AppError> {
    let new_order = req.into_new_order()?;
    let order_id = state.orders.create_order(new_order).await?;

    Ok((
        StatusCode::CREATED,
        Json(Confirmation::created("Order created", order_id)),
    ))
}

/// PUT /orders/{order_id}
/// Partial update; the delivery breakdown is recomputed
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    AppJson(req): AppJson<UpdateOrderRequest>,
) -> Result<Json<Confirmation>, AppError> {
    let order_id = parse_id("orderId", &order_id)?;
    let patch = req.into_patch()?;
    state.orders.update_order(order_id, patch).await?;

    Ok(Json(Confirmation::new("Order updated")))
}

/// PUT /orders/{order_id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    AppJson(req): AppJson<StatusRequest>,
) -> Result<Json<Confirmation>, AppError> {
    let order_id = parse_id("orderId", &order_id)?;
    let status = required("newStatus", req.new_status)?;
    state.orders.transition_status(order_id, &status).await?;

    Ok(Json(Confirmation::new("Order status updated")))
}

/// DELETE /orders/{order_id}
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Confirmation>, AppError> {
    let order_id = parse_id("orderId", &order_id)?;
    state.orders.delete_order(order_id).await?;

    Ok(Json(Confirmation::new("Order deleted")))
}
