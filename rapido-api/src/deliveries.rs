use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use rapido_core::Delivery;
use rapido_shared::parse_id;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppJson};
use crate::orders::StatusRequest;
use crate::state::AppState;
use crate::Confirmation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryQuery {
    pub delivery_id: Option<String>,
}

// Only the status label is written here; everything else goes through the order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deliveries", get(list_deliveries))
        .route("/deliveries/{delivery_id}", get(get_delivery))
        .route("/deliveries/{delivery_id}/status", put(update_delivery_status))
}

/// GET /deliveries?deliveryId=...
pub async fn list_deliveries(
    State(state): State<AppState>,
    query: Result<Query<DeliveryQuery>, QueryRejection>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    let Query(query) = query?;
    match query.delivery_id {
        Some(raw) => {
            let delivery_id = parse_id("deliveryId", &raw)?;
            Ok(Json(vec![find_delivery(&state, delivery_id).await?]))
        }
        None => Ok(Json(state.deliveries.list_deliveries().await?)),
    }
}

/// GET /deliveries/{delivery_id}
pub async fn get_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
) -> Result<Json<Delivery>, AppError> {
    let delivery_id = parse_id("deliveryId", &delivery_id)?;
    Ok(Json(find_delivery(&state, delivery_id).await?))
}

/// PUT /deliveries/{delivery_id}/status
pub async fn update_delivery_status(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
    AppJson(req): AppJson<StatusRequest>,
) -> Result<Json<Confirmation>, AppError> {
    let delivery_id = parse_id("deliveryId", &delivery_id)?;
    let status = req
        .new_status
        .ok_or_else(|| AppError::ValidationError("newStatus is required".to_string()))?;
    state.orders.transition_delivery_status(delivery_id, &status).await?;

    Ok(Json(Confirmation::new("Delivery status updated")))
}

async fn find_delivery(state: &AppState, delivery_id: Uuid) -> Result<Delivery, AppError> {
    state
        .deliveries
        .get_delivery(delivery_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Delivery {} not found", delivery_id)))
}
