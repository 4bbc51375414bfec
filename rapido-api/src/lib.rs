use axum::{http::Method, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod customers;
pub mod deliveries;
pub mod error;
pub mod orders;
pub mod state;

pub use state::AppState;

/// Success body shared by every write route.
#[derive(Debug, Serialize)]
pub struct Confirmation {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl Confirmation {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), id: None }
    }

    pub fn created(message: impl Into<String>, id: Uuid) -> Self {
        Self { message: message.into(), id: Some(id) }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(orders::routes())
        .merge(customers::routes())
        .merge(deliveries::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
