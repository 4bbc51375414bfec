use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use rapido_core::Customer;
use rapido_order::{CustomerPatch, NewCustomer};
use rapido_shared::parse_id;
use serde::Deserialize;

use crate::error::{AppError, AppJson};
use crate::state::AppState;
use crate::Confirmation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    pub customer_id: Option<String>,
}

/// Body of both create and update. Create requires every field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerRequest {
    fn into_new_customer(self) -> Result<NewCustomer, AppError> {
        fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
            value.ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))
        }

        Ok(NewCustomer {
            name: required("name", self.name)?,
            cpf: required("cpf", self.cpf)?,
            phone: required("phone", self.phone)?,
            email: required("email", self.email)?,
            address: required("address", self.address)?,
        })
    }

    fn into_patch(self) -> CustomerPatch {
        CustomerPatch {
            name: self.name,
            cpf: self.cpf,
            phone: self.phone,
            email: self.email,
            address: self.address,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{customer_id}",
            put(update_customer).delete(delete_customer),
        )
}

/// GET /customers?customerId=...
pub async fn list_customers(
    State(state): State<AppState>,
    query: Result<Query<CustomerQuery>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let Query(query) = query?;
    let only = match query.customer_id {
        Some(raw) => Some(parse_id("customerId", &raw)?),
        None => None,
    };

    Ok(Json(state.customers.list(only).await?))
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    AppJson(req): AppJson<CustomerRequest>,
) -> Result<(StatusCode, Json<Confirmation>), AppError> {
    let id = state.customers.create(req.into_new_customer()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(Confirmation::created("Customer created", id)),
    ))
}

/// PUT /customers/{customer_id}
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    AppJson(req): AppJson<CustomerRequest>,
) -> Result<Json<Confirmation>, AppError> {
    let customer_id = parse_id("customerId", &customer_id)?;
    state.customers.update(customer_id, req.into_patch()).await?;

    Ok(Json(Confirmation::new("Customer updated")))
}

/// DELETE /customers/{customer_id}
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Confirmation>, AppError> {
    let customer_id = parse_id("customerId", &customer_id)?;
    state.customers.delete(customer_id).await?;

    Ok(Json(Confirmation::new("Customer deleted")))
}
