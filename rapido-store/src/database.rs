use rapido_core::StoreError;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::{BusinessRules, DatabaseConfig};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        MIGRATOR.run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rules stored in the `business_rules` table on top of `defaults`.
    pub async fn fetch_business_rules(&self, defaults: BusinessRules) -> Result<BusinessRules, sqlx::Error> {
        let rows: Vec<(String, Value)> = sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        Ok(apply_rule_rows(defaults, rows))
    }
}

/// Rows look like `("overweight_fee", {"value": 15})`. Unknown keys and
/// values of the wrong type are ignored.
pub(crate) fn apply_rule_rows(defaults: BusinessRules, rows: Vec<(String, Value)>) -> BusinessRules {
    let mut rules = defaults;

    for (key, value) in rows {
        let Some(v) = value.get("value") else {
            continue;
        };
        let decimal = || serde_json::from_value::<Decimal>(v.clone()).ok();

        match key.as_str() {
            "urgency_rate" => if let Some(d) = decimal() { rules.pricing.urgency_rate = d; },
            "discount_threshold" => if let Some(d) = decimal() { rules.pricing.discount_threshold = d; },
            "discount_rate" => if let Some(d) = decimal() { rules.pricing.discount_rate = d; },
            "overweight_limit_kg" => if let Some(d) = decimal() { rules.pricing.overweight_limit_kg = d; },
            "overweight_fee" => if let Some(d) = decimal() { rules.pricing.overweight_fee = d; },
            "initial_status" => if let Some(s) = v.as_str() { rules.initial_status = s.to_string(); },
            _ => {}
        }
    }

    rules
}

/// Map driver errors onto the store taxonomy.
pub(crate) fn store_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            StoreError::Conflict(db.constraint().unwrap_or("constraint violation").to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}
