use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rapido_core::{Delivery, DeliveryRepository, Order, OrderRepository, StoreError, StoreResult};
use rapido_pricing::Urgency;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store_err;

/// Postgres repository for orders and their deliveries.
///
/// Every write runs inside one transaction. Returning early with `?` drops
/// the transaction, which rolls it back.
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, order_date, urgency, distance_km, weight_kg, rate_per_km, rate_per_kg, total_value, status, version, created_at, updated_at";

const DELIVERY_COLUMNS: &str = "id, order_id, distance_value, weight_value, urgency_surcharge, high_value_discount, overweight_surcharge, final_value, status";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    order_date: NaiveDate,
    urgency: String,
    distance_km: Decimal,
    weight_kg: Decimal,
    rate_per_km: Decimal,
    rate_per_kg: Decimal,
    total_value: Decimal,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let urgency: Urgency = row
            .urgency
            .parse()
            .map_err(|e| StoreError::Backend(format!("order {}: {}", row.id, e)))?;

        Ok(Order {
            id: row.id,
            customer_id: row.customer_id,
            order_date: row.order_date,
            urgency,
            distance: row.distance_km,
            weight: row.weight_kg,
            rate_per_km: row.rate_per_km,
            rate_per_kg: row.rate_per_kg,
            total_value: row.total_value,
            status: row.status,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: Uuid,
    order_id: Uuid,
    distance_value: Decimal,
    weight_value: Decimal,
    urgency_surcharge: Decimal,
    high_value_discount: Decimal,
    overweight_surcharge: Decimal,
    final_value: Decimal,
    status: String,
}

impl From<DeliveryRow> for Delivery {
    fn from(row: DeliveryRow) -> Self {
        Delivery {
            id: row.id,
            order_id: row.order_id,
            distance_value: row.distance_value,
            weight_value: row.weight_value,
            urgency_surcharge: row.urgency_surcharge,
            high_value_discount: row.high_value_discount,
            overweight_surcharge: row.overweight_surcharge,
            final_value: row.final_value,
            status: row.status,
        }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert_order(&self, order: &Order, delivery: &Delivery) -> StoreResult<Uuid> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let order_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO orders (id, customer_id, order_date, urgency, distance_km, weight_kg, rate_per_km, rate_per_kg, total_value, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(order.order_date)
        .bind(order.urgency.as_str())
        .bind(order.distance)
        .bind(order.weight)
        .bind(order.rate_per_km)
        .bind(order.rate_per_kg)
        .bind(order.total_value)
        .bind(&order.status)
        .bind(order.version)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        sqlx::query(
            r#"
            INSERT INTO deliveries (id, order_id, distance_value, weight_value, urgency_surcharge, high_value_discount, overweight_surcharge, final_value, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(delivery.id)
        .bind(order_id)
        .bind(delivery.distance_value)
        .bind(delivery.weight_value)
        .bind(delivery.urgency_surcharge)
        .bind(delivery.high_value_discount)
        .bind(delivery.overweight_surcharge)
        .bind(delivery.final_value)
        .bind(&delivery.status)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        Ok(order_id)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_order(
        &self,
        order: &Order,
        delivery: &Delivery,
        expected_version: i64,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET customer_id = $2,
                order_date = $3,
                urgency = $4,
                distance_km = $5,
                weight_kg = $6,
                rate_per_km = $7,
                rate_per_kg = $8,
                total_value = $9,
                version = version + 1,
                updated_at = $10
            WHERE id = $1 AND version = $11
            "#,
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(order.order_date)
        .bind(order.urgency.as_str())
        .bind(order.distance)
        .bind(order.weight)
        .bind(order.rate_per_km)
        .bind(order.rate_per_kg)
        .bind(order.total_value)
        .bind(order.updated_at)
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            let current: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;
            tx.rollback().await.map_err(store_err)?;

            return Err(match current {
                Some(found) => StoreError::Conflict(format!(
                    "order {} expected version {}, found {}",
                    order.id, expected_version, found
                )),
                None => StoreError::NotFound,
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE deliveries
            SET distance_value = $2,
                weight_value = $3,
                urgency_surcharge = $4,
                high_value_discount = $5,
                overweight_surcharge = $6,
                final_value = $7
            WHERE order_id = $1
            "#,
        )
        .bind(order.id)
        .bind(delivery.distance_value)
        .bind(delivery.weight_value)
        .bind(delivery.urgency_surcharge)
        .bind(delivery.high_value_discount)
        .bind(delivery.overweight_surcharge)
        .bind(delivery.final_value)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if result.rows_affected() != 1 {
            tx.rollback().await.map_err(store_err)?;
            return Err(StoreError::Backend(format!(
                "order {} has {} delivery rows",
                order.id,
                result.rows_affected()
            )));
        }

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: &str) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let result = sqlx::query(
            "UPDATE orders SET status = $2, version = version + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        sqlx::query("UPDATE deliveries SET status = $2 WHERE order_id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // deliveries reference orders, so they go first
        sqlx::query("DELETE FROM deliveries WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }
}

#[async_trait]
impl DeliveryRepository for PgOrderRepository {
    async fn get_delivery(&self, id: Uuid) -> StoreResult<Option<Delivery>> {
        let row: Option<DeliveryRow> =
            sqlx::query_as(&format!("SELECT {} FROM deliveries WHERE id = $1", DELIVERY_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        Ok(row.map(Delivery::from))
    }

    async fn get_delivery_by_order(&self, order_id: Uuid) -> StoreResult<Option<Delivery>> {
        let row: Option<DeliveryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM deliveries WHERE order_id = $1",
            DELIVERY_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Delivery::from))
    }

    async fn list_deliveries(&self) -> StoreResult<Vec<Delivery>> {
        let rows: Vec<DeliveryRow> =
            sqlx::query_as(&format!("SELECT {} FROM deliveries", DELIVERY_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;

        Ok(rows.into_iter().map(Delivery::from).collect())
    }

    async fn update_delivery_status(&self, id: Uuid, status: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE deliveries SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }
}
