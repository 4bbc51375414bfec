use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rapido_core::{Customer, CustomerRepository, StoreResult};
use rapido_shared::Masked;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store_err;

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> StoreResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT id, name, cpf, phone, email, address, created_at FROM customers WHERE {} = $1",
            column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Customer::from))
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    cpf: String,
    phone: String,
    email: String,
    address: String,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            cpf: Masked::new(row.cpf),
            phone: Masked::new(row.phone),
            email: Masked::new(row.email),
            address: row.address,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, cpf, phone, email, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(customer.cpf.inner())
        .bind(customer.phone.inner())
        .bind(customer.email.inner())
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(customer.id)
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, name, cpf, phone, email, address, created_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Customer::from))
    }

    async fn find_by_cpf(&self, cpf: &str) -> StoreResult<Option<Customer>> {
        self.fetch_one_by("cpf", cpf).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        self.fetch_one_by("email", email).await
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            "SELECT id, name, cpf, phone, email, address, created_at FROM customers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn update_customer(&self, customer: &Customer) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, cpf = $3, phone = $4, email = $5, address = $6
            WHERE id = $1
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(customer.cpf.inner())
        .bind(customer.phone.inner())
        .bind(customer.email.inner())
        .bind(&customer.address)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_orders(&self, customer_id: Uuid) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)
    }
}
