use rapido_core::{Customer, CustomerRepository, StoreError};
use rapido_shared::Masked;
use std::sync::Arc;
use uuid::Uuid;

pub const CPF_DIGITS: usize = 11;

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub cpf: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Partial update of a customer. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for CustomerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CustomerError::NotFound(err.to_string()),
            StoreError::Conflict(msg) => CustomerError::Conflict(msg),
            StoreError::Backend(msg) => CustomerError::Storage(msg),
        }
    }
}

/// Customer registry. Unlike orders there is no derived state, only the
/// uniqueness of CPF and email to look after.
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    /// All customers, or just the one with `only` if given.
    pub async fn list(&self, only: Option<Uuid>) -> Result<Vec<Customer>, CustomerError> {
        match only {
            Some(id) => Ok(self.customers.get_customer(id).await?.into_iter().collect()),
            None => Ok(self.customers.list_customers().await?),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Customer, CustomerError> {
        self.customers
            .get_customer(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, new: NewCustomer) -> Result<Uuid, CustomerError> {
        let name = required("name", &new.name)?;
        let cpf = valid_cpf(&new.cpf)?;
        let phone = required("phone", &new.phone)?;
        let email = required("email", &new.email)?;
        let address = required("address", &new.address)?;

        self.ensure_unique(None, &cpf, &email).await?;

        let customer = Customer::new(name, cpf, phone, email, address);
        let id = self.customers.insert_customer(&customer).await.map_err(|e| {
            tracing::error!("Failed to insert customer {:?}: {}", customer.email, e);
            CustomerError::from(e)
        })?;

        tracing::info!("Customer {} created (cpf {:?})", id, customer.cpf);
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<(), CustomerError> {
        let mut customer = self.get(id).await?;

        if let Some(name) = &patch.name {
            customer.name = required("name", name)?;
        }
        if let Some(cpf) = &patch.cpf {
            customer.cpf = Masked::new(valid_cpf(cpf)?);
        }
        if let Some(phone) = &patch.phone {
            customer.phone = Masked::new(required("phone", phone)?);
        }
        if let Some(email) = &patch.email {
            customer.email = Masked::new(required("email", email)?);
        }
        if let Some(address) = &patch.address {
            customer.address = required("address", address)?;
        }

        self.ensure_unique(Some(id), customer.cpf.inner(), customer.email.inner())
            .await?;

        if !self.customers.update_customer(&customer).await? {
            return Err(not_found(id));
        }

        tracing::info!("Customer {} updated", id);
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CustomerError> {
        let orders = self.customers.count_orders(id).await?;
        if orders > 0 {
            return Err(CustomerError::Conflict(format!(
                "Customer {} still has {} order(s)",
                id, orders
            )));
        }

        if !self.customers.delete_customer(id).await? {
            return Err(not_found(id));
        }

        tracing::info!("Customer {} deleted", id);
        Ok(())
    }

    async fn ensure_unique(
        &self,
        except: Option<Uuid>,
        cpf: &str,
        email: &str,
    ) -> Result<(), CustomerError> {
        let other = |c: &Customer| Some(c.id) != except;

        if self.customers.find_by_cpf(cpf).await?.filter(|c| other(c)).is_some() {
            return Err(CustomerError::Conflict("CPF already registered".to_string()));
        }
        if self.customers.find_by_email(email).await?.filter(|c| other(c)).is_some() {
            return Err(CustomerError::Conflict("Email already registered".to_string()));
        }
        Ok(())
    }
}

fn not_found(id: Uuid) -> CustomerError {
    CustomerError::NotFound(format!("Customer {} not found", id))
}

fn required(field: &str, value: &str) -> Result<String, CustomerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CustomerError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn valid_cpf(raw: &str) -> Result<String, CustomerError> {
    let cpf = required("cpf", raw)?;
    if cpf.len() != CPF_DIGITS || !cpf.chars().all(|c| c.is_ascii_digit()) {
        return Err(CustomerError::Validation(format!(
            "cpf must be {} digits",
            CPF_DIGITS
        )));
    }
    Ok(cpf)
}
