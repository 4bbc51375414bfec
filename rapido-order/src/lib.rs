pub mod models;
pub mod manager;
pub mod changes;
pub mod customers;

pub use models::{NewOrder, OrderPatch};
pub use manager::{OrderError, OrderManager};
pub use changes::{ChangeError, ChangeHandler};
pub use customers::{CustomerError, CustomerPatch, CustomerService, NewCustomer};
