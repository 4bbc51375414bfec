pub mod ids;
pub mod pii;

pub use ids::{parse_id, IdError};
pub use pii::Masked;
