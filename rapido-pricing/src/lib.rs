pub mod engine;
pub mod urgency;

pub use engine::{component_value, Breakdown, PricingConfig, PricingEngine, PricingError, PricingInput};
pub use urgency::Urgency;
