use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::PricingError;

/// Shipment priority. Only `urgent` carries a surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Urgency {
    Normal,
    Urgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Urgent => "urgent",
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Urgency::Urgent)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = PricingError;

    /// Case-insensitive; anything outside `normal`/`urgent` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Urgency::Normal),
            "urgent" => Ok(Urgency::Urgent),
            _ => Err(PricingError::UnknownUrgency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Urgency {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
