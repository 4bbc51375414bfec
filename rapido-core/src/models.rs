use chrono::{DateTime, NaiveDate, Utc};
use rapido_pricing::{Breakdown, PricingInput, Urgency};
use rapido_shared::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status given to a new order and its delivery when nothing else is configured.
pub const DEFAULT_ORDER_STATUS: &str = "pendente";

/// A registered customer. Contact data is masked in `Debug` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub cpf: Masked<String>,
    pub phone: Masked<String>,
    pub email: Masked<String>,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String, cpf: String, phone: String, email: String, address: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            cpf: Masked::new(cpf),
            phone: Masked::new(phone),
            email: Masked::new(email),
            address,
            created_at: Utc::now(),
        }
    }
}

/// A shipment request. `total_value` is always the final value of pricing
/// `(distance, weight, rate_per_km, rate_per_kg, urgency)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    pub urgency: Urgency,
    pub distance: Decimal,
    pub weight: Decimal,
    pub rate_per_km: Decimal,
    pub rate_per_kg: Decimal,
    pub total_value: Decimal,
    pub status: String,
    /// Bumped on every write to the order/delivery pair
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn pricing_input(&self) -> PricingInput {
        PricingInput {
            distance: self.distance,
            weight: self.weight,
            rate_per_km: self.rate_per_km,
            rate_per_kg: self.rate_per_kg,
            urgency: self.urgency,
        }
    }
}

/// Itemised cost and fulfillment status of exactly one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub distance_value: Decimal,
    pub weight_value: Decimal,
    pub urgency_surcharge: Decimal,
    pub high_value_discount: Decimal,
    pub overweight_surcharge: Decimal,
    pub final_value: Decimal,
    pub status: String,
}

impl Delivery {
    pub fn new(order_id: Uuid, breakdown: &Breakdown, status: String) -> Self {
        let mut delivery = Self {
            id: Uuid::new_v4(),
            order_id,
            distance_value: Decimal::ZERO,
            weight_value: Decimal::ZERO,
            urgency_surcharge: Decimal::ZERO,
            high_value_discount: Decimal::ZERO,
            overweight_surcharge: Decimal::ZERO,
            final_value: Decimal::ZERO,
            status,
        };
        delivery.apply_breakdown(breakdown);
        delivery
    }

    pub fn apply_breakdown(&mut self, breakdown: &Breakdown) {
        self.distance_value = breakdown.distance_value;
        self.weight_value = breakdown.weight_value;
        self.urgency_surcharge = breakdown.urgency_surcharge;
        self.high_value_discount = breakdown.high_value_discount;
        self.overweight_surcharge = breakdown.overweight_surcharge;
        self.final_value = breakdown.final_value;
    }

    pub fn breakdown(&self) -> Breakdown {
        Breakdown {
            distance_value: self.distance_value,
            weight_value: self.weight_value,
            urgency_surcharge: self.urgency_surcharge,
            high_value_discount: self.high_value_discount,
            overweight_surcharge: self.overweight_surcharge,
            final_value: self.final_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_delivery_round_trips_breakdown() {
        let breakdown = Breakdown {
            distance_value: dec!(600),
            weight_value: dec!(20),
            urgency_surcharge: dec!(124),
            high_value_discount: dec!(74.4),
            overweight_surcharge: Decimal::ZERO,
            final_value: dec!(669.6),
        };
        let order_id = Uuid::new_v4();
        let delivery = Delivery::new(order_id, &breakdown, DEFAULT_ORDER_STATUS.to_string());

        assert_eq!(delivery.order_id, order_id);
        assert_eq!(delivery.breakdown(), breakdown);
        assert_eq!(delivery.status, "pendente");
    }

    #[test]
    fn test_customer_debug_hides_contact_data() {
        let customer = Customer::new(
            "Ana Souza".to_string(),
            "12345678901".to_string(),
            "11987654321".to_string(),
            "ana@example.com".to_string(),
            "Rua das Flores, 10".to_string(),
        );
        let debug = format!("{:?}", customer);
        assert!(!debug.contains("12345678901"));
        assert!(!debug.contains("ana@example.com"));

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["cpf"], "12345678901");
        assert_eq!(json["email"], "ana@example.com");
    }
}
