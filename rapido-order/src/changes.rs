use rapido_core::{Delivery, Order};
use rapido_pricing::{component_value, PricingEngine, PricingError, Urgency};
use rust_decimal::Decimal;

use crate::models::OrderPatch;

/// Merges partial updates into an order/delivery pair.
pub struct ChangeHandler;

impl ChangeHandler {
    /// Apply `patch` to the pair and reprice it.
    ///
    /// Each cost component is only recomputed when one of its two inputs was
    /// supplied; otherwise the stored component value is kept. The components
    /// are then run through the full adjustment sequence again, using the
    /// merged urgency and weight. Version and timestamps are left to the caller.
    pub fn apply_patch(
        engine: &PricingEngine,
        order: &mut Order,
        delivery: &mut Delivery,
        patch: &OrderPatch,
    ) -> Result<(), ChangeError> {
        let urgency = match &patch.urgency {
            Some(raw) => raw
                .parse::<Urgency>()
                .map_err(|_| ChangeError::InvalidUrgency(raw.clone()))?,
            None => order.urgency,
        };

        check_non_negative("distance", patch.distance)?;
        check_non_negative("weight", patch.weight)?;
        check_non_negative("ratePerKm", patch.rate_per_km)?;
        check_non_negative("ratePerKg", patch.rate_per_kg)?;

        let distance_value = Self::merged_component(
            "distance",
            patch.distance,
            patch.rate_per_km,
            order.distance,
            order.rate_per_km,
            delivery.distance_value,
        )?;
        let weight_value = Self::merged_component(
            "weight",
            patch.weight,
            patch.rate_per_kg,
            order.weight,
            order.rate_per_kg,
            delivery.weight_value,
        )?;

        let weight = patch.weight.unwrap_or(order.weight);
        let breakdown = engine.apply_adjustments(distance_value, weight_value, weight, urgency)?;

        if let Some(customer_id) = patch.customer_id {
            order.customer_id = customer_id;
        }
        if let Some(order_date) = patch.order_date {
            order.order_date = order_date;
        }
        order.urgency = urgency;
        order.distance = patch.distance.unwrap_or(order.distance);
        order.weight = weight;
        order.rate_per_km = patch.rate_per_km.unwrap_or(order.rate_per_km);
        order.rate_per_kg = patch.rate_per_kg.unwrap_or(order.rate_per_kg);
        order.total_value = breakdown.final_value;

        delivery.apply_breakdown(&breakdown);
        Ok(())
    }

    /// `quantity * rate` for one component, mixing new and stored inputs.
    fn merged_component(
        component: &'static str,
        new_quantity: Option<Decimal>,
        new_rate: Option<Decimal>,
        old_quantity: Decimal,
        old_rate: Decimal,
        stored_value: Decimal,
    ) -> Result<Decimal, PricingError> {
        match (new_quantity, new_rate) {
            (Some(quantity), Some(rate)) => component_value(component, quantity, rate),
            (Some(quantity), None) => component_value(component, quantity, old_rate),
            (None, Some(rate)) => component_value(component, old_quantity, rate),
            (None, None) => Ok(stored_value),
        }
    }
}

fn check_non_negative(field: &'static str, value: Option<Decimal>) -> Result<(), ChangeError> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(ChangeError::NegativeValue(field)),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeError {
    #[error("Invalid urgency '{0}', expected 'normal' or 'urgent'")]
    InvalidUrgency(String),

    #[error("{0} must not be negative")]
    NegativeValue(&'static str),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rapido_pricing::PricingInput;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn priced_pair(input: PricingInput) -> (Order, Delivery) {
        let engine = PricingEngine::default();
        let breakdown = engine.compute_breakdown(&input).unwrap();
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            order_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            urgency: input.urgency,
            distance: input.distance,
            weight: input.weight,
            rate_per_km: input.rate_per_km,
            rate_per_kg: input.rate_per_kg,
            total_value: breakdown.final_value,
            status: "pendente".to_string(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let delivery = Delivery::new(order.id, &breakdown, order.status.clone());
        (order, delivery)
    }

    fn base_input() -> PricingInput {
        PricingInput {
            distance: dec!(10),
            weight: dec!(5),
            rate_per_km: dec!(2),
            rate_per_kg: dec!(3),
            urgency: Urgency::Normal,
        }
    }

    #[test]
    fn test_rate_only_uses_stored_distance() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(base_input());

        let patch = OrderPatch {
            rate_per_km: Some(dec!(7)),
            ..OrderPatch::default()
        };
        ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap();

        assert_eq!(delivery.distance_value, dec!(70));
        assert_eq!(delivery.weight_value, dec!(15));
        assert_eq!(delivery.final_value, dec!(85));
        assert_eq!(order.total_value, dec!(85));
        assert_eq!(order.rate_per_km, dec!(7));
        assert_eq!(order.distance, dec!(10));
    }

    #[test]
    fn test_untouched_component_is_reused_as_stored() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(base_input());
        // the stored weight component is taken as-is when neither weight nor its rate changes
        delivery.weight_value = dec!(16);

        let patch = OrderPatch {
            distance: Some(dec!(20)),
            ..OrderPatch::default()
        };
        ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap();

        assert_eq!(delivery.distance_value, dec!(40));
        assert_eq!(delivery.weight_value, dec!(16));
        assert_eq!(delivery.final_value, dec!(56));
    }

    #[test]
    fn test_both_inputs_of_a_component() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(base_input());

        let patch = OrderPatch {
            weight: Some(dec!(60)),
            rate_per_kg: Some(dec!(1)),
            ..OrderPatch::default()
        };
        ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap();

        // 20 + 60, overweight fee on the new weight
        assert_eq!(delivery.weight_value, dec!(60));
        assert_eq!(delivery.overweight_surcharge, dec!(15));
        assert_eq!(order.total_value, dec!(95));
    }

    #[test]
    fn test_urgency_change_reapplies_sequence() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(PricingInput {
            distance: dec!(200),
            weight: dec!(10),
            rate_per_km: dec!(3),
            rate_per_kg: dec!(2),
            urgency: Urgency::Normal,
        });
        // 620 normal -> discounted to 558
        assert_eq!(order.total_value, dec!(558));

        let patch = OrderPatch {
            urgency: Some("URGENT".to_string()),
            ..OrderPatch::default()
        };
        ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap();

        assert_eq!(order.urgency, Urgency::Urgent);
        assert_eq!(delivery.urgency_surcharge, dec!(124));
        assert_eq!(delivery.high_value_discount, dec!(74.4));
        assert_eq!(order.total_value, dec!(669.6));
        assert_eq!(delivery.final_value, order.total_value);
    }

    #[test]
    fn test_repricing_matches_full_computation() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(base_input());

        let patch = OrderPatch {
            distance: Some(dec!(300)),
            rate_per_kg: Some(dec!(12)),
            urgency: Some("urgent".to_string()),
            ..OrderPatch::default()
        };
        ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap();

        let expected = engine.compute_breakdown(&order.pricing_input()).unwrap();
        assert_eq!(delivery.breakdown(), expected);
        assert_eq!(order.total_value, expected.final_value);
    }

    #[test]
    fn test_rejects_unknown_urgency_without_mutating() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(base_input());
        let before = (order.clone(), delivery.clone());

        let patch = OrderPatch {
            urgency: Some("urgente".to_string()),
            distance: Some(dec!(99)),
            ..OrderPatch::default()
        };
        let err = ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap_err();

        assert_eq!(err, ChangeError::InvalidUrgency("urgente".to_string()));
        assert_eq!((order, delivery), before);
    }

    #[test]
    fn test_oversized_rate_is_rejected_without_mutating() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(PricingInput {
            distance: dec!(10000000000000000000),
            ..base_input()
        });
        let before = (order.clone(), delivery.clone());

        let patch = OrderPatch {
            rate_per_km: Some(dec!(100000000000000)),
            ..OrderPatch::default()
        };
        let err = ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap_err();

        assert_eq!(err, ChangeError::Pricing(PricingError::Overflow("distance")));
        assert_eq!((order, delivery), before);
    }

    #[test]
    fn test_rejects_negative_weight() {
        let engine = PricingEngine::default();
        let (mut order, mut delivery) = priced_pair(base_input());

        let patch = OrderPatch {
            weight: Some(dec!(-2)),
            ..OrderPatch::default()
        };
        let err = ChangeHandler::apply_patch(&engine, &mut order, &mut delivery, &patch).unwrap_err();
        assert_eq!(err, ChangeError::NegativeValue("weight"));
    }
}
