use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::urgency::Urgency;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("{field} must not be negative")]
    NegativeInput { field: &'static str },

    #[error("Unknown urgency '{0}', expected 'normal' or 'urgent'")]
    UnknownUrgency(String),

    #[error("{0} is too large to price")]
    Overflow(&'static str),
}

/// Thresholds and amounts applied on top of the distance and weight components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Fraction of the base added for urgent shipments
    pub urgency_rate: Decimal,

    /// Base value above which the high-value discount applies
    pub discount_threshold: Decimal,

    /// Fraction of the base removed once above the threshold
    pub discount_rate: Decimal,

    /// Weight (kg) above which the flat overweight fee applies
    pub overweight_limit_kg: Decimal,

    pub overweight_fee: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            urgency_rate: dec!(0.20),
            discount_threshold: dec!(500),
            discount_rate: dec!(0.10),
            overweight_limit_kg: dec!(50),
            overweight_fee: dec!(15),
        }
    }
}

/// Raw billing inputs of a shipment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInput {
    pub distance: Decimal,
    pub weight: Decimal,
    pub rate_per_km: Decimal,
    pub rate_per_kg: Decimal,
    pub urgency: Urgency,
}

impl PricingInput {
    pub fn validate(&self) -> Result<(), PricingError> {
        ensure_non_negative("distance", self.distance)?;
        ensure_non_negative("weight", self.weight)?;
        ensure_non_negative("ratePerKm", self.rate_per_km)?;
        ensure_non_negative("ratePerKg", self.rate_per_kg)?;
        Ok(())
    }
}

/// Itemised cost of a shipment.
///
/// `final_value` always equals
/// `distance_value + weight_value + urgency_surcharge - high_value_discount + overweight_surcharge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub distance_value: Decimal,
    pub weight_value: Decimal,
    pub urgency_surcharge: Decimal,
    pub high_value_discount: Decimal,
    pub overweight_surcharge: Decimal,
    pub final_value: Decimal,
}

impl Breakdown {
    /// Sum of the two components before any adjustment.
    pub fn base(&self) -> Decimal {
        self.distance_value + self.weight_value
    }
}

pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Price a shipment from its raw inputs.
    pub fn compute_breakdown(&self, input: &PricingInput) -> Result<Breakdown, PricingError> {
        input.validate()?;

        let distance_value = component_value("distance", input.distance, input.rate_per_km)?;
        let weight_value = component_value("weight", input.weight, input.rate_per_kg)?;

        self.apply_adjustments(distance_value, weight_value, input.weight, input.urgency)
    }

    /// Apply urgency surcharge, then high-value discount, then overweight fee.
    ///
    /// The order matters: the discount threshold is tested against the
    /// surcharged base, and the flat fee is never discounted.
    pub fn apply_adjustments(
        &self,
        distance_value: Decimal,
        weight_value: Decimal,
        weight: Decimal,
        urgency: Urgency,
    ) -> Result<Breakdown, PricingError> {
        let mut base = distance_value
            .checked_add(weight_value)
            .ok_or(PricingError::Overflow("base value"))?;

        let urgency_surcharge = if urgency.is_urgent() {
            base.checked_mul(self.config.urgency_rate)
                .ok_or(PricingError::Overflow("urgency surcharge"))?
        } else {
            Decimal::ZERO
        };
        base = base
            .checked_add(urgency_surcharge)
            .ok_or(PricingError::Overflow("urgency surcharge"))?;

        let high_value_discount = if base > self.config.discount_threshold {
            base.checked_mul(self.config.discount_rate)
                .ok_or(PricingError::Overflow("high-value discount"))?
        } else {
            Decimal::ZERO
        };
        base = base
            .checked_sub(high_value_discount)
            .ok_or(PricingError::Overflow("high-value discount"))?;

        let overweight_surcharge = if weight > self.config.overweight_limit_kg {
            self.config.overweight_fee
        } else {
            Decimal::ZERO
        };
        base = base
            .checked_add(overweight_surcharge)
            .ok_or(PricingError::Overflow("overweight surcharge"))?;

        Ok(Breakdown {
            distance_value: distance_value.normalize(),
            weight_value: weight_value.normalize(),
            urgency_surcharge: urgency_surcharge.normalize(),
            high_value_discount: high_value_discount.normalize(),
            overweight_surcharge: overweight_surcharge.normalize(),
            final_value: base.normalize(),
        })
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

/// `quantity * rate`, failing instead of overflowing.
pub fn component_value(
    component: &'static str,
    quantity: Decimal,
    rate: Decimal,
) -> Result<Decimal, PricingError> {
    quantity
        .checked_mul(rate)
        .ok_or(PricingError::Overflow(component))
}

fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<(), PricingError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(PricingError::NegativeInput { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(distance: Decimal, weight: Decimal, km: Decimal, kg: Decimal, urgency: Urgency) -> PricingInput {
        PricingInput {
            distance,
            weight,
            rate_per_km: km,
            rate_per_kg: kg,
            urgency,
        }
    }

    fn assert_adds_up(b: &Breakdown) {
        let recombined = b.distance_value + b.weight_value + b.urgency_surcharge
            - b.high_value_discount
            + b.overweight_surcharge;
        assert_eq!(recombined, b.final_value);
    }

    #[test]
    fn test_plain_normal_shipment() {
        let engine = PricingEngine::default();
        let b = engine
            .compute_breakdown(&input(dec!(10), dec!(5), dec!(2), dec!(3), Urgency::Normal))
            .unwrap();

        assert_eq!(b.distance_value, dec!(20));
        assert_eq!(b.weight_value, dec!(15));
        assert_eq!(b.base(), dec!(35));
        assert_eq!(b.urgency_surcharge, Decimal::ZERO);
        assert_eq!(b.high_value_discount, Decimal::ZERO);
        assert_eq!(b.overweight_surcharge, Decimal::ZERO);
        assert_eq!(b.final_value, dec!(35));
        assert_adds_up(&b);
    }

    #[test]
    fn test_urgent_shipment_crosses_discount_threshold() {
        let engine = PricingEngine::default();
        let b = engine
            .compute_breakdown(&input(dec!(200), dec!(10), dec!(3), dec!(2), Urgency::Urgent))
            .unwrap();

        assert_eq!(b.base(), dec!(620));
        assert_eq!(b.urgency_surcharge, dec!(124));
        assert_eq!(b.high_value_discount, dec!(74.4));
        assert_eq!(b.overweight_surcharge, Decimal::ZERO);
        assert_eq!(b.final_value, dec!(669.6));
        assert_adds_up(&b);
    }

    #[test]
    fn test_overweight_fee_is_flat() {
        let engine = PricingEngine::default();
        let b = engine
            .compute_breakdown(&input(dec!(0), dec!(60), dec!(4), dec!(1), Urgency::Normal))
            .unwrap();

        assert_eq!(b.distance_value, Decimal::ZERO);
        assert_eq!(b.weight_value, dec!(60));
        assert_eq!(b.overweight_surcharge, dec!(15));
        assert_eq!(b.final_value, dec!(75));
        assert_adds_up(&b);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let engine = PricingEngine::default();

        // exactly 500 is not discounted, exactly 50kg is not overweight
        let b = engine
            .compute_breakdown(&input(dec!(100), dec!(50), dec!(4.5), dec!(1), Urgency::Normal))
            .unwrap();
        assert_eq!(b.base(), dec!(500));
        assert_eq!(b.high_value_discount, Decimal::ZERO);
        assert_eq!(b.overweight_surcharge, Decimal::ZERO);
        assert_eq!(b.final_value, dec!(500));
    }

    #[test]
    fn test_discount_is_taken_before_overweight_fee() {
        let engine = PricingEngine::default();
        let b = engine
            .compute_breakdown(&input(dec!(100), dec!(100), dec!(5), dec!(1), Urgency::Normal))
            .unwrap();

        // 600 -> discount 60 -> 540 -> +15
        assert_eq!(b.high_value_discount, dec!(60));
        assert_eq!(b.final_value, dec!(555));
        assert_adds_up(&b);
    }

    #[test]
    fn test_rejects_negative_inputs() {
        let engine = PricingEngine::default();

        let err = engine
            .compute_breakdown(&input(dec!(-1), dec!(5), dec!(2), dec!(3), Urgency::Normal))
            .unwrap_err();
        assert_eq!(err, PricingError::NegativeInput { field: "distance" });

        let err = engine
            .compute_breakdown(&input(dec!(1), dec!(-0.5), dec!(2), dec!(3), Urgency::Normal))
            .unwrap_err();
        assert_eq!(err, PricingError::NegativeInput { field: "weight" });

        let err = engine
            .compute_breakdown(&input(dec!(1), dec!(1), dec!(2), dec!(-3), Urgency::Normal))
            .unwrap_err();
        assert_eq!(err, PricingError::NegativeInput { field: "ratePerKg" });
    }

    #[test]
    fn test_is_deterministic() {
        let engine = PricingEngine::default();
        let i = input(dec!(321.5), dec!(51), dec!(1.75), dec!(2.2), Urgency::Urgent);

        let first = engine.compute_breakdown(&i).unwrap();
        for _ in 0..10 {
            assert_eq!(engine.compute_breakdown(&i).unwrap(), first);
        }
        assert_adds_up(&first);
    }

    #[test]
    fn test_huge_inputs_fail_instead_of_panicking() {
        let engine = PricingEngine::default();

        let err = engine
            .compute_breakdown(&input(
                dec!(10000000000000000000),
                dec!(1),
                dec!(100000000000000),
                dec!(1),
                Urgency::Normal,
            ))
            .unwrap_err();
        assert_eq!(err, PricingError::Overflow("distance"));

        // each component fits, their sum does not
        let err = engine
            .apply_adjustments(Decimal::MAX, Decimal::MAX, dec!(1), Urgency::Normal)
            .unwrap_err();
        assert_eq!(err, PricingError::Overflow("base value"));

        let err = engine
            .apply_adjustments(Decimal::MAX, Decimal::ZERO, dec!(1), Urgency::Urgent)
            .unwrap_err();
        assert_eq!(err, PricingError::Overflow("urgency surcharge"));
    }

    #[test]
    fn test_custom_config() {
        let engine = PricingEngine::new(PricingConfig {
            overweight_fee: dec!(40),
            ..PricingConfig::default()
        });
        let b = engine
            .compute_breakdown(&input(dec!(0), dec!(60), dec!(0), dec!(1), Urgency::Normal))
            .unwrap();
        assert_eq!(b.final_value, dec!(100));
    }
}
