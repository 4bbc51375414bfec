use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Everything needed to place an order. Urgency is still raw text here; the
/// manager parses it.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    pub urgency: String,
    pub distance: Decimal,
    pub weight: Decimal,
    pub rate_per_km: Decimal,
    pub rate_per_kg: Decimal,
}

/// Partial update of an order. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub customer_id: Option<Uuid>,
    pub order_date: Option<NaiveDate>,
    pub urgency: Option<String>,
    pub distance: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub rate_per_km: Option<Decimal>,
    pub rate_per_kg: Option<Decimal>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none()
            && self.order_date.is_none()
            && self.urgency.is_none()
            && self.distance.is_none()
            && self.weight.is_none()
            && self.rate_per_km.is_none()
            && self.rate_per_kg.is_none()
    }
}
