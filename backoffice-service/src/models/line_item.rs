//! Line item model shared by sale and procurement records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One ordered line on a sale or procurement.
///
/// `amount` is derived and is overwritten by the normalizer on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(
        item_id: impl Into<String>,
        description: Option<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            description,
            quantity,
            unit_price,
            amount: Decimal::ZERO,
        }
    }
}
