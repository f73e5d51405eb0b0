//! Procurement model for backoffice-service.

use super::LineItem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What was procured from the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcurementKind {
    RawMaterial,
    TradingGood,
}

impl ProcurementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcurementKind::RawMaterial => "RAW_MATERIAL",
            ProcurementKind::TradingGood => "TRADING_GOOD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RAW_MATERIAL" => Some(ProcurementKind::RawMaterial),
            "TRADING_GOOD" => Some(ProcurementKind::TradingGood),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase of raw materials or trading goods from a vendor.
///
/// Payments are tracked outside the record, so there is no payment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procurement {
    pub procurement_id: String,
    pub kind: ProcurementKind,
    pub vendor_id: String,
    pub items: Vec<LineItem>,
    pub gst_percentage: Decimal,
    pub subtotal: Decimal,
    pub gst_amount: Decimal,
    pub grand_total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_utc: DateTime<Utc>,
}

impl Procurement {
    pub fn new(input: CreateProcurement) -> Self {
        let now = Utc::now();
        Self {
            procurement_id: Uuid::new_v4().to_string(),
            kind: input.kind,
            vendor_id: input.vendor_id,
            items: input.items,
            gst_percentage: input.gst_percentage,
            subtotal: Decimal::ZERO,
            gst_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            notes: input.notes,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn apply_update(&mut self, update: &UpdateProcurement) {
        if let Some(vendor_id) = &update.vendor_id {
            self.vendor_id = vendor_id.clone();
        }
        if let Some(items) = &update.items {
            self.items = items.clone();
        }
        if let Some(gst_percentage) = update.gst_percentage {
            self.gst_percentage = gst_percentage;
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
    }
}

/// Filter parameters for listing procurements.
#[derive(Debug, Clone, Default)]
pub struct ProcurementFilter {
    pub kind: Option<ProcurementKind>,
    pub vendor_id: Option<String>,
    pub limit: i64,
    pub offset: u64,
}

impl ProcurementFilter {
    pub fn matches(&self, procurement: &Procurement) -> bool {
        self.kind.map_or(true, |kind| procurement.kind == kind)
            && self
                .vendor_id
                .as_ref()
                .map_or(true, |vendor_id| &procurement.vendor_id == vendor_id)
    }
}

/// Input for creating a procurement.
#[derive(Debug, Clone)]
pub struct CreateProcurement {
    pub kind: ProcurementKind,
    pub vendor_id: String,
    pub items: Vec<LineItem>,
    pub gst_percentage: Decimal,
    pub notes: Option<String>,
}

/// Input for editing a procurement.
#[derive(Debug, Clone, Default)]
pub struct UpdateProcurement {
    pub vendor_id: Option<String>,
    pub items: Option<Vec<LineItem>>,
    pub gst_percentage: Option<Decimal>,
    pub notes: Option<String>,
}
