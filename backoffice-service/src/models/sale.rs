//! Sale model for backoffice-service.

use super::LineItem;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sale lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Pending,
    PartiallyPaid,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::PartiallyPaid => "PARTIALLY_PAID",
            SaleStatus::Completed => "COMPLETED",
            SaleStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(SaleStatus::Pending),
            "PARTIALLY_PAID" => Some(SaleStatus::PartiallyPaid),
            "COMPLETED" => Some(SaleStatus::Completed),
            "CANCELLED" => Some(SaleStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment classification derived from `total_paid` against `grand_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    FullyPaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::PartiallyPaid => "PARTIALLY_PAID",
            PaymentStatus::FullyPaid => "FULLY_PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UNPAID" => Some(PaymentStatus::Unpaid),
            "PARTIALLY_PAID" => Some(PaymentStatus::PartiallyPaid),
            "FULLY_PAID" => Some(PaymentStatus::FullyPaid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a sale payment was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    BankTransfer,
    Cheque,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CASH" => Some(PaymentMethod::Cash),
            "UPI" => Some(PaymentMethod::Upi),
            "CARD" => Some(PaymentMethod::Card),
            "BANK_TRANSFER" => Some(PaymentMethod::BankTransfer),
            "CHEQUE" => Some(PaymentMethod::Cheque),
            "OTHER" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client sale order.
///
/// Everything below `gst_percentage` is derived state; see
/// [`crate::normalizer::normalize_sale`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub sale_id: String,
    pub client_id: String,
    pub items: Vec<LineItem>,
    pub discount: Decimal,
    pub gst_percentage: Decimal,
    pub subtotal: Decimal,
    pub after_discount: Decimal,
    pub gst_amount: Decimal,
    pub grand_total: Decimal,
    pub total_paid: Decimal,
    pub remaining_amount: Decimal,
    /// Legacy mirror of `total_paid`.
    pub paid_amount: Decimal,
    /// Legacy mirror of `remaining_amount`.
    pub balance_amount: Decimal,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Bumped on every write; replaces only succeed against the version read.
    #[serde(default)]
    pub version: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_utc: DateTime<Utc>,
}

impl Sale {
    /// Build a fresh sale with no payments. Derived fields are zero until the
    /// record is normalized.
    pub fn new(input: CreateSale) -> Self {
        let now = Utc::now();
        Self {
            sale_id: Uuid::new_v4().to_string(),
            client_id: input.client_id,
            items: input.items,
            discount: input.discount,
            gst_percentage: input.gst_percentage,
            subtotal: Decimal::ZERO,
            after_discount: Decimal::ZERO,
            gst_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            remaining_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            balance_amount: Decimal::ZERO,
            status: SaleStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            notes: input.notes,
            version: 0,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SaleStatus::Cancelled
    }

    /// Overwrite the authoritative inputs present in `update`.
    pub fn apply_update(&mut self, update: &UpdateSale) {
        if let Some(client_id) = &update.client_id {
            self.client_id = client_id.clone();
        }
        if let Some(items) = &update.items {
            self.items = items.clone();
        }
        if let Some(discount) = update.discount {
            self.discount = discount;
        }
        if let Some(gst_percentage) = update.gst_percentage {
            self.gst_percentage = gst_percentage;
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
    }
}

/// Payment received against a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalePayment {
    pub payment_id: String,
    pub sale_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub payment_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
}

impl SalePayment {
    pub fn new(sale_id: &str, input: CreateSalePayment) -> Self {
        Self {
            payment_id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            amount: input.amount,
            payment_method: input.payment_method,
            payment_reference: input.payment_reference,
            payment_date: input.payment_date,
            notes: input.notes,
            created_utc: Utc::now(),
        }
    }
}

/// Filter parameters for listing sales.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub client_id: Option<String>,
    pub status: Option<SaleStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub limit: i64,
    pub offset: u64,
}

impl SaleFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        self.client_id
            .as_ref()
            .map_or(true, |client_id| &sale.client_id == client_id)
            && self.status.map_or(true, |status| sale.status == status)
            && self
                .payment_status
                .map_or(true, |payment_status| sale.payment_status == payment_status)
    }
}

/// Input for creating a sale.
#[derive(Debug, Clone)]
pub struct CreateSale {
    pub client_id: String,
    pub items: Vec<LineItem>,
    pub discount: Decimal,
    pub gst_percentage: Decimal,
    pub notes: Option<String>,
}

/// Input for editing a sale. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateSale {
    pub client_id: Option<String>,
    pub items: Option<Vec<LineItem>>,
    pub discount: Option<Decimal>,
    pub gst_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for recording a payment against a sale.
#[derive(Debug, Clone)]
pub struct CreateSalePayment {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
}
