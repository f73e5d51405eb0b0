//! Field-level change detection between two versions of a sale.

use super::Sale;
use serde::Serialize;
use serde_json::{json, Value};

/// Every comparable field of a [`Sale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleField {
    ClientId,
    Items,
    Discount,
    GstPercentage,
    Notes,
    Subtotal,
    AfterDiscount,
    GstAmount,
    GrandTotal,
    TotalPaid,
    RemainingAmount,
    Status,
    PaymentStatus,
}

impl SaleField {
    pub const ALL: [SaleField; 13] = [
        SaleField::ClientId,
        SaleField::Items,
        SaleField::Discount,
        SaleField::GstPercentage,
        SaleField::Notes,
        SaleField::Subtotal,
        SaleField::AfterDiscount,
        SaleField::GstAmount,
        SaleField::GrandTotal,
        SaleField::TotalPaid,
        SaleField::RemainingAmount,
        SaleField::Status,
        SaleField::PaymentStatus,
    ];

    /// Read this field from a sale as a comparable JSON value.
    pub fn value_of(&self, sale: &Sale) -> Value {
        match self {
            SaleField::ClientId => json!(sale.client_id),
            SaleField::Items => json!(sale.items),
            SaleField::Discount => json!(sale.discount),
            SaleField::GstPercentage => json!(sale.gst_percentage),
            SaleField::Notes => json!(sale.notes),
            SaleField::Subtotal => json!(sale.subtotal),
            SaleField::AfterDiscount => json!(sale.after_discount),
            SaleField::GstAmount => json!(sale.gst_amount),
            SaleField::GrandTotal => json!(sale.grand_total),
            SaleField::TotalPaid => json!(sale.total_paid),
            SaleField::RemainingAmount => json!(sale.remaining_amount),
            SaleField::Status => json!(sale.status),
            SaleField::PaymentStatus => json!(sale.payment_status),
        }
    }

    fn differs(&self, before: &Sale, after: &Sale) -> bool {
        // Decimals compare numerically so "100" and "100.00" are the same value.
        match self {
            SaleField::ClientId => before.client_id != after.client_id,
            SaleField::Items => before.items != after.items,
            SaleField::Discount => before.discount != after.discount,
            SaleField::GstPercentage => before.gst_percentage != after.gst_percentage,
            SaleField::Notes => before.notes != after.notes,
            SaleField::Subtotal => before.subtotal != after.subtotal,
            SaleField::AfterDiscount => before.after_discount != after.after_discount,
            SaleField::GstAmount => before.gst_amount != after.gst_amount,
            SaleField::GrandTotal => before.grand_total != after.grand_total,
            SaleField::TotalPaid => before.total_paid != after.total_paid,
            SaleField::RemainingAmount => before.remaining_amount != after.remaining_amount,
            SaleField::Status => before.status != after.status,
            SaleField::PaymentStatus => before.payment_status != after.payment_status,
        }
    }
}

/// A single detected difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: SaleField,
    pub before: Value,
    pub after: Value,
}

/// List the fields that differ between `before` and `after`, in
/// [`SaleField::ALL`] order.
pub fn diff_sales(before: &Sale, after: &Sale) -> Vec<FieldChange> {
    SaleField::ALL
        .iter()
        .filter(|field| field.differs(before, after))
        .map(|field| FieldChange {
            field: *field,
            before: field.value_of(before),
            after: field.value_of(after),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateSale, LineItem};
    use rust_decimal::Decimal;

    fn sale() -> Sale {
        Sale::new(CreateSale {
            client_id: "client-1".to_string(),
            items: vec![LineItem::new("chair", None, Decimal::TWO, Decimal::ONE_HUNDRED)],
            discount: Decimal::ZERO,
            gst_percentage: Decimal::ZERO,
            notes: None,
        })
    }

    #[test]
    fn identical_sales_have_no_changes() {
        let a = sale();
        let b = a.clone();
        assert!(diff_sales(&a, &b).is_empty());
    }

    #[test]
    fn reports_only_changed_fields() {
        let before = sale();
        let mut after = before.clone();
        after.discount = Decimal::TEN;
        after.notes = Some("rush order".to_string());

        let changes = diff_sales(&before, &after);
        let fields: Vec<SaleField> = changes.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![SaleField::Discount, SaleField::Notes]);
        assert_eq!(changes[1].before, Value::Null);
        assert_eq!(changes[1].after, json!("rush order"));
    }

    #[test]
    fn rescaled_decimal_is_not_a_change() {
        let before = sale();
        let mut after = before.clone();
        after.discount = Decimal::new(0, 2);
        assert!(diff_sales(&before, &after).is_empty());
    }
}
