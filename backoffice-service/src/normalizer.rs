//! Derived financial state for sale, procurement and loan records.
//!
//! Every write path in [`crate::services::Records`] runs the matching
//! normalizer immediately before the record reaches the store, so persisted
//! records are always internally consistent no matter which inputs the caller
//! touched. Each function recomputes all derived fields from the
//! authoritative inputs and is idempotent.

use crate::models::{
    LineItem, LoanAccount, LoanStatus, PaymentStatus, Procurement, Sale, SaleStatus,
};
use rust_decimal::Decimal;

/// Recompute derived fields in place.
pub trait Normalize {
    fn normalize(&mut self);
}

impl Normalize for Sale {
    fn normalize(&mut self) {
        normalize_sale(self);
    }
}

impl Normalize for Procurement {
    fn normalize(&mut self) {
        normalize_procurement(self);
    }
}

impl Normalize for LoanAccount {
    fn normalize(&mut self) {
        normalize_loan(self);
    }
}

/// Set `amount = quantity * unit_price` on every item and return their sum.
///
/// Arithmetic saturates at the `Decimal` range instead of panicking; request
/// bounds keep real inputs far below it.
pub fn price_items(items: &mut [LineItem]) -> Decimal {
    items.iter_mut().fold(Decimal::ZERO, |subtotal, item| {
        item.amount = item.quantity.saturating_mul(item.unit_price);
        subtotal.saturating_add(item.amount)
    })
}

/// GST owed on `taxable` at `percentage` percent.
pub fn gst_on(taxable: Decimal, percentage: Decimal) -> Decimal {
    taxable.saturating_mul(percentage) / Decimal::ONE_HUNDRED
}

/// Sum `values`, or `None` if the total leaves the `Decimal` range.
pub fn checked_total<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
}

/// Classify payments received against a grand total.
///
/// Returns the payment status and the remaining amount, floored at zero.
pub fn classify_payment(total_paid: Decimal, grand_total: Decimal) -> (PaymentStatus, Decimal) {
    let remaining = grand_total.saturating_sub(total_paid);
    if total_paid.is_zero() {
        (PaymentStatus::Unpaid, remaining.max(Decimal::ZERO))
    } else if total_paid >= grand_total {
        (PaymentStatus::FullyPaid, Decimal::ZERO)
    } else {
        (PaymentStatus::PartiallyPaid, remaining)
    }
}

/// Normalize a sale: item amounts, totals, payment state and legacy mirrors.
///
/// The discount is applied as given; a discount above the subtotal yields a
/// negative grand total. `CANCELLED` is never replaced by a payment-derived
/// status.
pub fn normalize_sale(sale: &mut Sale) {
    sale.subtotal = price_items(&mut sale.items);
    sale.after_discount = sale.subtotal.saturating_sub(sale.discount);
    sale.gst_amount = gst_on(sale.after_discount, sale.gst_percentage);
    sale.grand_total = sale.after_discount.saturating_add(sale.gst_amount);

    let (payment_status, remaining) = classify_payment(sale.total_paid, sale.grand_total);
    sale.payment_status = payment_status;
    sale.remaining_amount = remaining;

    if !sale.is_cancelled() {
        sale.status = match payment_status {
            PaymentStatus::Unpaid => SaleStatus::Pending,
            PaymentStatus::PartiallyPaid => SaleStatus::PartiallyPaid,
            PaymentStatus::FullyPaid => SaleStatus::Completed,
        };
    }

    sale.paid_amount = sale.total_paid;
    sale.balance_amount = sale.remaining_amount;
}

/// Normalize a procurement: item amounts and tax totals. No discount applies.
pub fn normalize_procurement(procurement: &mut Procurement) {
    procurement.subtotal = price_items(&mut procurement.items);
    procurement.gst_amount = gst_on(procurement.subtotal, procurement.gst_percentage);
    procurement.grand_total = procurement.subtotal.saturating_add(procurement.gst_amount);
}

/// Normalize a loan: outstanding principal and open/closed status.
pub fn normalize_loan(loan: &mut LoanAccount) {
    loan.outstanding_amount = loan
        .principal
        .saturating_sub(loan.total_principal_paid)
        .max(Decimal::ZERO);
    loan.status = if loan.outstanding_amount.is_zero() {
        LoanStatus::Closed
    } else {
        LoanStatus::Active
    };
}
