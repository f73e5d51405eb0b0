pub mod loans;
pub mod procurements;
pub mod sales;

pub use loans::{
    CreateLoanRequest, ListLoansQuery, ListLoansResponse, LoanPaymentResponse, LoanResponse,
    RecordLoanPaymentRequest, RecordLoanPaymentResponse,
};
pub use procurements::{
    CreateProcurementRequest, ListProcurementsQuery, ListProcurementsResponse,
    ProcurementResponse, UpdateProcurementRequest,
};
pub use sales::{
    ChangesResponse, CreateSaleRequest, LineItemRequest, ListSalesQuery, ListSalesResponse,
    PaymentsResponse, RecordSalePaymentRequest, RecordSalePaymentResponse, SalePaymentResponse,
    SaleResponse, UpdateSaleRequest,
};

use rust_decimal::Decimal;
use service_core::error::AppError;

pub(crate) fn default_limit() -> i64 {
    50
}

/// Largest accepted quantity, price, discount or payment amount. Keeps
/// `quantity * unit_price` summed over `MAX_ITEMS` lines well inside the
/// range of `Decimal`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Most line items accepted on a single sale or procurement.
pub const MAX_ITEMS: usize = 500;

/// Reject negative or oversized monetary inputs.
pub(crate) fn ensure_amount(field: &str, value: Decimal) -> Result<(), AppError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "{} cannot be negative",
            field
        )));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "{} cannot exceed {}",
            field,
            MAX_AMOUNT
        )));
    }
    Ok(())
}

pub(crate) fn ensure_percentage(field: &str, value: Decimal) -> Result<(), AppError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "{} must be between 0 and 100",
            field
        )));
    }
    Ok(())
}
