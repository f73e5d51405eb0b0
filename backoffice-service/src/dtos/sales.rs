use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{default_limit, ensure_amount, ensure_percentage, MAX_ITEMS};
use crate::models::{
    CreateSale, CreateSalePayment, FieldChange, LineItem, PaymentMethod, PaymentStatus, Sale,
    SaleFilter, SalePayment, SaleStatus, UpdateSale,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct LineItemRequest {
    #[validate(length(min = 1, message = "item_id cannot be empty"))]
    pub item_id: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItemRequest {
    fn check_amounts(&self) -> Result<(), AppError> {
        ensure_amount("quantity", self.quantity)?;
        ensure_amount("unit_price", self.unit_price)
    }
}

impl From<LineItemRequest> for LineItem {
    fn from(item: LineItemRequest) -> Self {
        LineItem::new(item.item_id, item.description, item.quantity, item.unit_price)
    }
}

/// Field rules and amount checks for every line item.
pub(crate) fn check_items(items: &[LineItemRequest]) -> Result<(), AppError> {
    if items.len() > MAX_ITEMS {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "At most {} items are allowed per record",
            MAX_ITEMS
        )));
    }
    for item in items {
        item.validate()?;
        item.check_amounts()?;
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleRequest {
    #[validate(length(min = 1, message = "client_id cannot be empty"))]
    pub client_id: String,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub gst_percentage: Decimal,
    pub notes: Option<String>,
}

impl CreateSaleRequest {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        check_items(&self.items)?;
        ensure_amount("discount", self.discount)?;
        ensure_percentage("gst_percentage", self.gst_percentage)
    }
}

impl From<CreateSaleRequest> for CreateSale {
    fn from(request: CreateSaleRequest) -> Self {
        CreateSale {
            client_id: request.client_id,
            items: request.items.into_iter().map(LineItem::from).collect(),
            discount: request.discount,
            gst_percentage: request.gst_percentage,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSaleRequest {
    #[validate(length(min = 1, message = "client_id cannot be empty"))]
    pub client_id: Option<String>,
    pub items: Option<Vec<LineItemRequest>>,
    pub discount: Option<Decimal>,
    pub gst_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

impl UpdateSaleRequest {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        if let Some(items) = &self.items {
            check_items(items)?;
        }
        if let Some(discount) = self.discount {
            ensure_amount("discount", discount)?;
        }
        if let Some(gst_percentage) = self.gst_percentage {
            ensure_percentage("gst_percentage", gst_percentage)?;
        }
        Ok(())
    }
}

impl From<UpdateSaleRequest> for UpdateSale {
    fn from(request: UpdateSaleRequest) -> Self {
        UpdateSale {
            client_id: request.client_id,
            items: request
                .items
                .map(|items| items.into_iter().map(LineItem::from).collect()),
            discount: request.discount,
            gst_percentage: request.gst_percentage,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordSalePaymentRequest {
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    /// Defaults to today (UTC) when omitted.
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl RecordSalePaymentRequest {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        ensure_amount("amount", self.amount)?;
        if self.amount.is_zero() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "amount must be greater than zero"
            )));
        }
        Ok(())
    }
}

impl TryFrom<RecordSalePaymentRequest> for CreateSalePayment {
    type Error = AppError;

    fn try_from(request: RecordSalePaymentRequest) -> Result<Self, Self::Error> {
        let payment_method = PaymentMethod::parse(&request.payment_method).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Invalid payment_method: {}. Must be one of: CASH, UPI, CARD, BANK_TRANSFER, CHEQUE, OTHER",
                request.payment_method
            ))
        })?;

        Ok(CreateSalePayment {
            amount: request.amount,
            payment_method,
            payment_reference: request.payment_reference,
            payment_date: request
                .payment_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            notes: request.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub client_id: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

impl ListSalesQuery {
    pub fn into_filter(self) -> Result<SaleFilter, AppError> {
        let status = match &self.status {
            Some(s) => Some(SaleStatus::parse(s).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Invalid status: {}. Must be one of: PENDING, PARTIALLY_PAID, COMPLETED, CANCELLED",
                    s
                ))
            })?),
            None => None,
        };

        let payment_status = match &self.payment_status {
            Some(s) => Some(PaymentStatus::parse(s).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Invalid payment_status: {}. Must be one of: UNPAID, PARTIALLY_PAID, FULLY_PAID",
                    s
                ))
            })?),
            None => None,
        };

        Ok(SaleFilter {
            client_id: self.client_id,
            status,
            payment_status,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
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
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub version: i64,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        Self {
            sale_id: sale.sale_id,
            client_id: sale.client_id,
            items: sale.items,
            discount: sale.discount,
            gst_percentage: sale.gst_percentage,
            subtotal: sale.subtotal,
            after_discount: sale.after_discount,
            gst_amount: sale.gst_amount,
            grand_total: sale.grand_total,
            total_paid: sale.total_paid,
            remaining_amount: sale.remaining_amount,
            paid_amount: sale.paid_amount,
            balance_amount: sale.balance_amount,
            status: sale.status,
            payment_status: sale.payment_status,
            notes: sale.notes,
            version: sale.version,
            created_utc: sale.created_utc,
            updated_utc: sale.updated_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SalePaymentResponse {
    pub payment_id: String,
    pub sale_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub payment_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl From<SalePayment> for SalePaymentResponse {
    fn from(payment: SalePayment) -> Self {
        Self {
            payment_id: payment.payment_id,
            sale_id: payment.sale_id,
            amount: payment.amount,
            payment_method: payment.payment_method,
            payment_reference: payment.payment_reference,
            payment_date: payment.payment_date,
            notes: payment.notes,
            created_utc: payment.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListSalesResponse {
    pub sales: Vec<SaleResponse>,
    pub limit: i64,
    pub offset: u64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordSalePaymentResponse {
    pub sale: SaleResponse,
    pub payment: SalePaymentResponse,
}

#[derive(Debug, Serialize)]
pub struct PaymentsResponse<T> {
    pub payments: Vec<T>,
    pub count: usize,
}

impl<T> PaymentsResponse<T> {
    pub fn new<P: Into<T>>(payments: Vec<P>) -> Self {
        let payments: Vec<T> = payments.into_iter().map(Into::into).collect();
        let count = payments.len();
        Self { payments, count }
    }
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub sale_id: String,
    pub changes: Vec<FieldChange>,
    pub has_changes: bool,
    pub generated_utc: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_request_defaults_discount_and_gst() {
        let request: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "client_id": "client-1",
            "items": [{ "item_id": "a", "quantity": "2", "unit_price": "500" }]
        }))
        .unwrap();

        assert!(request.validate().is_ok());
        assert_eq!(request.discount, Decimal::ZERO);

        let sale: CreateSale = request.into();
        assert_eq!(sale.items[0].quantity, dec!(2));
    }

    #[test]
    fn negative_unit_price_is_rejected() {
        let request: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "client_id": "client-1",
            "items": [{ "item_id": "a", "quantity": "1", "unit_price": "-5" }]
        }))
        .unwrap();

        assert!(request.check_amounts().is_err());
    }

    #[test]
    fn empty_item_id_is_a_validation_error() {
        let request: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "client_id": "client-1",
            "items": [{ "item_id": "", "quantity": "1", "unit_price": "5" }]
        }))
        .unwrap();

        assert!(request.validate().is_ok());
        assert!(matches!(
            request.check_amounts(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn unknown_status_filter_is_a_bad_request() {
        let query = ListSalesQuery {
            client_id: None,
            status: Some("SHIPPED".to_string()),
            payment_status: None,
            limit: 50,
            offset: 0,
        };
        assert!(matches!(query.into_filter(), Err(AppError::BadRequest(_))));
    }

    fn payment_request(amount: Decimal, payment_method: &str) -> RecordSalePaymentRequest {
        RecordSalePaymentRequest {
            amount,
            payment_method: payment_method.to_string(),
            payment_reference: None,
            payment_date: None,
            notes: None,
        }
    }

    #[test]
    fn zero_payment_is_rejected() {
        assert!(payment_request(Decimal::ZERO, "cash").check_amounts().is_err());
    }

    #[test]
    fn payment_method_must_be_known() {
        let payment = CreateSalePayment::try_from(payment_request(dec!(10), "bank_transfer"))
            .unwrap();
        assert_eq!(payment.payment_method, PaymentMethod::BankTransfer);

        let unknown = CreateSalePayment::try_from(payment_request(dec!(10), "bitcoin"));
        assert!(matches!(unknown, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let request: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "client_id": "client-1",
            "items": [{
                "item_id": "a",
                "quantity": "79228162514264337593543950335",
                "unit_price": "2"
            }]
        }))
        .unwrap();
        assert!(matches!(
            request.check_amounts(),
            Err(AppError::BadRequest(_))
        ));

        let payment = payment_request(Decimal::MAX, "cash");
        assert!(matches!(
            payment.check_amounts(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn item_count_is_bounded() {
        let items: Vec<_> = (0..=MAX_ITEMS)
            .map(|i| serde_json::json!({ "item_id": format!("item-{i}"), "quantity": "1", "unit_price": "1" }))
            .collect();
        let request: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "client_id": "client-1",
            "items": items
        }))
        .unwrap();
        assert!(matches!(
            request.check_amounts(),
            Err(AppError::BadRequest(_))
        ));
    }
}
