use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{default_limit, ensure_amount, ensure_percentage};
use crate::models::{
    CreateLoan, CreateLoanPayment, LoanAccount, LoanFilter, LoanPayment, LoanStatus,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    #[validate(length(min = 1, max = 200, message = "lender_name must be 1-200 characters"))]
    pub lender_name: String,
    pub principal: Decimal,
    /// Annual rate in percent.
    #[serde(default)]
    pub interest_rate: Decimal,
    #[serde(default)]
    pub emi: Decimal,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl CreateLoanRequest {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        ensure_amount("principal", self.principal)?;
        ensure_percentage("interest_rate", self.interest_rate)?;
        ensure_amount("emi", self.emi)
    }
}

impl From<CreateLoanRequest> for CreateLoan {
    fn from(request: CreateLoanRequest) -> Self {
        CreateLoan {
            lender_name: request.lender_name,
            principal: request.principal,
            interest_rate: request.interest_rate,
            emi: request.emi,
            start_date: request.start_date,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordLoanPaymentRequest {
    #[serde(default)]
    pub interest_amount: Decimal,
    #[serde(default)]
    pub principal_amount: Decimal,
    /// Defaults to today (UTC) when omitted.
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl RecordLoanPaymentRequest {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        ensure_amount("interest_amount", self.interest_amount)?;
        ensure_amount("principal_amount", self.principal_amount)?;
        if self.interest_amount.is_zero() && self.principal_amount.is_zero() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "At least one of interest_amount or principal_amount must be greater than zero"
            )));
        }
        Ok(())
    }
}

impl From<RecordLoanPaymentRequest> for CreateLoanPayment {
    fn from(request: RecordLoanPaymentRequest) -> Self {
        CreateLoanPayment {
            interest_amount: request.interest_amount,
            principal_amount: request.principal_amount,
            payment_date: request
                .payment_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

impl ListLoansQuery {
    pub fn into_filter(self) -> Result<LoanFilter, AppError> {
        let status = match &self.status {
            Some(s) => Some(LoanStatus::parse(s).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Invalid status: {}. Must be one of: ACTIVE, CLOSED",
                    s
                ))
            })?),
            None => None,
        };

        Ok(LoanFilter {
            status,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub loan_id: String,
    pub lender_name: String,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub emi: Decimal,
    pub total_interest_paid: Decimal,
    pub total_principal_paid: Decimal,
    pub outstanding_amount: Decimal,
    pub status: LoanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub version: i64,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<LoanAccount> for LoanResponse {
    fn from(loan: LoanAccount) -> Self {
        Self {
            loan_id: loan.loan_id,
            lender_name: loan.lender_name,
            principal: loan.principal,
            interest_rate: loan.interest_rate,
            emi: loan.emi,
            total_interest_paid: loan.total_interest_paid,
            total_principal_paid: loan.total_principal_paid,
            outstanding_amount: loan.outstanding_amount,
            status: loan.status,
            start_date: loan.start_date,
            notes: loan.notes,
            version: loan.version,
            created_utc: loan.created_utc,
            updated_utc: loan.updated_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoanPaymentResponse {
    pub payment_id: String,
    pub loan_id: String,
    pub interest_amount: Decimal,
    pub principal_amount: Decimal,
    pub payment_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl From<LoanPayment> for LoanPaymentResponse {
    fn from(payment: LoanPayment) -> Self {
        Self {
            payment_id: payment.payment_id,
            loan_id: payment.loan_id,
            interest_amount: payment.interest_amount,
            principal_amount: payment.principal_amount,
            payment_date: payment.payment_date,
            notes: payment.notes,
            created_utc: payment.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListLoansResponse {
    pub loans: Vec<LoanResponse>,
    pub limit: i64,
    pub offset: u64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordLoanPaymentResponse {
    pub loan: LoanResponse,
    pub payment: LoanPaymentResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn oversized_principal_and_payments_are_rejected() {
        let loan: CreateLoanRequest = serde_json::from_value(serde_json::json!({
            "lender_name": "State Bank",
            "principal": "79228162514264337593543950335"
        }))
        .unwrap();
        assert!(matches!(loan.check_amounts(), Err(AppError::BadRequest(_))));

        let payment = RecordLoanPaymentRequest {
            interest_amount: dec!(0),
            principal_amount: Decimal::MAX,
            payment_date: None,
            notes: None,
        };
        assert!(matches!(
            payment.check_amounts(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn loan_response_carries_plain_timestamps() {
        let loan = LoanAccount::new(CreateLoan {
            lender_name: "State Bank".to_string(),
            principal: dec!(1000),
            interest_rate: dec!(9.5),
            emi: dec!(250),
            start_date: None,
            notes: None,
        });
        let created = loan.created_utc;

        let json = serde_json::to_value(LoanResponse::from(loan)).unwrap();
        assert_eq!(json["created_utc"], serde_json::json!(created));
        assert!(json["created_utc"].is_string());
    }
}
