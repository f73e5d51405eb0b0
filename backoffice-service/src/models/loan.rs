//! Loan account model for backoffice-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Loan account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Closed,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(LoanStatus::Active),
            "CLOSED" => Some(LoanStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowing account with running repayment totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAccount {
    pub loan_id: String,
    pub lender_name: String,
    pub principal: Decimal,
    /// Annual rate, in percent.
    pub interest_rate: Decimal,
    pub emi: Decimal,
    pub total_interest_paid: Decimal,
    pub total_principal_paid: Decimal,
    pub outstanding_amount: Decimal,
    pub status: LoanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
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

impl LoanAccount {
    pub fn new(input: CreateLoan) -> Self {
        let now = Utc::now();
        Self {
            loan_id: Uuid::new_v4().to_string(),
            lender_name: input.lender_name,
            principal: input.principal,
            interest_rate: input.interest_rate,
            emi: input.emi,
            total_interest_paid: Decimal::ZERO,
            total_principal_paid: Decimal::ZERO,
            outstanding_amount: input.principal,
            status: LoanStatus::Active,
            start_date: input.start_date,
            notes: input.notes,
            version: 0,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == LoanStatus::Closed
    }
}

/// Interest/principal repayment linked to a loan account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    pub payment_id: String,
    pub loan_id: String,
    pub interest_amount: Decimal,
    pub principal_amount: Decimal,
    pub payment_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
}

impl LoanPayment {
    pub fn new(loan_id: &str, input: CreateLoanPayment) -> Self {
        Self {
            payment_id: Uuid::new_v4().to_string(),
            loan_id: loan_id.to_string(),
            interest_amount: input.interest_amount,
            principal_amount: input.principal_amount,
            payment_date: input.payment_date,
            notes: input.notes,
            created_utc: Utc::now(),
        }
    }
}

/// Filter parameters for listing loans.
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    pub status: Option<LoanStatus>,
    pub limit: i64,
    pub offset: u64,
}

impl LoanFilter {
    pub fn matches(&self, loan: &LoanAccount) -> bool {
        self.status.map_or(true, |status| loan.status == status)
    }
}

/// Input for opening a loan account.
#[derive(Debug, Clone)]
pub struct CreateLoan {
    pub lender_name: String,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub emi: Decimal,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Input for recording a loan repayment.
#[derive(Debug, Clone)]
pub struct CreateLoanPayment {
    pub interest_amount: Decimal,
    pub principal_amount: Decimal,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
}
