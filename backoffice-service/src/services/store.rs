//! Persistence seam for backoffice records.
//!
//! Stores only move documents; they never compute derived fields. All writes
//! go through [`super::Records`], which normalizes first.

use crate::models::{
    LoanAccount, LoanFilter, LoanPayment, Procurement, ProcurementFilter, Sale, SaleFilter,
    SalePayment,
};
use async_trait::async_trait;
use service_core::error::AppError;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn insert_sale(&self, sale: &Sale) -> Result<(), AppError>;
    async fn find_sale(&self, sale_id: &str) -> Result<Option<Sale>, AppError>;
    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, AppError>;
    /// Replace the stored sale with the same id, but only while its stored
    /// `version` still equals `expected_version`. Returns `false` when no
    /// such document exists, either because it is gone or because another
    /// writer got there first.
    async fn replace_sale(&self, sale: &Sale, expected_version: i64) -> Result<bool, AppError>;
    async fn delete_sale(&self, sale_id: &str) -> Result<bool, AppError>;

    async fn insert_sale_payment(&self, payment: &SalePayment) -> Result<(), AppError>;
    async fn list_sale_payments(&self, sale_id: &str) -> Result<Vec<SalePayment>, AppError>;
    async fn delete_sale_payment(&self, payment_id: &str) -> Result<bool, AppError>;
    async fn delete_sale_payments(&self, sale_id: &str) -> Result<u64, AppError>;

    async fn insert_procurement(&self, procurement: &Procurement) -> Result<(), AppError>;
    async fn find_procurement(&self, procurement_id: &str)
        -> Result<Option<Procurement>, AppError>;
    async fn list_procurements(
        &self,
        filter: &ProcurementFilter,
    ) -> Result<Vec<Procurement>, AppError>;
    async fn replace_procurement(&self, procurement: &Procurement) -> Result<bool, AppError>;
    async fn delete_procurement(&self, procurement_id: &str) -> Result<bool, AppError>;

    async fn insert_loan(&self, loan: &LoanAccount) -> Result<(), AppError>;
    async fn find_loan(&self, loan_id: &str) -> Result<Option<LoanAccount>, AppError>;
    async fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<LoanAccount>, AppError>;
    /// Versioned replace, see [`RecordStore::replace_sale`].
    async fn replace_loan(&self, loan: &LoanAccount, expected_version: i64)
        -> Result<bool, AppError>;

    async fn insert_loan_payment(&self, payment: &LoanPayment) -> Result<(), AppError>;
    async fn list_loan_payments(&self, loan_id: &str) -> Result<Vec<LoanPayment>, AppError>;
    async fn delete_loan_payment(&self, payment_id: &str) -> Result<bool, AppError>;
}
