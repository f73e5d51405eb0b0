//! In-process record store used by tests and local runs.

use super::store::RecordStore;
use crate::models::{
    LoanAccount, LoanFilter, LoanPayment, Procurement, ProcurementFilter, Sale, SaleFilter,
    SalePayment,
};
use async_trait::async_trait;
use dashmap::DashMap;
use service_core::error::AppError;

#[derive(Default)]
pub struct InMemoryStore {
    sales: DashMap<String, Sale>,
    sale_payments: DashMap<String, Vec<SalePayment>>,
    procurements: DashMap<String, Procurement>,
    loans: DashMap<String, LoanAccount>,
    loan_payments: DashMap<String, Vec<LoanPayment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, then the requested window.
fn page<T: Clone>(
    mut records: Vec<T>,
    created: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
    limit: i64,
    offset: u64,
) -> Vec<T> {
    records.sort_by_key(|r| std::cmp::Reverse(created(r)));
    records
        .into_iter()
        .skip(offset as usize)
        .take(limit.max(0) as usize)
        .collect()
}

fn insert_unique<T: Clone>(
    map: &DashMap<String, T>,
    id: &str,
    record: &T,
    kind: &str,
) -> Result<(), AppError> {
    match map.entry(id.to_string()) {
        dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::Conflict(anyhow::anyhow!(
            "{} {} already exists",
            kind,
            id
        ))),
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(record.clone());
            Ok(())
        }
    }
}

fn replace_existing<T: Clone>(map: &DashMap<String, T>, id: &str, record: &T) -> bool {
    match map.get_mut(id) {
        Some(mut existing) => {
            *existing = record.clone();
            true
        }
        None => false,
    }
}

/// Replace under the shard lock only if the stored version still matches.
fn replace_versioned<T: Clone>(
    map: &DashMap<String, T>,
    id: &str,
    record: &T,
    version_of: impl Fn(&T) -> i64,
    expected_version: i64,
) -> bool {
    match map.get_mut(id) {
        Some(mut existing) if version_of(&*existing) == expected_version => {
            *existing = record.clone();
            true
        }
        _ => false,
    }
}

/// Remove one payment by id from the per-record payment lists.
fn remove_payment<P>(
    map: &DashMap<String, Vec<P>>,
    payment_id: &str,
    id_of: impl Fn(&P) -> &str,
) -> bool {
    for mut payments in map.iter_mut() {
        if let Some(index) = payments.iter().position(|p| id_of(p) == payment_id) {
            payments.value_mut().remove(index);
            return true;
        }
    }
    false
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_sale(&self, sale: &Sale) -> Result<(), AppError> {
        insert_unique(&self.sales, &sale.sale_id, sale, "Sale")
    }

    async fn find_sale(&self, sale_id: &str) -> Result<Option<Sale>, AppError> {
        Ok(self.sales.get(sale_id).map(|s| s.clone()))
    }

    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, AppError> {
        let matching: Vec<Sale> = self
            .sales
            .iter()
            .filter(|s| filter.matches(s.value()))
            .map(|s| s.value().clone())
            .collect();
        Ok(page(matching, |s: &Sale| s.created_utc, filter.limit, filter.offset))
    }

    async fn replace_sale(&self, sale: &Sale, expected_version: i64) -> Result<bool, AppError> {
        Ok(replace_versioned(
            &self.sales,
            &sale.sale_id,
            sale,
            |s: &Sale| s.version,
            expected_version,
        ))
    }

    async fn delete_sale(&self, sale_id: &str) -> Result<bool, AppError> {
        Ok(self.sales.remove(sale_id).is_some())
    }

    async fn insert_sale_payment(&self, payment: &SalePayment) -> Result<(), AppError> {
        self.sale_payments
            .entry(payment.sale_id.clone())
            .or_default()
            .push(payment.clone());
        Ok(())
    }

    async fn list_sale_payments(&self, sale_id: &str) -> Result<Vec<SalePayment>, AppError> {
        Ok(self
            .sale_payments
            .get(sale_id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }

    async fn delete_sale_payment(&self, payment_id: &str) -> Result<bool, AppError> {
        Ok(remove_payment(&self.sale_payments, payment_id, |p: &SalePayment| {
            p.payment_id.as_str()
        }))
    }

    async fn delete_sale_payments(&self, sale_id: &str) -> Result<u64, AppError> {
        Ok(self
            .sale_payments
            .remove(sale_id)
            .map(|(_, payments)| payments.len() as u64)
            .unwrap_or(0))
    }

    async fn insert_procurement(&self, procurement: &Procurement) -> Result<(), AppError> {
        insert_unique(
            &self.procurements,
            &procurement.procurement_id,
            procurement,
            "Procurement",
        )
    }

    async fn find_procurement(
        &self,
        procurement_id: &str,
    ) -> Result<Option<Procurement>, AppError> {
        Ok(self.procurements.get(procurement_id).map(|p| p.clone()))
    }

    async fn list_procurements(
        &self,
        filter: &ProcurementFilter,
    ) -> Result<Vec<Procurement>, AppError> {
        let matching: Vec<Procurement> = self
            .procurements
            .iter()
            .filter(|p| filter.matches(p.value()))
            .map(|p| p.value().clone())
            .collect();
        Ok(page(
            matching,
            |p: &Procurement| p.created_utc,
            filter.limit,
            filter.offset,
        ))
    }

    async fn replace_procurement(&self, procurement: &Procurement) -> Result<bool, AppError> {
        Ok(replace_existing(
            &self.procurements,
            &procurement.procurement_id,
            procurement,
        ))
    }

    async fn delete_procurement(&self, procurement_id: &str) -> Result<bool, AppError> {
        Ok(self.procurements.remove(procurement_id).is_some())
    }

    async fn insert_loan(&self, loan: &LoanAccount) -> Result<(), AppError> {
        insert_unique(&self.loans, &loan.loan_id, loan, "Loan")
    }

    async fn find_loan(&self, loan_id: &str) -> Result<Option<LoanAccount>, AppError> {
        Ok(self.loans.get(loan_id).map(|l| l.clone()))
    }

    async fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<LoanAccount>, AppError> {
        let matching: Vec<LoanAccount> = self
            .loans
            .iter()
            .filter(|l| filter.matches(l.value()))
            .map(|l| l.value().clone())
            .collect();
        Ok(page(
            matching,
            |l: &LoanAccount| l.created_utc,
            filter.limit,
            filter.offset,
        ))
    }

    async fn replace_loan(
        &self,
        loan: &LoanAccount,
        expected_version: i64,
    ) -> Result<bool, AppError> {
        Ok(replace_versioned(
            &self.loans,
            &loan.loan_id,
            loan,
            |l: &LoanAccount| l.version,
            expected_version,
        ))
    }

    async fn insert_loan_payment(&self, payment: &LoanPayment) -> Result<(), AppError> {
        self.loan_payments
            .entry(payment.loan_id.clone())
            .or_default()
            .push(payment.clone());
        Ok(())
    }

    async fn list_loan_payments(&self, loan_id: &str) -> Result<Vec<LoanPayment>, AppError> {
        Ok(self
            .loan_payments
            .get(loan_id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }

    async fn delete_loan_payment(&self, payment_id: &str) -> Result<bool, AppError> {
        Ok(remove_payment(&self.loan_payments, payment_id, |p: &LoanPayment| {
            p.payment_id.as_str()
        }))
    }
}
