//! Record operations for sales, procurements and loans.
//!
//! Every write goes through here so that derived fields are recomputed by the
//! normalizer immediately before the store sees the document.
//!
//! Sales and loans are written with a versioned compare-and-swap: each write
//! re-reads the record, applies its change, and replaces only if nobody else
//! wrote in between, retrying otherwise. Payment totals are recomputed from the
//! stored payment records on every settle, so concurrent payments converge on
//! the sum of what was actually recorded.

use super::metrics::{record_payment, record_write};
use super::store::RecordStore;
use crate::models::{
    diff_sales, CreateLoan, CreateLoanPayment, CreateProcurement, CreateSale, CreateSalePayment,
    FieldChange, LoanAccount, LoanFilter, LoanPayment, Procurement, ProcurementFilter, Sale,
    SaleFilter, SalePayment, SaleStatus, UpdateProcurement, UpdateSale,
};
use crate::normalizer::{checked_total, Normalize};
use chrono::Utc;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const MAX_PAGE_SIZE: i64 = 100;

/// Versioned writes give up with `Conflict` after this many lost races.
pub const MAX_WRITE_ATTEMPTS: usize = 32;

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

fn write_conflict(kind: &str, id: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!(
        "{} {} is being modified concurrently, retry the request",
        kind,
        id
    ))
}

fn out_of_range(kind: &str, id: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Total payments for {} {} exceed the supported range",
        kind,
        id
    ))
}

#[derive(Clone)]
pub struct Records {
    store: Arc<dyn RecordStore>,
}

impl Records {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.store.health_check().await
    }

    // Sales

    #[instrument(skip(self, input), fields(client_id = %input.client_id))]
    pub async fn create_sale(&self, input: CreateSale) -> Result<Sale, AppError> {
        let mut sale = Sale::new(input);
        sale.normalize();
        self.store.insert_sale(&sale).await?;

        record_write("sale", "create", sale.status.as_str());
        info!(
            sale_id = %sale.sale_id,
            grand_total = %sale.grand_total,
            "Sale created"
        );
        Ok(sale)
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, sale_id: &str) -> Result<Sale, AppError> {
        self.store
            .find_sale(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale not found: {}", sale_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_sales(&self, mut filter: SaleFilter) -> Result<Vec<Sale>, AppError> {
        filter.limit = clamp_limit(filter.limit);
        self.store.list_sales(&filter).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_sale(&self, sale_id: &str, update: UpdateSale) -> Result<Sale, AppError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut sale = self.editable_sale(sale_id).await?;
            sale.apply_update(&update);

            if self.try_replace_sale(&mut sale).await? {
                record_write("sale", "update", sale.status.as_str());
                info!(sale_id = %sale.sale_id, grand_total = %sale.grand_total, "Sale updated");
                return Ok(sale);
            }
        }
        Err(write_conflict("Sale", sale_id))
    }

    /// Changes `update` would make to the stored sale, derived fields included.
    /// Nothing is persisted. Rejected exactly when the update itself would be.
    #[instrument(skip(self, update))]
    pub async fn preview_sale_update(
        &self,
        sale_id: &str,
        update: UpdateSale,
    ) -> Result<Vec<FieldChange>, AppError> {
        let before = self.editable_sale(sale_id).await?;
        let mut after = before.clone();
        after.apply_update(&update);
        after.normalize();
        Ok(diff_sales(&before, &after))
    }

    #[instrument(skip(self, input), fields(amount = %input.amount))]
    pub async fn record_sale_payment(
        &self,
        sale_id: &str,
        input: CreateSalePayment,
    ) -> Result<(Sale, SalePayment), AppError> {
        let sale = self.get_sale(sale_id).await?;
        if sale.is_cancelled() {
            return Err(cancelled_sale(sale_id, "cannot accept payments"));
        }

        let payment = SalePayment::new(sale_id, input);
        self.store.insert_sale_payment(&payment).await?;

        let sale = match self.settle_sale(sale_id, true).await {
            Ok(sale) => sale,
            Err(e) => {
                self.discard_sale_payment(&payment, &e).await;
                return Err(e);
            }
        };

        if sale.total_paid > sale.grand_total {
            warn!(
                sale_id = %sale.sale_id,
                total_paid = %sale.total_paid,
                grand_total = %sale.grand_total,
                "Sale overpaid"
            );
        }

        record_payment("sale", payment.payment_method.as_str());
        record_write("sale", "payment", sale.status.as_str());
        info!(
            sale_id = %sale.sale_id,
            payment_id = %payment.payment_id,
            payment_status = %sale.payment_status,
            remaining_amount = %sale.remaining_amount,
            "Sale payment recorded"
        );
        Ok((sale, payment))
    }

    #[instrument(skip(self))]
    pub async fn cancel_sale(&self, sale_id: &str) -> Result<Sale, AppError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut sale = self.get_sale(sale_id).await?;
            if sale.is_cancelled() {
                return Ok(sale);
            }

            sale.status = SaleStatus::Cancelled;
            if self.try_replace_sale(&mut sale).await? {
                record_write("sale", "cancel", sale.status.as_str());
                info!(sale_id = %sale.sale_id, "Sale cancelled");
                return Ok(sale);
            }
        }
        Err(write_conflict("Sale", sale_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_sale(&self, sale_id: &str) -> Result<(), AppError> {
        if !self.store.delete_sale(sale_id).await? {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Sale not found: {}",
                sale_id
            )));
        }
        let removed = self.store.delete_sale_payments(sale_id).await?;

        info!(sale_id = %sale_id, payments_removed = removed, "Sale deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_sale_payments(&self, sale_id: &str) -> Result<Vec<SalePayment>, AppError> {
        self.get_sale(sale_id).await?;
        self.store.list_sale_payments(sale_id).await
    }

    async fn editable_sale(&self, sale_id: &str) -> Result<Sale, AppError> {
        let sale = self.get_sale(sale_id).await?;
        if sale.is_cancelled() {
            return Err(cancelled_sale(sale_id, "cannot be edited"));
        }
        Ok(sale)
    }

    /// Set `total_paid` from the stored payment records and write the sale.
    async fn settle_sale(&self, sale_id: &str, reject_cancelled: bool) -> Result<Sale, AppError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut sale = self.get_sale(sale_id).await?;
            if reject_cancelled && sale.is_cancelled() {
                return Err(cancelled_sale(sale_id, "cannot accept payments"));
            }

            let payments = self.store.list_sale_payments(sale_id).await?;
            sale.total_paid = checked_total(payments.iter().map(|p| p.amount))
                .ok_or_else(|| out_of_range("sale", sale_id))?;

            if self.try_replace_sale(&mut sale).await? {
                return Ok(sale);
            }
        }
        Err(write_conflict("Sale", sale_id))
    }

    /// Undo a payment whose sale could not be settled. Another writer may
    /// already have counted it, so the sale is settled once more without it.
    async fn discard_sale_payment(&self, payment: &SalePayment, cause: &AppError) {
        warn!(
            sale_id = %payment.sale_id,
            payment_id = %payment.payment_id,
            error = %cause,
            "Discarding unsettled sale payment"
        );
        if let Err(e) = self.store.delete_sale_payment(&payment.payment_id).await {
            error!(payment_id = %payment.payment_id, error = %e, "Failed to discard sale payment");
            return;
        }
        if matches!(cause, AppError::NotFound(_)) {
            return;
        }
        if let Err(e) = self.settle_sale(&payment.sale_id, false).await {
            warn!(sale_id = %payment.sale_id, error = %e, "Failed to resettle sale");
        }
    }

    /// Normalize, bump the version and replace. `Ok(false)` means another
    /// writer won the race and the caller should re-read.
    async fn try_replace_sale(&self, sale: &mut Sale) -> Result<bool, AppError> {
        let expected_version = sale.version;
        sale.normalize();
        sale.version = expected_version + 1;
        sale.updated_utc = Utc::now();

        if self.store.replace_sale(sale, expected_version).await? {
            return Ok(true);
        }
        match self.store.find_sale(&sale.sale_id).await? {
            Some(_) => Ok(false),
            None => Err(AppError::NotFound(anyhow::anyhow!(
                "Sale not found: {}",
                sale.sale_id
            ))),
        }
    }

    // Procurements

    #[instrument(skip(self, input), fields(vendor_id = %input.vendor_id, kind = %input.kind))]
    pub async fn create_procurement(
        &self,
        input: CreateProcurement,
    ) -> Result<Procurement, AppError> {
        let mut procurement = Procurement::new(input);
        procurement.normalize();
        self.store.insert_procurement(&procurement).await?;

        record_write("procurement", "create", procurement.kind.as_str());
        info!(
            procurement_id = %procurement.procurement_id,
            grand_total = %procurement.grand_total,
            "Procurement created"
        );
        Ok(procurement)
    }

    #[instrument(skip(self))]
    pub async fn get_procurement(&self, procurement_id: &str) -> Result<Procurement, AppError> {
        self.store
            .find_procurement(procurement_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Procurement not found: {}",
                    procurement_id
                ))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_procurements(
        &self,
        mut filter: ProcurementFilter,
    ) -> Result<Vec<Procurement>, AppError> {
        filter.limit = clamp_limit(filter.limit);
        self.store.list_procurements(&filter).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_procurement(
        &self,
        procurement_id: &str,
        update: UpdateProcurement,
    ) -> Result<Procurement, AppError> {
        let mut procurement = self.get_procurement(procurement_id).await?;
        procurement.apply_update(&update);
        procurement.normalize();
        procurement.updated_utc = Utc::now();

        if !self.store.replace_procurement(&procurement).await? {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Procurement not found: {}",
                procurement_id
            )));
        }

        record_write("procurement", "update", procurement.kind.as_str());
        info!(
            procurement_id = %procurement.procurement_id,
            grand_total = %procurement.grand_total,
            "Procurement updated"
        );
        Ok(procurement)
    }

    #[instrument(skip(self))]
    pub async fn delete_procurement(&self, procurement_id: &str) -> Result<(), AppError> {
        if !self.store.delete_procurement(procurement_id).await? {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Procurement not found: {}",
                procurement_id
            )));
        }
        info!(procurement_id = %procurement_id, "Procurement deleted");
        Ok(())
    }


    // Loans

    #[instrument(skip(self, input), fields(lender_name = %input.lender_name))]
    pub async fn create_loan(&self, input: CreateLoan) -> Result<LoanAccount, AppError> {
        let mut loan = LoanAccount::new(input);
        loan.normalize();
        self.store.insert_loan(&loan).await?;

        record_write("loan", "create", loan.status.as_str());
        info!(loan_id = %loan.loan_id, principal = %loan.principal, "Loan account created");
        Ok(loan)
    }

    #[instrument(skip(self))]
    pub async fn get_loan(&self, loan_id: &str) -> Result<LoanAccount, AppError> {
        self.store
            .find_loan(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Loan not found: {}", loan_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_loans(&self, mut filter: LoanFilter) -> Result<Vec<LoanAccount>, AppError> {
        filter.limit = clamp_limit(filter.limit);
        self.store.list_loans(&filter).await
    }

    #[instrument(skip(self, input))]
    pub async fn record_loan_payment(
        &self,
        loan_id: &str,
        input: CreateLoanPayment,
    ) -> Result<(LoanAccount, LoanPayment), AppError> {
        let loan = self.get_loan(loan_id).await?;
        if loan.is_closed() {
            return Err(closed_loan(loan_id));
        }

        let payment = LoanPayment::new(loan_id, input);
        self.store.insert_loan_payment(&payment).await?;

        let loan = match self.settle_loan(loan_id, true).await {
            Ok(loan) => loan,
            Err(e) => {
                self.discard_loan_payment(&payment, &e).await;
                return Err(e);
            }
        };

        record_payment("loan", "emi");
        record_write("loan", "payment", loan.status.as_str());
        info!(
            loan_id = %loan.loan_id,
            payment_id = %payment.payment_id,
            outstanding_amount = %loan.outstanding_amount,
            status = %loan.status,
            "Loan payment recorded"
        );
        Ok((loan, payment))
    }

    #[instrument(skip(self))]
    pub async fn list_loan_payments(&self, loan_id: &str) -> Result<Vec<LoanPayment>, AppError> {
        self.get_loan(loan_id).await?;
        self.store.list_loan_payments(loan_id).await
    }

    /// Set the repayment totals from the stored payment records and write the loan.
    async fn settle_loan(&self, loan_id: &str, reject_closed: bool) -> Result<LoanAccount, AppError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut loan = self.get_loan(loan_id).await?;
            if reject_closed && loan.is_closed() {
                return Err(closed_loan(loan_id));
            }

            let payments = self.store.list_loan_payments(loan_id).await?;
            loan.total_interest_paid = checked_total(payments.iter().map(|p| p.interest_amount))
                .ok_or_else(|| out_of_range("loan", loan_id))?;
            loan.total_principal_paid = checked_total(payments.iter().map(|p| p.principal_amount))
                .ok_or_else(|| out_of_range("loan", loan_id))?;

            if self.try_replace_loan(&mut loan).await? {
                return Ok(loan);
            }
        }
        Err(write_conflict("Loan", loan_id))
    }

    async fn discard_loan_payment(&self, payment: &LoanPayment, cause: &AppError) {
        warn!(
            loan_id = %payment.loan_id,
            payment_id = %payment.payment_id,
            error = %cause,
            "Discarding unsettled loan payment"
        );
        if let Err(e) = self.store.delete_loan_payment(&payment.payment_id).await {
            error!(payment_id = %payment.payment_id, error = %e, "Failed to discard loan payment");
            return;
        }
        if matches!(cause, AppError::NotFound(_)) {
            return;
        }
        if let Err(e) = self.settle_loan(&payment.loan_id, false).await {
            warn!(loan_id = %payment.loan_id, error = %e, "Failed to resettle loan");
        }
    }

    async fn try_replace_loan(&self, loan: &mut LoanAccount) -> Result<bool, AppError> {
        let expected_version = loan.version;
        loan.normalize();
        loan.version = expected_version + 1;
        loan.updated_utc = Utc::now();

        if self.store.replace_loan(loan, expected_version).await? {
            return Ok(true);
        }
        match self.store.find_loan(&loan.loan_id).await? {
            Some(_) => Ok(false),
            None => Err(AppError::NotFound(anyhow::anyhow!(
                "Loan not found: {}",
                loan.loan_id
            ))),
        }
    }
}

fn cancelled_sale(sale_id: &str, action: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("Sale {} is cancelled and {}", sale_id, action))
}

fn closed_loan(loan_id: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Loan {} is closed and cannot accept payments",
        loan_id
    ))
}
