//! Domain models for backoffice-service.

mod changes;
mod line_item;
mod loan;
mod procurement;
mod sale;

pub use changes::{diff_sales, FieldChange, SaleField};
pub use line_item::LineItem;
pub use loan::{
    CreateLoan, CreateLoanPayment, LoanAccount, LoanFilter, LoanPayment, LoanStatus,
};
pub use procurement::{
    CreateProcurement, Procurement, ProcurementFilter, ProcurementKind, UpdateProcurement,
};
pub use sale::{
    CreateSale, CreateSalePayment, PaymentMethod, PaymentStatus, Sale, SaleFilter, SalePayment, SaleStatus,
    UpdateSale,
};
