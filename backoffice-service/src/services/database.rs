//! MongoDB record store for backoffice-service.

use super::metrics::observe_store_operation;
use super::store::RecordStore;
use crate::models::{
    LoanAccount, LoanFilter, LoanPayment, Procurement, ProcurementFilter, Sale, SaleFilter,
    SalePayment,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use service_core::error::AppError;
use std::time::Instant;

fn db_error(context: &str, e: mongodb::error::Error) -> AppError {
    tracing::error!("{}: {}", context, e);
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub fn sales(&self) -> Collection<Sale> {
        self.db.collection("sales")
    }

    pub fn sale_payments(&self) -> Collection<SalePayment> {
        self.db.collection("sale_payments")
    }

    pub fn procurements(&self) -> Collection<Procurement> {
        self.db.collection("procurements")
    }

    pub fn loans(&self) -> Collection<LoanAccount> {
        self.db.collection("loans")
    }

    pub fn loan_payments(&self) -> Collection<LoanPayment> {
        self.db.collection("loan_payments")
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for backoffice-service");

        self.sales()
            .create_indexes(
                [
                    unique_index("sale_id", "sale_id_idx"),
                    index(doc! { "client_id": 1, "created_utc": -1 }, "client_created_idx"),
                    index(doc! { "status": 1 }, "status_idx"),
                    index(doc! { "payment_status": 1 }, "payment_status_idx"),
                ],
                None,
            )
            .await
            .map_err(|e| db_error("Failed to create sale indexes", e))?;

        self.sale_payments()
            .create_indexes(
                [
                    unique_index("payment_id", "payment_id_idx"),
                    index(doc! { "sale_id": 1, "created_utc": 1 }, "sale_created_idx"),
                ],
                None,
            )
            .await
            .map_err(|e| db_error("Failed to create sale payment indexes", e))?;

        self.procurements()
            .create_indexes(
                [
                    unique_index("procurement_id", "procurement_id_idx"),
                    index(doc! { "vendor_id": 1, "created_utc": -1 }, "vendor_created_idx"),
                    index(doc! { "kind": 1 }, "kind_idx"),
                ],
                None,
            )
            .await
            .map_err(|e| db_error("Failed to create procurement indexes", e))?;

        self.loans()
            .create_indexes(
                [
                    unique_index("loan_id", "loan_id_idx"),
                    index(doc! { "status": 1 }, "status_idx"),
                ],
                None,
            )
            .await
            .map_err(|e| db_error("Failed to create loan indexes", e))?;

        self.loan_payments()
            .create_indexes(
                [
                    unique_index("payment_id", "payment_id_idx"),
                    index(doc! { "loan_id": 1, "created_utc": 1 }, "loan_created_idx"),
                ],
                None,
            )
            .await
            .map_err(|e| db_error("Failed to create loan payment indexes", e))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }
}

fn index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

fn unique_index(field: &str, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(doc! { field: 1 })
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build(),
        )
        .build()
}

async fn insert<T: Serialize + Send + Sync>(
    collection: Collection<T>,
    record: &T,
    operation: &str,
) -> Result<(), AppError> {
    let start = Instant::now();
    let result = collection.insert_one(record, None).await;
    observe_store_operation(operation, start);

    result.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Conflict(anyhow::anyhow!("Record already exists"))
        } else {
            db_error(&format!("Failed to {}", operation), e)
        }
    })?;
    Ok(())
}

async fn find_one<T: DeserializeOwned + Unpin + Send + Sync>(
    collection: Collection<T>,
    filter: Document,
    operation: &str,
) -> Result<Option<T>, AppError> {
    let start = Instant::now();
    let result = collection.find_one(filter, None).await;
    observe_store_operation(operation, start);

    result.map_err(|e| db_error(&format!("Failed to {}", operation), e))
}

async fn find_many<T: DeserializeOwned + Unpin + Send + Sync>(
    collection: Collection<T>,
    filter: Document,
    options: FindOptions,
    operation: &str,
) -> Result<Vec<T>, AppError> {
    let start = Instant::now();
    let cursor = collection
        .find(filter, options)
        .await
        .map_err(|e| db_error(&format!("Failed to {}", operation), e))?;
    let records: Vec<T> = cursor
        .try_collect()
        .await
        .map_err(|e| db_error(&format!("Failed to collect {}", operation), e))?;
    observe_store_operation(operation, start);

    Ok(records)
}

async fn replace<T: Serialize + Send + Sync>(
    collection: Collection<T>,
    filter: Document,
    record: &T,
    operation: &str,
) -> Result<bool, AppError> {
    let start = Instant::now();
    let result = collection.replace_one(filter, record, None).await;
    observe_store_operation(operation, start);

    let result = result.map_err(|e| db_error(&format!("Failed to {}", operation), e))?;
    Ok(result.matched_count > 0)
}

/// Match a record by id at the version it was read. Documents written before
/// versioning have no `version` field and read back as 0.
fn versioned(id_field: &str, id: &str, expected_version: i64) -> Document {
    let version = if expected_version == 0 {
        Bson::Document(doc! { "$in": [0_i64, Bson::Null] })
    } else {
        Bson::Int64(expected_version)
    };
    let mut filter = Document::new();
    filter.insert(id_field, id);
    filter.insert("version", version);
    filter
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        &*e.kind,
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(w)) if w.code == 11000
    )
}

fn paged(limit: i64, offset: u64) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_utc": -1 })
        .limit(limit)
        .skip(offset)
        .build()
}

fn oldest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "created_utc": 1 }).build()
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| db_error("MongoDB health check failed", e))?;
        Ok(())
    }

    async fn insert_sale(&self, sale: &Sale) -> Result<(), AppError> {
        insert(self.sales(), sale, "insert_sale").await
    }

    async fn find_sale(&self, sale_id: &str) -> Result<Option<Sale>, AppError> {
        find_one(self.sales(), doc! { "sale_id": sale_id }, "find_sale").await
    }

    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, AppError> {
        let mut query = doc! {};
        if let Some(client_id) = &filter.client_id {
            query.insert("client_id", client_id.as_str());
        }
        if let Some(status) = filter.status {
            query.insert("status", to_bson(&status)?);
        }
        if let Some(payment_status) = filter.payment_status {
            query.insert("payment_status", to_bson(&payment_status)?);
        }

        find_many(
            self.sales(),
            query,
            paged(filter.limit, filter.offset),
            "list_sales",
        )
        .await
    }

    async fn replace_sale(&self, sale: &Sale, expected_version: i64) -> Result<bool, AppError> {
        replace(
            self.sales(),
            versioned("sale_id", &sale.sale_id, expected_version),
            sale,
            "replace_sale",
        )
        .await
    }

    async fn delete_sale(&self, sale_id: &str) -> Result<bool, AppError> {
        let result = self
            .sales()
            .delete_one(doc! { "sale_id": sale_id }, None)
            .await
            .map_err(|e| db_error("Failed to delete sale", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_sale_payment(&self, payment: &SalePayment) -> Result<(), AppError> {
        insert(self.sale_payments(), payment, "insert_sale_payment").await
    }

    async fn list_sale_payments(&self, sale_id: &str) -> Result<Vec<SalePayment>, AppError> {
        find_many(
            self.sale_payments(),
            doc! { "sale_id": sale_id },
            oldest_first(),
            "list_sale_payments",
        )
        .await
    }

    async fn delete_sale_payment(&self, payment_id: &str) -> Result<bool, AppError> {
        let result = self
            .sale_payments()
            .delete_one(doc! { "payment_id": payment_id }, None)
            .await
            .map_err(|e| db_error("Failed to delete sale payment", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_sale_payments(&self, sale_id: &str) -> Result<u64, AppError> {
        let result = self
            .sale_payments()
            .delete_many(doc! { "sale_id": sale_id }, None)
            .await
            .map_err(|e| db_error("Failed to delete sale payments", e))?;
        Ok(result.deleted_count)
    }

    async fn insert_procurement(&self, procurement: &Procurement) -> Result<(), AppError> {
        insert(self.procurements(), procurement, "insert_procurement").await
    }

    async fn find_procurement(
        &self,
        procurement_id: &str,
    ) -> Result<Option<Procurement>, AppError> {
        find_one(
            self.procurements(),
            doc! { "procurement_id": procurement_id },
            "find_procurement",
        )
        .await
    }

    async fn list_procurements(
        &self,
        filter: &ProcurementFilter,
    ) -> Result<Vec<Procurement>, AppError> {
        let mut query = doc! {};
        if let Some(kind) = filter.kind {
            query.insert("kind", to_bson(&kind)?);
        }
        if let Some(vendor_id) = &filter.vendor_id {
            query.insert("vendor_id", vendor_id.as_str());
        }

        find_many(
            self.procurements(),
            query,
            paged(filter.limit, filter.offset),
            "list_procurements",
        )
        .await
    }

    async fn replace_procurement(&self, procurement: &Procurement) -> Result<bool, AppError> {
        replace(
            self.procurements(),
            doc! { "procurement_id": procurement.procurement_id.as_str() },
            procurement,
            "replace_procurement",
        )
        .await
    }

    async fn delete_procurement(&self, procurement_id: &str) -> Result<bool, AppError> {
        let result = self
            .procurements()
            .delete_one(doc! { "procurement_id": procurement_id }, None)
            .await
            .map_err(|e| db_error("Failed to delete procurement", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_loan(&self, loan: &LoanAccount) -> Result<(), AppError> {
        insert(self.loans(), loan, "insert_loan").await
    }

    async fn find_loan(&self, loan_id: &str) -> Result<Option<LoanAccount>, AppError> {
        find_one(self.loans(), doc! { "loan_id": loan_id }, "find_loan").await
    }

    async fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<LoanAccount>, AppError> {
        let mut query = doc! {};
        if let Some(status) = filter.status {
            query.insert("status", to_bson(&status)?);
        }

        find_many(
            self.loans(),
            query,
            paged(filter.limit, filter.offset),
            "list_loans",
        )
        .await
    }

    async fn replace_loan(
        &self,
        loan: &LoanAccount,
        expected_version: i64,
    ) -> Result<bool, AppError> {
        replace(
            self.loans(),
            versioned("loan_id", &loan.loan_id, expected_version),
            loan,
            "replace_loan",
        )
        .await
    }

    async fn insert_loan_payment(&self, payment: &LoanPayment) -> Result<(), AppError> {
        insert(self.loan_payments(), payment, "insert_loan_payment").await
    }

    async fn list_loan_payments(&self, loan_id: &str) -> Result<Vec<LoanPayment>, AppError> {
        find_many(
            self.loan_payments(),
            doc! { "loan_id": loan_id },
            oldest_first(),
            "list_loan_payments",
        )
        .await
    }

    async fn delete_loan_payment(&self, payment_id: &str) -> Result<bool, AppError> {
        let result = self
            .loan_payments()
            .delete_one(doc! { "payment_id": payment_id }, None)
            .await
            .map_err(|e| db_error("Failed to delete loan payment", e))?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_also_matches_unversioned_documents() {
        let filter = versioned("sale_id", "s-1", 0);
        assert_eq!(filter.get_str("sale_id").unwrap(), "s-1");
        assert_eq!(
            filter.get_document("version").unwrap(),
            &doc! { "$in": [0_i64, Bson::Null] }
        );

        let filter = versioned("loan_id", "l-1", 3);
        assert_eq!(filter.get_i64("version").unwrap(), 3);
    }
}
