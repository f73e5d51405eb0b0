use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::sales::{check_items, LineItemRequest};
use super::{default_limit, ensure_percentage};
use crate::models::{
    CreateProcurement, LineItem, Procurement, ProcurementFilter, ProcurementKind,
    UpdateProcurement,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProcurementRequest {
    pub kind: ProcurementKind,
    #[validate(length(min = 1, message = "vendor_id cannot be empty"))]
    pub vendor_id: String,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub gst_percentage: Decimal,
    pub notes: Option<String>,
}

impl CreateProcurementRequest {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        check_items(&self.items)?;
        ensure_percentage("gst_percentage", self.gst_percentage)
    }
}

impl From<CreateProcurementRequest> for CreateProcurement {
    fn from(request: CreateProcurementRequest) -> Self {
        CreateProcurement {
            kind: request.kind,
            vendor_id: request.vendor_id,
            items: request.items.into_iter().map(LineItem::from).collect(),
            gst_percentage: request.gst_percentage,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProcurementRequest {
    #[validate(length(min = 1, message = "vendor_id cannot be empty"))]
    pub vendor_id: Option<String>,
    pub items: Option<Vec<LineItemRequest>>,
    pub gst_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

impl UpdateProcurementRequest {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        if let Some(items) = &self.items {
            check_items(items)?;
        }
        if let Some(gst_percentage) = self.gst_percentage {
            ensure_percentage("gst_percentage", gst_percentage)?;
        }
        Ok(())
    }
}

impl From<UpdateProcurementRequest> for UpdateProcurement {
    fn from(request: UpdateProcurementRequest) -> Self {
        UpdateProcurement {
            vendor_id: request.vendor_id,
            items: request
                .items
                .map(|items| items.into_iter().map(LineItem::from).collect()),
            gst_percentage: request.gst_percentage,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListProcurementsQuery {
    pub kind: Option<String>,
    pub vendor_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

impl ListProcurementsQuery {
    pub fn into_filter(self) -> Result<ProcurementFilter, AppError> {
        let kind = match &self.kind {
            Some(k) => Some(ProcurementKind::parse(k).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Invalid kind: {}. Must be one of: RAW_MATERIAL, TRADING_GOOD",
                    k
                ))
            })?),
            None => None,
        };

        Ok(ProcurementFilter {
            kind,
            vendor_id: self.vendor_id,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ProcurementResponse {
    pub procurement_id: String,
    pub kind: ProcurementKind,
    pub vendor_id: String,
    pub items: Vec<LineItem>,
    pub gst_percentage: Decimal,
    pub subtotal: Decimal,
    pub gst_amount: Decimal,
    pub grand_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Procurement> for ProcurementResponse {
    fn from(procurement: Procurement) -> Self {
        Self {
            procurement_id: procurement.procurement_id,
            kind: procurement.kind,
            vendor_id: procurement.vendor_id,
            items: procurement.items,
            gst_percentage: procurement.gst_percentage,
            subtotal: procurement.subtotal,
            gst_amount: procurement.gst_amount,
            grand_total: procurement.grand_total,
            notes: procurement.notes,
            created_utc: procurement.created_utc,
            updated_utc: procurement.updated_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListProcurementsResponse {
    pub procurements: Vec<ProcurementResponse>,
    pub limit: i64,
    pub offset: u64,
    pub count: usize,
}
