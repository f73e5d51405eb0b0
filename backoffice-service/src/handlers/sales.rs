use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::dtos::{
    ChangesResponse, CreateSaleRequest, ListSalesQuery, ListSalesResponse, PaymentsResponse,
    RecordSalePaymentRequest, RecordSalePaymentResponse, SalePaymentResponse, SaleResponse,
    UpdateSaleRequest,
};
use crate::services::records::clamp_limit;
use crate::startup::AppState;
use service_core::error::AppError;

#[tracing::instrument(skip(state, request))]
pub async fn create_sale(
    State(state): State<AppState>,
    Json(request): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    request.validate()?;
    request.check_amounts()?;

    let sale = state.records.create_sale(request.into()).await?;
    Ok((StatusCode::CREATED, Json(sale.into())))
}

#[tracing::instrument(skip(state))]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
) -> Result<Json<SaleResponse>, AppError> {
    let sale = state.records.get_sale(&sale_id).await?;
    Ok(Json(sale.into()))
}

#[tracing::instrument(skip(state))]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<ListSalesQuery>,
) -> Result<Json<ListSalesResponse>, AppError> {
    let filter = query.into_filter()?;
    let limit = clamp_limit(filter.limit);
    let offset = filter.offset;

    let sales = state.records.list_sales(filter).await?;
    let count = sales.len();

    Ok(Json(ListSalesResponse {
        sales: sales.into_iter().map(Into::into).collect(),
        limit,
        offset,
        count,
    }))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    Json(request): Json<UpdateSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    request.validate()?;
    request.check_amounts()?;

    let sale = state.records.update_sale(&sale_id, request.into()).await?;
    Ok(Json(sale.into()))
}

#[tracing::instrument(skip(state, request))]
pub async fn preview_sale_changes(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    Json(request): Json<UpdateSaleRequest>,
) -> Result<Json<ChangesResponse>, AppError> {
    request.validate()?;
    request.check_amounts()?;

    let changes = state
        .records
        .preview_sale_update(&sale_id, request.into())
        .await?;

    Ok(Json(ChangesResponse {
        sale_id,
        has_changes: !changes.is_empty(),
        changes,
        generated_utc: Utc::now(),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn cancel_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
) -> Result<Json<SaleResponse>, AppError> {
    let sale = state.records.cancel_sale(&sale_id).await?;
    Ok(Json(sale.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.records.delete_sale(&sale_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, request))]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    Json(request): Json<RecordSalePaymentRequest>,
) -> Result<(StatusCode, Json<RecordSalePaymentResponse>), AppError> {
    request.check_amounts()?;

    let (sale, payment) = state
        .records
        .record_sale_payment(&sale_id, request.try_into()?)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RecordSalePaymentResponse {
            sale: sale.into(),
            payment: payment.into(),
        }),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
) -> Result<Json<PaymentsResponse<SalePaymentResponse>>, AppError> {
    let payments = state.records.list_sale_payments(&sale_id).await?;
    Ok(Json(PaymentsResponse::new(payments)))
}
