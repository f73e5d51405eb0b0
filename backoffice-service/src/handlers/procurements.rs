use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::dtos::{
    CreateProcurementRequest, ListProcurementsQuery, ListProcurementsResponse,
    ProcurementResponse, UpdateProcurementRequest,
};
use crate::services::records::clamp_limit;
use crate::startup::AppState;
use service_core::error::AppError;

#[tracing::instrument(skip(state, request))]
pub async fn create_procurement(
    State(state): State<AppState>,
    Json(request): Json<CreateProcurementRequest>,
) -> Result<(StatusCode, Json<ProcurementResponse>), AppError> {
    request.validate()?;
    request.check_amounts()?;

    let procurement = state.records.create_procurement(request.into()).await?;
    Ok((StatusCode::CREATED, Json(procurement.into())))
}

#[tracing::instrument(skip(state))]
pub async fn get_procurement(
    State(state): State<AppState>,
    Path(procurement_id): Path<String>,
) -> Result<Json<ProcurementResponse>, AppError> {
    let procurement = state.records.get_procurement(&procurement_id).await?;
    Ok(Json(procurement.into()))
}

#[tracing::instrument(skip(state))]
pub async fn list_procurements(
    State(state): State<AppState>,
    Query(query): Query<ListProcurementsQuery>,
) -> Result<Json<ListProcurementsResponse>, AppError> {
    let filter = query.into_filter()?;
    let limit = clamp_limit(filter.limit);
    let offset = filter.offset;

    let procurements = state.records.list_procurements(filter).await?;
    let count = procurements.len();

    Ok(Json(ListProcurementsResponse {
        procurements: procurements.into_iter().map(Into::into).collect(),
        limit,
        offset,
        count,
    }))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_procurement(
    State(state): State<AppState>,
    Path(procurement_id): Path<String>,
    Json(request): Json<UpdateProcurementRequest>,
) -> Result<Json<ProcurementResponse>, AppError> {
    request.validate()?;
    request.check_amounts()?;

    let procurement = state
        .records
        .update_procurement(&procurement_id, request.into())
        .await?;
    Ok(Json(procurement.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_procurement(
    State(state): State<AppState>,
    Path(procurement_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.records.delete_procurement(&procurement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
