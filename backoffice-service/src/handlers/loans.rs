use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::dtos::{
    CreateLoanRequest, ListLoansQuery, ListLoansResponse, LoanPaymentResponse, LoanResponse,
    PaymentsResponse, RecordLoanPaymentRequest, RecordLoanPaymentResponse,
};
use crate::services::records::clamp_limit;
use crate::startup::AppState;
use service_core::error::AppError;

#[tracing::instrument(skip(state, request))]
pub async fn create_loan(
    State(state): State<AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), AppError> {
    request.validate()?;
    request.check_amounts()?;

    let loan = state.records.create_loan(request.into()).await?;
    Ok((StatusCode::CREATED, Json(loan.into())))
}

#[tracing::instrument(skip(state))]
pub async fn get_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanResponse>, AppError> {
    let loan = state.records.get_loan(&loan_id).await?;
    Ok(Json(loan.into()))
}

#[tracing::instrument(skip(state))]
pub async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ListLoansResponse>, AppError> {
    let filter = query.into_filter()?;
    let limit = clamp_limit(filter.limit);
    let offset = filter.offset;

    let loans = state.records.list_loans(filter).await?;
    let count = loans.len();

    Ok(Json(ListLoansResponse {
        loans: loans.into_iter().map(Into::into).collect(),
        limit,
        offset,
        count,
    }))
}

#[tracing::instrument(skip(state, request))]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(loan_id): Path<String>,
    Json(request): Json<RecordLoanPaymentRequest>,
) -> Result<(StatusCode, Json<RecordLoanPaymentResponse>), AppError> {
    request.check_amounts()?;

    let (loan, payment) = state
        .records
        .record_loan_payment(&loan_id, request.into())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RecordLoanPaymentResponse {
            loan: loan.into(),
            payment: payment.into(),
        }),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    Path(loan_id): Path<String>,
) -> Result<Json<PaymentsResponse<LoanPaymentResponse>>, AppError> {
    let payments = state.records.list_loan_payments(&loan_id).await?;
    Ok(Json(PaymentsResponse::new(payments)))
}
