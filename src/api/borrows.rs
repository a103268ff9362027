//! Borrow lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        assessment::{DeliveryAssessmentRequest, ReturnAssessmentRequest},
        borrow::{BorrowDetails, BorrowQuery, BorrowRequest, CreateBorrowRequest},
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Rejection payload with an optional reason shown to the requester
#[derive(Deserialize, ToSchema)]
pub struct RejectBorrowRequest {
    pub reason: Option<String>,
}

/// List borrow requests with filters and pagination (staff)
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("user_id" = Option<i32>, Query, description = "Filter by requester"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Borrow request list", body = PaginatedResponse<BorrowRequest>)
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowRequest>>> {
    claims.require_staff()?;

    let (items, total) = state.services.borrows.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get full borrow detail by ID
#[utoipa::path(
    get,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Borrow details", body = BorrowDetails),
        (status = 404, description = "Borrow request not found")
    )
)]
pub async fn get_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowDetails>> {
    let details = state.services.borrows.get_details(id).await?;
    claims.require_self_or_staff(details.request.user_id)?;
    Ok(Json(details))
}

/// Borrow history for a user
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User's borrow requests", body = Vec<BorrowRequest>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowRequest>>> {
    claims.require_self_or_staff(user_id)?;
    let borrows = state.services.borrows.get_user_borrows(user_id).await?;
    Ok(Json(borrows))
}

/// Submit a borrow request
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowRequest,
    responses(
        (status = 201, description = "Borrow request submitted", body = BorrowRequest),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRequest>)> {
    let borrow = state
        .services
        .borrows
        .submit(&request, &claims.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(borrow)))
}

/// Approve a request and auto-assign equipment (approver)
#[utoipa::path(
    post,
    path = "/borrows/{id}/approve",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Request approved and equipment assigned", body = BorrowDetails),
        (status = 400, description = "Insufficient availability or illegal transition"),
        (status = 404, description = "Borrow request not found")
    )
)]
pub async fn approve_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowDetails>> {
    claims.require_approver()?;
    let details = state.services.borrows.approve(id, &claims.actor()).await?;
    Ok(Json(details))
}

/// Reject a request (approver)
#[utoipa::path(
    post,
    path = "/borrows/{id}/reject",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    request_body = RejectBorrowRequest,
    responses(
        (status = 200, description = "Request rejected", body = BorrowRequest),
        (status = 400, description = "Illegal transition"),
        (status = 404, description = "Borrow request not found")
    )
)]
pub async fn reject_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<RejectBorrowRequest>,
) -> AppResult<Json<BorrowRequest>> {
    claims.require_approver()?;
    let borrow = state
        .services
        .borrows
        .reject(id, request.reason.as_deref(), &claims.actor())
        .await?;
    Ok(Json(borrow))
}

/// Pre-delivery assessment of one assigned unit (technician)
#[utoipa::path(
    post,
    path = "/borrows/{id}/assessments/delivery",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    request_body = DeliveryAssessmentRequest,
    responses(
        (status = 200, description = "Unit assessed", body = BorrowDetails),
        (status = 400, description = "Invalid assessment"),
        (status = 404, description = "Borrow request not found")
    )
)]
pub async fn assess_delivery(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<DeliveryAssessmentRequest>,
) -> AppResult<Json<BorrowDetails>> {
    claims.require_technician()?;
    let details = state
        .services
        .borrows
        .assess_delivery(id, &request, &claims.actor())
        .await?;
    Ok(Json(details))
}

/// Process the return of a borrowed request
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Return recorded", body = BorrowDetails),
        (status = 400, description = "Illegal transition"),
        (status = 404, description = "Borrow request not found")
    )
)]
pub async fn return_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowDetails>> {
    let borrow = state.services.borrows.get_by_id(id).await?;
    claims.require_self_or_staff(borrow.user_id)?;

    let details = state
        .services
        .borrows
        .process_return(id, &claims.actor())
        .await?;
    Ok(Json(details))
}

/// Post-return assessment of one returned unit (technician)
#[utoipa::path(
    post,
    path = "/borrows/{id}/assessments/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    request_body = ReturnAssessmentRequest,
    responses(
        (status = 200, description = "Unit assessed", body = BorrowDetails),
        (status = 400, description = "Invalid assessment"),
        (status = 404, description = "Borrow request not found")
    )
)]
pub async fn assess_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ReturnAssessmentRequest>,
) -> AppResult<Json<BorrowDetails>> {
    claims.require_technician()?;
    let details = state
        .services
        .borrows
        .assess_return(id, &request, &claims.actor())
        .await?;
    Ok(Json(details))
}
