//! Repair management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::repair::{CompleteRepairRequest, RepairQuery, RepairRequest},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Rejection payload with an optional reason
#[derive(Deserialize, ToSchema)]
pub struct RejectRepairRequest {
    pub reason: Option<String>,
}

/// List repair requests with filters and pagination (staff)
#[utoipa::path(
    get,
    path = "/repairs",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("equipment_id" = Option<i32>, Query, description = "Filter by equipment"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Repair request list", body = PaginatedResponse<RepairRequest>)
    )
)]
pub async fn list_repairs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RepairQuery>,
) -> AppResult<Json<PaginatedResponse<RepairRequest>>> {
    claims.require_staff()?;

    let (items, total) = state.services.repairs.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get repair request by ID (staff)
#[utoipa::path(
    get,
    path = "/repairs/{id}",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Repair request ID")),
    responses(
        (status = 200, description = "Repair details", body = RepairRequest),
        (status = 404, description = "Repair request not found")
    )
)]
pub async fn get_repair(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RepairRequest>> {
    claims.require_staff()?;
    let repair = state.services.repairs.get_by_id(id).await?;
    Ok(Json(repair))
}

/// Approve a repair request (approver)
#[utoipa::path(
    post,
    path = "/repairs/{id}/approve",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Repair request ID")),
    responses(
        (status = 200, description = "Repair approved", body = RepairRequest),
        (status = 400, description = "Illegal transition"),
        (status = 404, description = "Repair request not found")
    )
)]
pub async fn approve_repair(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RepairRequest>> {
    claims.require_approver()?;
    let repair = state.services.repairs.approve(id, &claims.actor()).await?;
    Ok(Json(repair))
}

/// Reject a repair request (approver)
#[utoipa::path(
    post,
    path = "/repairs/{id}/reject",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Repair request ID")),
    request_body = RejectRepairRequest,
    responses(
        (status = 200, description = "Repair rejected", body = RepairRequest),
        (status = 400, description = "Illegal transition"),
        (status = 404, description = "Repair request not found")
    )
)]
pub async fn reject_repair(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<RejectRepairRequest>,
) -> AppResult<Json<RepairRequest>> {
    claims.require_approver()?;
    let repair = state
        .services
        .repairs
        .reject(id, request.reason.as_deref(), &claims.actor())
        .await?;
    Ok(Json(repair))
}

/// Complete a repair with the technician's report (technician)
#[utoipa::path(
    post,
    path = "/repairs/{id}/complete",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Repair request ID")),
    request_body = CompleteRepairRequest,
    responses(
        (status = 200, description = "Repair completed", body = RepairRequest),
        (status = 400, description = "Illegal transition"),
        (status = 404, description = "Repair request not found")
    )
)]
pub async fn complete_repair(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CompleteRepairRequest>,
) -> AppResult<Json<RepairRequest>> {
    claims.require_technician()?;
    let repair = state
        .services
        .repairs
        .complete(id, &request, &claims.actor())
        .await?;
    Ok(Json(repair))
}
