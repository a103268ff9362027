//! Equipment API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::equipment::{
        CreateEquipment, Equipment, EquipmentQuery, EquipmentTypeSummary, UpdateEquipment,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List equipment with filters and pagination
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("equipment_type" = Option<String>, Query, description = "Filter by type"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Equipment list", body = PaginatedResponse<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<EquipmentQuery>,
) -> AppResult<Json<PaginatedResponse<Equipment>>> {
    let (items, total) = state.services.equipment.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Per-type availability summary
#[utoipa::path(
    get,
    path = "/equipment/types",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Type summary", body = Vec<EquipmentTypeSummary>)
    )
)]
pub async fn list_equipment_types(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<EquipmentTypeSummary>>> {
    let summary = state.services.equipment.types_summary().await?;
    Ok(Json(summary))
}

/// Get equipment by ID
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.get_by_id(id).await?;
    Ok(Json(equipment))
}

/// Create equipment (admin)
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = Equipment),
        (status = 409, description = "Serial number already exists")
    )
)]
pub async fn create_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    claims.require_admin()?;
    let equipment = state
        .services
        .equipment
        .create(&data, &claims.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Bulk import equipment (admin)
#[utoipa::path(
    post,
    path = "/equipment/import",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = Vec<CreateEquipment>,
    responses(
        (status = 201, description = "Equipment imported", body = Vec<Equipment>),
        (status = 409, description = "Serial number already exists")
    )
)]
pub async fn import_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<Vec<CreateEquipment>>,
) -> AppResult<(StatusCode, Json<Vec<Equipment>>)> {
    claims.require_admin()?;
    let created = state
        .services
        .equipment
        .import(&data, &claims.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update equipment (admin)
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn update_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateEquipment>,
) -> AppResult<Json<Equipment>> {
    claims.require_admin()?;
    let equipment = state
        .services
        .equipment
        .update(id, &data, &claims.actor())
        .await?;
    Ok(Json(equipment))
}

/// Soft delete equipment (admin)
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 204, description = "Equipment deleted"),
        (status = 400, description = "Equipment is bound to an active borrow"),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn delete_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.equipment.delete(id, &claims.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}
