//! Activity log endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::activity::{ActivityEntry, ActivityQuery},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List audit trail entries, newest first (admin)
#[utoipa::path(
    get,
    path = "/activity",
    tag = "activity",
    security(("bearer_auth" = [])),
    params(
        ("action" = Option<String>, Query, description = "Filter by action tag"),
        ("actor_id" = Option<i32>, Query, description = "Filter by actor"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Activity log entries", body = PaginatedResponse<ActivityEntry>)
    )
)]
pub async fn list_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<PaginatedResponse<ActivityEntry>>> {
    claims.require_admin()?;

    let (items, total) = state.services.activity.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(50),
    }))
}
