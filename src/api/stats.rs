//! Statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Equipment counters by status
#[derive(Serialize, ToSchema)]
pub struct EquipmentStats {
    pub total: i64,
    pub available: i64,
    pub pending_delivery: i64,
    pub borrowed: i64,
    pub pending_repair_approval: i64,
    pub under_maintenance: i64,
}

/// Borrow request counters
#[derive(Serialize, ToSchema)]
pub struct BorrowStats {
    pub pending_approval: i64,
    /// Approved or out, not yet completed
    pub active: i64,
    /// Past due date and still out
    pub overdue: i64,
    pub completed: i64,
}

/// Repair request counters
#[derive(Serialize, ToSchema)]
pub struct RepairStats {
    pub pending_approval: i64,
    pub in_progress: i64,
    pub completed: i64,
}

/// Reports dashboard payload
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub equipment: EquipmentStats,
    pub borrows: BorrowStats,
    pub repairs: RepairStats,
}

/// Inventory, borrow and repair counters (staff)
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_staff()?;
    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
