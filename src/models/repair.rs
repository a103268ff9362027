//! Repair request model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::RepairStatus;

/// Repair request record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RepairRequest {
    pub id: i32,
    pub equipment_id: i32,
    /// The borrow whose post-return assessment spawned this repair
    pub borrow_id: Option<i32>,
    /// Linkage back to the spawning assessment
    pub assessment_id: Option<i32>,
    pub damage_description: String,
    #[schema(value_type = Option<f64>)]
    pub estimated_cost: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub final_cost: Option<Decimal>,
    pub repair_details: Option<String>,
    pub parts_used: Option<String>,
    pub status: RepairStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Technician's completion report
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CompleteRepairRequest {
    #[validate(length(min = 1, message = "Repair details are required"))]
    pub repair_details: String,
    #[schema(value_type = f64)]
    pub final_cost: Decimal,
    pub parts_used: Option<String>,
}

/// Repair query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RepairQuery {
    pub status: Option<RepairStatus>,
    pub equipment_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
