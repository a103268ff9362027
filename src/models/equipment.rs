//! Equipment model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::EquipmentStatus;

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    /// Equipment name / description
    pub name: String,
    /// Manufacturer serial number (unique)
    pub serial_number: String,
    /// Type label, e.g. "ULV sprayer"
    pub equipment_type: String,
    pub status: EquipmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Serial number is required"))]
    pub serial_number: String,
    #[validate(length(min = 1, message = "Equipment type is required"))]
    pub equipment_type: String,
    pub notes: Option<String>,
}

/// Update equipment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub equipment_type: Option<String>,
    /// Status changes must follow a legal lifecycle edge
    pub status: Option<EquipmentStatus>,
    pub notes: Option<String>,
}

/// Equipment query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EquipmentQuery {
    pub equipment_type: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Per-type availability summary, drives the borrow request form
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentTypeSummary {
    pub equipment_type: String,
    /// Units in any non-deleted status
    pub total: i64,
    /// Units currently available for assignment
    pub available: i64,
}
