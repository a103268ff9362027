//! Borrow request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::assessment::Assessment;
use super::enums::BorrowStatus;

/// Borrow request record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRequest {
    pub id: i32,
    pub user_id: i32,
    /// Requester display name, snapshotted at submission
    pub user_name: String,
    pub purpose: Option<String>,
    pub contact: Option<String>,
    pub status: BorrowStatus,
    pub request_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of the demand descriptor: how many units of a type
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowLine {
    pub id: i32,
    pub borrow_id: i32,
    pub equipment_type: String,
    pub quantity: i32,
    pub position: i32,
}

/// A concrete unit bound to a borrow request at approval time.
/// Name/serial/type are snapshots of the equipment document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowAssignment {
    pub id: i32,
    pub borrow_id: i32,
    pub equipment_id: i32,
    pub name: String,
    pub serial_number: String,
    pub equipment_type: String,
    pub assigned_at: DateTime<Utc>,
    /// Set when the unit passes pre-delivery assessment
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Snapshot of an assignment taken when the borrow is returned
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowReturnedItem {
    pub id: i32,
    pub borrow_id: i32,
    pub equipment_id: i32,
    pub name: String,
    pub serial_number: String,
    pub equipment_type: String,
    pub returned_at: DateTime<Utc>,
}

/// Full borrow detail for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowDetails {
    #[serde(flatten)]
    pub request: BorrowRequest,
    pub lines: Vec<BorrowLine>,
    pub equipment_assigned: Vec<BorrowAssignment>,
    pub equipment_returned: Vec<BorrowReturnedItem>,
    pub assessments: Vec<Assessment>,
}

/// One requested line in a submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowLine {
    #[validate(length(min = 1, message = "Equipment type is required"))]
    pub equipment_type: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Submit borrow request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowRequest {
    #[validate(length(min = 1, message = "At least one equipment line is required"), nested)]
    pub equipment_requests: Vec<CreateBorrowLine>,
    pub purpose: Option<String>,
    pub contact: Option<String>,
}

/// Borrow query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BorrowQuery {
    pub status: Option<BorrowStatus>,
    pub user_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
