//! Activity log model
//!
//! The activity log is the audit trail: one append-only entry per
//! state-mutating operation, written in the same transaction as the
//! mutation. Entries are never updated or individually deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Action tags stamped on activity log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    CreateBorrowRequest,
    ApproveAndAutoAssignBorrow,
    RejectBorrow,
    ConfirmDelivery,
    ChangeEquipmentAndDeliver,
    ProcessReturn,
    PostAssessment,
    CreateRepairRequestFromAssessment,
    ApproveRepair,
    RejectRepair,
    CompleteRepair,
    AddEquipment,
    UpdateEquipment,
    DeleteEquipment,
    ImportEquipment,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::CreateBorrowRequest => "CREATE_BORROW_REQUEST",
            ActivityAction::ApproveAndAutoAssignBorrow => "APPROVE_AND_AUTO_ASSIGN_BORROW",
            ActivityAction::RejectBorrow => "REJECT_BORROW",
            ActivityAction::ConfirmDelivery => "CONFIRM_DELIVERY",
            ActivityAction::ChangeEquipmentAndDeliver => "CHANGE_EQUIPMENT_AND_DELIVER",
            ActivityAction::ProcessReturn => "PROCESS_RETURN",
            ActivityAction::PostAssessment => "POST_ASSESSMENT",
            ActivityAction::CreateRepairRequestFromAssessment => {
                "CREATE_REPAIR_REQUEST_FROM_ASSESSMENT"
            }
            ActivityAction::ApproveRepair => "APPROVE_REPAIR",
            ActivityAction::RejectRepair => "REJECT_REPAIR",
            ActivityAction::CompleteRepair => "COMPLETE_REPAIR",
            ActivityAction::AddEquipment => "ADD_EQUIPMENT",
            ActivityAction::UpdateEquipment => "UPDATE_EQUIPMENT",
            ActivityAction::DeleteEquipment => "DELETE_EQUIPMENT",
            ActivityAction::ImportEquipment => "IMPORT_EQUIPMENT",
            ActivityAction::CreateUser => "CREATE_USER",
            ActivityAction::UpdateUser => "UPDATE_USER",
            ActivityAction::DeleteUser => "DELETE_USER",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityEntry {
    pub id: i64,
    pub action: String,
    pub actor_id: i32,
    pub actor_name: String,
    #[schema(value_type = Object)]
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Activity log query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    pub action: Option<String>,
    pub actor_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// The identity performing a workflow operation, taken from the caller's
/// JWT claims and threaded explicitly into every mutation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: i32,
    pub name: String,
}
