//! Assessment model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{AssessmentOutcome, AssessmentStage, ItemCondition};

/// One entry of an inspection checklist
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChecklistItem {
    /// What was inspected, e.g. "nozzle", "battery"
    pub label: String,
    pub condition: ItemCondition,
}

/// A recorded checklist inspection of one unit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assessment {
    pub id: i32,
    pub borrow_id: i32,
    pub equipment_id: i32,
    pub stage: AssessmentStage,
    #[schema(value_type = Vec<ChecklistItem>)]
    pub items: sqlx::types::Json<Vec<ChecklistItem>>,
    pub outcome: AssessmentOutcome,
    pub notes: Option<String>,
    pub assessed_by: i32,
    pub assessed_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// Pre-delivery assessment of one assigned unit
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeliveryAssessmentRequest {
    pub equipment_id: i32,
    #[validate(length(min = 1, message = "Checklist cannot be empty"))]
    pub items: Vec<ChecklistItem>,
    /// Required when any checklist item is abnormal: an available unit of
    /// the same type that takes the faulty unit's slot
    pub replacement_id: Option<i32>,
    pub notes: Option<String>,
}

/// Post-return assessment of one returned unit
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnAssessmentRequest {
    pub equipment_id: i32,
    #[validate(length(min = 1, message = "Checklist cannot be empty"))]
    pub items: Vec<ChecklistItem>,
    /// Required when any checklist item is abnormal
    pub damage_description: Option<String>,
    /// Estimated repair cost, carried onto the spawned repair request
    #[schema(value_type = Option<f64>)]
    pub estimated_cost: Option<rust_decimal::Decimal>,
    pub notes: Option<String>,
}

impl ChecklistItem {
    /// A checklist is abnormal as soon as one entry is.
    pub fn outcome_of(items: &[ChecklistItem]) -> AssessmentOutcome {
        if items
            .iter()
            .any(|i| i.condition == ItemCondition::Abnormal)
        {
            AssessmentOutcome::Abnormal
        } else {
            AssessmentOutcome::Normal
        }
    }
}
