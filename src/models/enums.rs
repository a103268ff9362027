//! Shared domain enums and state transitions
//!
//! Every workflow status is a tagged enum with an explicit transition
//! function. Handlers never write a status directly; they apply an event
//! and persist whatever the transition function returns, so the illegal
//! transition space is a validation error instead of a UI affordance.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// EquipmentStatus
// ---------------------------------------------------------------------------

/// Equipment status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum EquipmentStatus {
    Available = 0,
    PendingDelivery = 1,
    Borrowed = 2,
    PendingRepairApproval = 3,
    UnderMaintenance = 4,
    Deleted = 5,
}

/// Events that drive an equipment unit through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentEvent {
    /// Bound to a borrow request at approval time
    Assign,
    /// Passed pre-delivery assessment
    Deliver,
    /// Picked from the available pool to replace a faulty unit
    AssignReplacement,
    /// Failed pre-delivery assessment, sent straight to maintenance
    FailPreDelivery,
    /// Passed post-return assessment
    ReturnNormal,
    /// Failed post-return assessment, awaiting repair approval
    FailPostReturn,
    ApproveRepair,
    RejectRepair,
    CompleteRepair,
    /// Admin soft delete
    Retire,
}

impl EquipmentStatus {
    /// Apply a lifecycle event, rejecting illegal transitions.
    pub fn apply(self, event: EquipmentEvent) -> Result<EquipmentStatus, AppError> {
        use EquipmentEvent::*;
        use EquipmentStatus::*;

        let next = match (self, event) {
            (Available, Assign) => PendingDelivery,
            (PendingDelivery, Deliver) => Borrowed,
            // Replacements skip the pending_delivery stage: they are
            // inspected as part of the swap and leave as borrowed.
            (Available, AssignReplacement) => Borrowed,
            (PendingDelivery, FailPreDelivery) => UnderMaintenance,
            (Borrowed, ReturnNormal) => Available,
            (Borrowed, FailPostReturn) => PendingRepairApproval,
            (PendingRepairApproval, ApproveRepair) => UnderMaintenance,
            (PendingRepairApproval, RejectRepair) => Available,
            (UnderMaintenance, CompleteRepair) => Available,
            (Available | PendingRepairApproval | UnderMaintenance, Retire) => Deleted,
            _ => {
                return Err(AppError::Validation(format!(
                    "Illegal equipment transition: {} cannot accept {:?}",
                    self, event
                )))
            }
        };
        Ok(next)
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EquipmentStatus::Available => "available",
            EquipmentStatus::PendingDelivery => "pending_delivery",
            EquipmentStatus::Borrowed => "borrowed",
            EquipmentStatus::PendingRepairApproval => "pending_repair_approval",
            EquipmentStatus::UnderMaintenance => "under_maintenance",
            EquipmentStatus::Deleted => "deleted",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// BorrowStatus
// ---------------------------------------------------------------------------

/// Borrow request status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum BorrowStatus {
    PendingBorrowApproval = 0,
    PendingDelivery = 1,
    Borrowed = 2,
    ReturnedPendingAssessment = 3,
    Completed = 4,
    Rejected = 5,
}

/// Events that drive a borrow request through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowEvent {
    Approve,
    Reject,
    /// Every assigned unit has passed pre-delivery assessment
    DeliverAll,
    Return,
    /// Every returned unit has been assessed
    AssessAll,
}

impl BorrowStatus {
    /// Apply a lifecycle event, rejecting illegal transitions.
    pub fn apply(self, event: BorrowEvent) -> Result<BorrowStatus, AppError> {
        use BorrowEvent::*;
        use BorrowStatus::*;

        let next = match (self, event) {
            (PendingBorrowApproval, Approve) => PendingDelivery,
            (PendingBorrowApproval, Reject) => Rejected,
            (PendingDelivery, DeliverAll) => Borrowed,
            (Borrowed, Return) => ReturnedPendingAssessment,
            (ReturnedPendingAssessment, AssessAll) => Completed,
            _ => {
                return Err(AppError::Validation(format!(
                    "Illegal borrow transition: {} cannot accept {:?}",
                    self, event
                )))
            }
        };
        Ok(next)
    }

    /// Terminal statuses accept no further events.
    pub fn is_terminal(self) -> bool {
        matches!(self, BorrowStatus::Completed | BorrowStatus::Rejected)
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BorrowStatus::PendingBorrowApproval => "pending_borrow_approval",
            BorrowStatus::PendingDelivery => "pending_delivery",
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::ReturnedPendingAssessment => "returned_pending_assessment",
            BorrowStatus::Completed => "completed",
            BorrowStatus::Rejected => "rejected",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// RepairStatus
// ---------------------------------------------------------------------------

/// Repair request status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum RepairStatus {
    PendingRepairApproval = 0,
    RepairApproved = 1,
    RepairCompleted = 2,
    RepairRejected = 3,
}

/// Events that drive a repair request through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairEvent {
    Approve,
    Reject,
    Complete,
}

impl RepairStatus {
    /// Apply a lifecycle event, rejecting illegal transitions.
    pub fn apply(self, event: RepairEvent) -> Result<RepairStatus, AppError> {
        use RepairEvent::*;
        use RepairStatus::*;

        let next = match (self, event) {
            (PendingRepairApproval, Approve) => RepairApproved,
            (PendingRepairApproval, Reject) => RepairRejected,
            (RepairApproved, Complete) => RepairCompleted,
            _ => {
                return Err(AppError::Validation(format!(
                    "Illegal repair transition: {} cannot accept {:?}",
                    self, event
                )))
            }
        };
        Ok(next)
    }
}

impl std::fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RepairStatus::PendingRepairApproval => "pending_repair_approval",
            RepairStatus::RepairApproved => "repair_approved",
            RepairStatus::RepairCompleted => "repair_completed",
            RepairStatus::RepairRejected => "repair_rejected",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

/// Which side of the borrow an assessment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum AssessmentStage {
    PreDelivery = 0,
    PostReturn = 1,
}

/// Overall result of a checklist inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum AssessmentOutcome {
    Normal = 0,
    Abnormal = 1,
}

/// Condition recorded for a single checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    Normal,
    Abnormal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrow_happy_path() {
        let s = BorrowStatus::PendingBorrowApproval;
        let s = s.apply(BorrowEvent::Approve).unwrap();
        assert_eq!(s, BorrowStatus::PendingDelivery);
        let s = s.apply(BorrowEvent::DeliverAll).unwrap();
        assert_eq!(s, BorrowStatus::Borrowed);
        let s = s.apply(BorrowEvent::Return).unwrap();
        assert_eq!(s, BorrowStatus::ReturnedPendingAssessment);
        let s = s.apply(BorrowEvent::AssessAll).unwrap();
        assert_eq!(s, BorrowStatus::Completed);
        assert!(s.is_terminal());
    }

    #[test]
    fn borrow_reject_is_terminal() {
        let s = BorrowStatus::PendingBorrowApproval
            .apply(BorrowEvent::Reject)
            .unwrap();
        assert_eq!(s, BorrowStatus::Rejected);
        assert!(s.is_terminal());
        assert!(s.apply(BorrowEvent::Approve).is_err());
    }

    #[test]
    fn borrow_rejects_out_of_order_events() {
        assert!(BorrowStatus::PendingBorrowApproval
            .apply(BorrowEvent::Return)
            .is_err());
        assert!(BorrowStatus::Borrowed.apply(BorrowEvent::Approve).is_err());
        assert!(BorrowStatus::Completed
            .apply(BorrowEvent::AssessAll)
            .is_err());
        // Delivery confirmation cannot be applied twice
        assert!(BorrowStatus::Borrowed
            .apply(BorrowEvent::DeliverAll)
            .is_err());
    }

    #[test]
    fn equipment_normal_path() {
        let s = EquipmentStatus::Available;
        let s = s.apply(EquipmentEvent::Assign).unwrap();
        assert_eq!(s, EquipmentStatus::PendingDelivery);
        let s = s.apply(EquipmentEvent::Deliver).unwrap();
        assert_eq!(s, EquipmentStatus::Borrowed);
        let s = s.apply(EquipmentEvent::ReturnNormal).unwrap();
        assert_eq!(s, EquipmentStatus::Available);
    }

    #[test]
    fn equipment_fault_paths() {
        // Pre-delivery fault goes straight to maintenance
        let s = EquipmentStatus::PendingDelivery
            .apply(EquipmentEvent::FailPreDelivery)
            .unwrap();
        assert_eq!(s, EquipmentStatus::UnderMaintenance);
        assert_eq!(
            s.apply(EquipmentEvent::CompleteRepair).unwrap(),
            EquipmentStatus::Available
        );

        // Post-return fault awaits repair approval
        let s = EquipmentStatus::Borrowed
            .apply(EquipmentEvent::FailPostReturn)
            .unwrap();
        assert_eq!(s, EquipmentStatus::PendingRepairApproval);
        assert_eq!(
            s.apply(EquipmentEvent::ApproveRepair).unwrap(),
            EquipmentStatus::UnderMaintenance
        );
        assert_eq!(
            s.apply(EquipmentEvent::RejectRepair).unwrap(),
            EquipmentStatus::Available
        );
    }

    #[test]
    fn equipment_replacement_is_borrowed_directly() {
        assert_eq!(
            EquipmentStatus::Available
                .apply(EquipmentEvent::AssignReplacement)
                .unwrap(),
            EquipmentStatus::Borrowed
        );
        // A unit already bound elsewhere cannot be a replacement
        assert!(EquipmentStatus::PendingDelivery
            .apply(EquipmentEvent::AssignReplacement)
            .is_err());
    }

    #[test]
    fn equipment_retire_refused_while_bound() {
        assert!(EquipmentStatus::PendingDelivery
            .apply(EquipmentEvent::Retire)
            .is_err());
        assert!(EquipmentStatus::Borrowed
            .apply(EquipmentEvent::Retire)
            .is_err());
        assert_eq!(
            EquipmentStatus::Available
                .apply(EquipmentEvent::Retire)
                .unwrap(),
            EquipmentStatus::Deleted
        );
        assert!(EquipmentStatus::Deleted
            .apply(EquipmentEvent::Retire)
            .is_err());
    }

    #[test]
    fn repair_transitions() {
        let s = RepairStatus::PendingRepairApproval;
        assert_eq!(
            s.apply(RepairEvent::Approve).unwrap(),
            RepairStatus::RepairApproved
        );
        assert_eq!(
            s.apply(RepairEvent::Reject).unwrap(),
            RepairStatus::RepairRejected
        );
        assert_eq!(
            RepairStatus::RepairApproved
                .apply(RepairEvent::Complete)
                .unwrap(),
            RepairStatus::RepairCompleted
        );
        // Completion requires prior approval
        assert!(s.apply(RepairEvent::Complete).is_err());
        assert!(RepairStatus::RepairRejected
            .apply(RepairEvent::Approve)
            .is_err());
    }
}
