//! Statistics service

use crate::{
    api::stats::{BorrowStats, EquipmentStats, RepairStats, StatsResponse},
    error::AppResult,
    models::enums::{BorrowStatus, EquipmentStatus, RepairStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Inventory, borrow and repair counters for the reports dashboard
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let equipment = &self.repository.equipment;
        let available = equipment.count_by_status(EquipmentStatus::Available).await?;
        let pending_delivery = equipment
            .count_by_status(EquipmentStatus::PendingDelivery)
            .await?;
        let borrowed = equipment.count_by_status(EquipmentStatus::Borrowed).await?;
        let pending_repair_approval = equipment
            .count_by_status(EquipmentStatus::PendingRepairApproval)
            .await?;
        let under_maintenance = equipment
            .count_by_status(EquipmentStatus::UnderMaintenance)
            .await?;

        let borrows = &self.repository.borrows;
        let repairs = &self.repository.repairs;

        Ok(StatsResponse {
            equipment: EquipmentStats {
                total: available
                    + pending_delivery
                    + borrowed
                    + pending_repair_approval
                    + under_maintenance,
                available,
                pending_delivery,
                borrowed,
                pending_repair_approval,
                under_maintenance,
            },
            borrows: BorrowStats {
                pending_approval: borrows
                    .count_by_status(BorrowStatus::PendingBorrowApproval)
                    .await?,
                active: borrows.count_active().await?,
                overdue: borrows.count_overdue().await?,
                completed: borrows.count_by_status(BorrowStatus::Completed).await?,
            },
            repairs: RepairStats {
                pending_approval: repairs
                    .count_by_status(RepairStatus::PendingRepairApproval)
                    .await?,
                in_progress: repairs
                    .count_by_status(RepairStatus::RepairApproved)
                    .await?,
                completed: repairs
                    .count_by_status(RepairStatus::RepairCompleted)
                    .await?,
            },
        })
    }
}
