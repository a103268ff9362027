//! Repair requests repository

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, Actor},
        enums::{EquipmentEvent, RepairEvent, RepairStatus},
        equipment::Equipment,
        repair::{CompleteRepairRequest, RepairQuery, RepairRequest},
    },
};

use super::activity::ActivityRepository;

#[derive(Clone)]
pub struct RepairsRepository {
    pool: Pool<Postgres>,
}

impl RepairsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get repair request by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<RepairRequest> {
        sqlx::query_as::<_, RepairRequest>("SELECT * FROM repair_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Repair request {} not found", id)))
    }

    /// List repair requests with optional filters, newest first
    pub async fn list(&self, query: &RepairQuery) -> AppResult<(Vec<RepairRequest>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let rows = sqlx::query_as::<_, RepairRequest>(
            r#"
            SELECT * FROM repair_requests
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::integer IS NULL OR equipment_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.status)
        .bind(query.equipment_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM repair_requests
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::integer IS NULL OR equipment_id = $2)
            "#,
        )
        .bind(query.status)
        .bind(query.equipment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn lock_repair(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<RepairRequest> {
        sqlx::query_as::<_, RepairRequest>(
            "SELECT * FROM repair_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repair request {} not found", id)))
    }

    async fn lock_equipment(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Approve a repair: the unit moves into maintenance
    pub async fn approve(&self, id: i32, actor: &Actor) -> AppResult<RepairRequest> {
        let mut tx = self.pool.begin().await?;

        let repair = Self::lock_repair(&mut tx, id).await?;
        let next_repair = repair.status.apply(RepairEvent::Approve)?;

        let unit = Self::lock_equipment(&mut tx, repair.equipment_id).await?;
        let next_unit = unit.status.apply(EquipmentEvent::ApproveRepair)?;

        sqlx::query("UPDATE equipment SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next_unit)
            .bind(unit.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE repair_requests SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next_repair)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::ApproveRepair,
            actor,
            serde_json::json!({
                "repair_id": id,
                "equipment_id": unit.id,
                "serial_number": unit.serial_number,
                "estimated_cost": repair.estimated_cost,
            }),
        )
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Reject a repair: the unit goes back to the available pool
    pub async fn reject(&self, id: i32, reason: Option<&str>, actor: &Actor) -> AppResult<RepairRequest> {
        let mut tx = self.pool.begin().await?;

        let repair = Self::lock_repair(&mut tx, id).await?;
        let next_repair = repair.status.apply(RepairEvent::Reject)?;

        let unit = Self::lock_equipment(&mut tx, repair.equipment_id).await?;
        let next_unit = unit.status.apply(EquipmentEvent::RejectRepair)?;

        sqlx::query("UPDATE equipment SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next_unit)
            .bind(unit.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE repair_requests SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next_repair)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::RejectRepair,
            actor,
            serde_json::json!({
                "repair_id": id,
                "equipment_id": unit.id,
                "serial_number": unit.serial_number,
                "reason": reason,
            }),
        )
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Complete a repair: the technician's report is recorded and the unit
    /// returns to the available pool
    pub async fn complete(
        &self,
        id: i32,
        data: &CompleteRepairRequest,
        actor: &Actor,
    ) -> AppResult<RepairRequest> {
        let mut tx = self.pool.begin().await?;

        let repair = Self::lock_repair(&mut tx, id).await?;
        let next_repair = repair.status.apply(RepairEvent::Complete)?;

        let unit = Self::lock_equipment(&mut tx, repair.equipment_id).await?;
        let next_unit = unit.status.apply(EquipmentEvent::CompleteRepair)?;

        sqlx::query("UPDATE equipment SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next_unit)
            .bind(unit.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE repair_requests SET
                status = $1,
                repair_details = $2,
                final_cost = $3,
                parts_used = $4,
                updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(next_repair)
        .bind(&data.repair_details)
        .bind(data.final_cost)
        .bind(&data.parts_used)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::CompleteRepair,
            actor,
            serde_json::json!({
                "repair_id": id,
                "equipment_id": unit.id,
                "serial_number": unit.serial_number,
                "final_cost": data.final_cost,
                "parts_used": data.parts_used,
            }),
        )
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Count repairs per status (for stats)
    pub async fn count_by_status(&self, status: RepairStatus) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM repair_requests WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
