//! Equipment repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, Actor},
        enums::{EquipmentEvent, EquipmentStatus},
        equipment::{CreateEquipment, Equipment, EquipmentQuery, EquipmentTypeSummary, UpdateEquipment},
    },
};

use super::activity::ActivityRepository;

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// List equipment with optional type/status filters.
    /// Soft-deleted units are hidden unless explicitly filtered for.
    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<(Vec<Equipment>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let rows = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT * FROM equipment
            WHERE ($1::varchar IS NULL OR equipment_type = $1)
              AND (CASE WHEN $2::smallint IS NULL THEN status != 5 ELSE status = $2 END)
            ORDER BY name, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&query.equipment_type)
        .bind(query.status)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM equipment
            WHERE ($1::varchar IS NULL OR equipment_type = $1)
              AND (CASE WHEN $2::smallint IS NULL THEN status != 5 ELSE status = $2 END)
            "#,
        )
        .bind(&query.equipment_type)
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Per-type totals and availability, for the borrow request form
    pub async fn types_summary(&self) -> AppResult<Vec<EquipmentTypeSummary>> {
        let rows = sqlx::query_as::<_, EquipmentTypeSummary>(
            r#"
            SELECT equipment_type,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 0) AS available
            FROM equipment
            WHERE status != 5
            GROUP BY equipment_type
            ORDER BY equipment_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Check if a serial number already exists
    pub async fn serial_exists(&self, serial_number: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM equipment
                WHERE serial_number = $1 AND ($2::integer IS NULL OR id != $2)
            )
            "#,
        )
        .bind(serial_number)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a unit, logging ADD_EQUIPMENT in the same transaction
    pub async fn create(&self, data: &CreateEquipment, actor: &Actor) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (name, serial_number, equipment_type, status, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.serial_number)
        .bind(&data.equipment_type)
        .bind(EquipmentStatus::Available)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::AddEquipment,
            actor,
            serde_json::json!({
                "equipment_id": row.id,
                "name": row.name,
                "serial_number": row.serial_number,
                "equipment_type": row.equipment_type,
            }),
        )
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Bulk import of units, one transaction and one IMPORT_EQUIPMENT entry
    pub async fn import(&self, items: &[CreateEquipment], actor: &Actor) -> AppResult<Vec<Equipment>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(items.len());

        for data in items {
            let row = sqlx::query_as::<_, Equipment>(
                r#"
                INSERT INTO equipment (name, serial_number, equipment_type, status, notes)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(&data.name)
            .bind(&data.serial_number)
            .bind(&data.equipment_type)
            .bind(EquipmentStatus::Available)
            .bind(&data.notes)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::ImportEquipment,
            actor,
            serde_json::json!({
                "count": created.len(),
                "equipment_ids": created.iter().map(|e| e.id).collect::<Vec<_>>(),
            }),
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Update a unit. A status change must follow a legal lifecycle edge;
    /// only the maintenance exit (under_maintenance -> available) is open
    /// to direct edits, everything else belongs to the workflow.
    pub async fn update(&self, id: i32, data: &UpdateEquipment, actor: &Actor) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;

        if let Some(new_status) = data.status {
            // Only the maintenance exit is open to direct edits; it is the
            // CompleteRepair edge applied by hand for units that went to
            // maintenance without a repair request (pre-delivery faults).
            let maintenance_exit = current.status == EquipmentStatus::UnderMaintenance
                && new_status == current.status.apply(EquipmentEvent::CompleteRepair)?;
            if new_status != current.status && !maintenance_exit {
                return Err(AppError::Validation(format!(
                    "Illegal equipment transition: status can only be edited from under_maintenance to available, not {} to {}",
                    current.status, new_status
                )));
            }
        }

        let row = sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment SET
                name = COALESCE($2, name),
                serial_number = COALESCE($3, serial_number),
                equipment_type = COALESCE($4, equipment_type),
                status = COALESCE($5, status),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.serial_number)
        .bind(&data.equipment_type)
        .bind(data.status)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::UpdateEquipment,
            actor,
            serde_json::json!({
                "equipment_id": row.id,
                "serial_number": row.serial_number,
                "status": row.status,
            }),
        )
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Soft delete: status becomes deleted, the row is never removed.
    /// Refused while the unit is bound to an active borrow.
    pub async fn soft_delete(&self, id: i32, actor: &Actor) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;

        let next = current.status.apply(EquipmentEvent::Retire)?;

        sqlx::query("UPDATE equipment SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::DeleteEquipment,
            actor,
            serde_json::json!({
                "equipment_id": id,
                "serial_number": current.serial_number,
            }),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Count units per status (for stats)
    pub async fn count_by_status(&self, status: EquipmentStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
