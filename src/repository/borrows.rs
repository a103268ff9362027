//! Borrow lifecycle repository
//!
//! Owns the borrow request state machine from submission through approval,
//! delivery, return and post-return assessment. Every operation is one
//! transaction: the request update, the equipment updates and the activity
//! log entry commit together or not at all. Approval locks the candidate
//! equipment rows (`FOR UPDATE`), so two concurrent approvals over the same
//! pool serialize instead of double-binding units.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, Actor},
        assessment::{Assessment, ChecklistItem, DeliveryAssessmentRequest, ReturnAssessmentRequest},
        borrow::{
            BorrowAssignment, BorrowDetails, BorrowLine, BorrowQuery, BorrowRequest,
            BorrowReturnedItem, CreateBorrowRequest,
        },
        enums::{
            AssessmentOutcome, AssessmentStage, BorrowEvent, BorrowStatus, EquipmentEvent,
            EquipmentStatus,
        },
        equipment::Equipment,
        repair::RepairRequest,
        user::User,
    },
};

use super::activity::ActivityRepository;

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

/// Pick concrete units for every demand line, in list order.
///
/// `pool` maps an equipment type to its available units, already sorted by
/// the assignment tie-break (oldest created_at first, then id). The whole
/// plan fails on the first line that cannot be filled; the caller must not
/// have written anything yet.
fn plan_assignments<'a>(
    lines: &[BorrowLine],
    pool: &'a HashMap<String, Vec<Equipment>>,
) -> AppResult<Vec<&'a Equipment>> {
    let mut cursor: HashMap<&str, usize> = HashMap::new();
    let mut picked = Vec::new();

    for line in lines {
        let units = pool.get(line.equipment_type.as_str());
        let offset = cursor.entry(line.equipment_type.as_str()).or_insert(0);
        let remaining = units.map(|u| u.len() - *offset).unwrap_or(0);

        if remaining < line.quantity as usize {
            return Err(AppError::Validation(format!(
                "Insufficient equipment available for type \"{}\": requested {}, available {}",
                line.equipment_type, line.quantity, remaining
            )));
        }

        let units = units.expect("non-empty pool checked above");
        picked.extend(units[*offset..*offset + line.quantity as usize].iter());
        *offset += line.quantity as usize;
    }

    Ok(picked)
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow request by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BorrowRequest> {
        sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request {} not found", id)))
    }

    /// Lock the request row for the duration of a workflow transaction
    async fn lock_request(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<BorrowRequest> {
        sqlx::query_as::<_, BorrowRequest>(
            "SELECT * FROM borrow_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow request {} not found", id)))
    }

    /// Lock an equipment row for the duration of a workflow transaction
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

    async fn set_equipment_status(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        status: EquipmentStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE equipment SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn set_request_status(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        status: BorrowStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE borrow_requests SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Full borrow detail: request, demand lines, assignments, returned
    /// snapshots and assessments
    pub async fn get_details(&self, id: i32) -> AppResult<BorrowDetails> {
        let request = self.get_by_id(id).await?;

        let lines = sqlx::query_as::<_, BorrowLine>(
            "SELECT * FROM borrow_request_lines WHERE borrow_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let equipment_assigned = sqlx::query_as::<_, BorrowAssignment>(
            "SELECT * FROM borrow_assignments WHERE borrow_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let equipment_returned = sqlx::query_as::<_, BorrowReturnedItem>(
            "SELECT * FROM borrow_returned_items WHERE borrow_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let assessments = sqlx::query_as::<_, Assessment>(
            "SELECT * FROM assessments WHERE borrow_id = $1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BorrowDetails {
            request,
            lines,
            equipment_assigned,
            equipment_returned,
            assessments,
        })
    }

    /// List borrow requests with optional status/user filters, newest first
    pub async fn list(&self, query: &BorrowQuery) -> AppResult<(Vec<BorrowRequest>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let rows = sqlx::query_as::<_, BorrowRequest>(
            r#"
            SELECT * FROM borrow_requests
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::integer IS NULL OR user_id = $2)
            ORDER BY request_date DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.status)
        .bind(query.user_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM borrow_requests
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::integer IS NULL OR user_id = $2)
            "#,
        )
        .bind(query.status)
        .bind(query.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Submit a borrow request. No availability check happens here; the
    /// request is accepted unconditionally and waits for approval.
    pub async fn create(
        &self,
        requester: &User,
        data: &CreateBorrowRequest,
        period_days: i64,
        actor: &Actor,
    ) -> AppResult<BorrowRequest> {
        let now = Utc::now();
        let due_date = now + Duration::days(period_days);

        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO borrow_requests
                (user_id, user_name, purpose, contact, status, request_date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(requester.id)
        .bind(&requester.display_name)
        .bind(&data.purpose)
        .bind(&data.contact)
        .bind(BorrowStatus::PendingBorrowApproval)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        for (position, line) in data.equipment_requests.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO borrow_request_lines (borrow_id, equipment_type, quantity, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(request.id)
            .bind(&line.equipment_type)
            .bind(line.quantity)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::CreateBorrowRequest,
            actor,
            serde_json::json!({
                "borrow_id": request.id,
                "user_id": requester.id,
                "user_name": requester.display_name,
                "equipment_requests": data.equipment_requests.iter()
                    .map(|l| serde_json::json!({
                        "equipment_type": l.equipment_type,
                        "quantity": l.quantity,
                    }))
                    .collect::<Vec<_>>(),
                "due_date": due_date,
            }),
        )
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    /// Approve a request and auto-assign equipment.
    ///
    /// Candidate rows are locked before the availability check, and the
    /// check for every demand line completes before the first write, so a
    /// shortfall on any line aborts with nothing mutated.
    pub async fn approve(&self, id: i32, actor: &Actor) -> AppResult<BorrowDetails> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        let next_status = request.status.apply(BorrowEvent::Approve)?;

        let lines = sqlx::query_as::<_, BorrowLine>(
            "SELECT * FROM borrow_request_lines WHERE borrow_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(AppError::Validation(format!(
                "Borrow request {} has no equipment lines",
                id
            )));
        }

        // Lock up to the needed number of available units per type.
        // Tie-break is deterministic: oldest unit first, then lowest id.
        let mut needed_per_type: HashMap<String, i64> = HashMap::new();
        for line in &lines {
            *needed_per_type.entry(line.equipment_type.clone()).or_insert(0) +=
                line.quantity as i64;
        }

        let mut available: HashMap<String, Vec<Equipment>> = HashMap::new();
        for (equipment_type, needed) in &needed_per_type {
            let units = sqlx::query_as::<_, Equipment>(
                r#"
                SELECT * FROM equipment
                WHERE equipment_type = $1 AND status = $2
                ORDER BY created_at, id
                LIMIT $3
                FOR UPDATE
                "#,
            )
            .bind(equipment_type)
            .bind(EquipmentStatus::Available)
            .bind(needed)
            .fetch_all(&mut *tx)
            .await?;
            available.insert(equipment_type.clone(), units);
        }

        // Every line is checked before any write is issued.
        let picked = plan_assignments(&lines, &available)?;

        let assigned_status = EquipmentStatus::Available.apply(EquipmentEvent::Assign)?;
        let mut assigned_detail = Vec::with_capacity(picked.len());
        for unit in &picked {
            sqlx::query(
                r#"
                INSERT INTO borrow_assignments
                    (borrow_id, equipment_id, name, serial_number, equipment_type)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(unit.id)
            .bind(&unit.name)
            .bind(&unit.serial_number)
            .bind(&unit.equipment_type)
            .execute(&mut *tx)
            .await?;

            Self::set_equipment_status(&mut tx, unit.id, assigned_status).await?;

            assigned_detail.push(serde_json::json!({
                "equipment_id": unit.id,
                "name": unit.name,
                "serial_number": unit.serial_number,
                "equipment_type": unit.equipment_type,
            }));
        }

        Self::set_request_status(&mut tx, id, next_status).await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::ApproveAndAutoAssignBorrow,
            actor,
            serde_json::json!({
                "borrow_id": id,
                "user_id": request.user_id,
                "user_name": request.user_name,
                "equipment_assigned": assigned_detail,
            }),
        )
        .await?;

        tx.commit().await?;
        self.get_details(id).await
    }

    /// Reject a request. No equipment was ever bound, none is touched.
    pub async fn reject(&self, id: i32, reason: Option<&str>, actor: &Actor) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        let next_status = request.status.apply(BorrowEvent::Reject)?;

        Self::set_request_status(&mut tx, id, next_status).await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::RejectBorrow,
            actor,
            serde_json::json!({
                "borrow_id": id,
                "user_id": request.user_id,
                "user_name": request.user_name,
                "reason": reason,
            }),
        )
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Pre-delivery assessment of one assigned unit.
    ///
    /// A normal checklist delivers the unit. An abnormal one sends the
    /// faulty unit to maintenance and swaps an available replacement of the
    /// same type into the assignment slot. The request becomes borrowed
    /// only when every assigned unit has been delivered.
    pub async fn assess_delivery(
        &self,
        id: i32,
        data: &DeliveryAssessmentRequest,
        actor: &Actor,
    ) -> AppResult<BorrowDetails> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        if request.status != BorrowStatus::PendingDelivery {
            return Err(AppError::Validation(format!(
                "Illegal borrow transition: request {} is {}, not awaiting delivery",
                id, request.status
            )));
        }

        let assignment = sqlx::query_as::<_, BorrowAssignment>(
            "SELECT * FROM borrow_assignments WHERE borrow_id = $1 AND equipment_id = $2",
        )
        .bind(id)
        .bind(data.equipment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Equipment {} is not assigned to borrow request {}",
                data.equipment_id, id
            ))
        })?;

        if assignment.delivered_at.is_some() {
            return Err(AppError::Validation(format!(
                "Equipment {} has already passed pre-delivery assessment",
                data.equipment_id
            )));
        }

        let outcome = ChecklistItem::outcome_of(&data.items);
        let unit = Self::lock_equipment(&mut tx, data.equipment_id).await?;

        match outcome {
            AssessmentOutcome::Normal => {
                let delivered = unit.status.apply(EquipmentEvent::Deliver)?;
                Self::set_equipment_status(&mut tx, unit.id, delivered).await?;

                sqlx::query(
                    "UPDATE borrow_assignments SET delivered_at = $1 WHERE id = $2",
                )
                .bind(now)
                .bind(assignment.id)
                .execute(&mut *tx)
                .await?;

                Self::insert_assessment(
                    &mut tx,
                    id,
                    unit.id,
                    AssessmentStage::PreDelivery,
                    &data.items,
                    outcome,
                    data.notes.as_deref(),
                    actor,
                )
                .await?;

                ActivityRepository::append_tx(
                    &mut tx,
                    ActivityAction::ConfirmDelivery,
                    actor,
                    serde_json::json!({
                        "borrow_id": id,
                        "equipment_id": unit.id,
                        "serial_number": unit.serial_number,
                    }),
                )
                .await?;
            }
            AssessmentOutcome::Abnormal => {
                let replacement_id = data.replacement_id.ok_or_else(|| {
                    AppError::Validation(
                        "A replacement unit is required when the checklist is abnormal"
                            .to_string(),
                    )
                })?;

                let faulty_next = unit.status.apply(EquipmentEvent::FailPreDelivery)?;

                let replacement = Self::lock_equipment(&mut tx, replacement_id).await?;
                if replacement.equipment_type != assignment.equipment_type {
                    return Err(AppError::Validation(format!(
                        "Replacement {} is type \"{}\", expected \"{}\"",
                        replacement.id, replacement.equipment_type, assignment.equipment_type
                    )));
                }
                let replacement_next =
                    replacement.status.apply(EquipmentEvent::AssignReplacement)?;

                Self::set_equipment_status(&mut tx, unit.id, faulty_next).await?;
                Self::set_equipment_status(&mut tx, replacement.id, replacement_next).await?;

                // The faulty unit's slot now references the replacement
                sqlx::query(
                    r#"
                    UPDATE borrow_assignments SET
                        equipment_id = $1,
                        name = $2,
                        serial_number = $3,
                        equipment_type = $4,
                        delivered_at = $5
                    WHERE id = $6
                    "#,
                )
                .bind(replacement.id)
                .bind(&replacement.name)
                .bind(&replacement.serial_number)
                .bind(&replacement.equipment_type)
                .bind(now)
                .bind(assignment.id)
                .execute(&mut *tx)
                .await?;

                Self::insert_assessment(
                    &mut tx,
                    id,
                    unit.id,
                    AssessmentStage::PreDelivery,
                    &data.items,
                    outcome,
                    data.notes.as_deref(),
                    actor,
                )
                .await?;

                ActivityRepository::append_tx(
                    &mut tx,
                    ActivityAction::ChangeEquipmentAndDeliver,
                    actor,
                    serde_json::json!({
                        "borrow_id": id,
                        "faulty_equipment_id": unit.id,
                        "faulty_serial_number": unit.serial_number,
                        "replacement_equipment_id": replacement.id,
                        "replacement_serial_number": replacement.serial_number,
                    }),
                )
                .await?;
            }
        }

        // The request transitions only once every assigned unit is delivered
        let undelivered: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_assignments WHERE borrow_id = $1 AND delivered_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if undelivered == 0 {
            let next = request.status.apply(BorrowEvent::DeliverAll)?;
            Self::set_request_status(&mut tx, id, next).await?;
        }

        tx.commit().await?;
        self.get_details(id).await
    }

    /// Process the return of a borrowed request. Equipment statuses are
    /// untouched until post-return assessment decides each unit's fate.
    pub async fn process_return(&self, id: i32, actor: &Actor) -> AppResult<BorrowDetails> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        let next_status = request.status.apply(BorrowEvent::Return)?;

        sqlx::query(
            r#"
            UPDATE borrow_requests
            SET status = $1, returned_date = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(next_status)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // equipment_returned is a snapshot of the assignments at return time
        sqlx::query(
            r#"
            INSERT INTO borrow_returned_items
                (borrow_id, equipment_id, name, serial_number, equipment_type, returned_at)
            SELECT borrow_id, equipment_id, name, serial_number, equipment_type, $2
            FROM borrow_assignments
            WHERE borrow_id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::ProcessReturn,
            actor,
            serde_json::json!({
                "borrow_id": id,
                "user_id": request.user_id,
                "user_name": request.user_name,
                "returned_date": now,
            }),
        )
        .await?;

        tx.commit().await?;
        self.get_details(id).await
    }

    /// Post-return assessment of one returned unit.
    ///
    /// A normal checklist releases the unit back to the available pool. An
    /// abnormal one parks it pending repair approval and spawns a repair
    /// request linked to this assessment. The request completes once every
    /// returned unit has been assessed.
    pub async fn assess_return(
        &self,
        id: i32,
        data: &ReturnAssessmentRequest,
        actor: &Actor,
    ) -> AppResult<BorrowDetails> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        if request.status != BorrowStatus::ReturnedPendingAssessment {
            return Err(AppError::Validation(format!(
                "Illegal borrow transition: request {} is {}, not awaiting post-return assessment",
                id, request.status
            )));
        }

        let returned: Option<BorrowReturnedItem> = sqlx::query_as(
            "SELECT * FROM borrow_returned_items WHERE borrow_id = $1 AND equipment_id = $2",
        )
        .bind(id)
        .bind(data.equipment_id)
        .fetch_optional(&mut *tx)
        .await?;
        let returned = returned.ok_or_else(|| {
            AppError::Validation(format!(
                "Equipment {} was not returned with borrow request {}",
                data.equipment_id, id
            ))
        })?;

        let already_assessed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM assessments
                WHERE borrow_id = $1 AND equipment_id = $2 AND stage = $3
            )
            "#,
        )
        .bind(id)
        .bind(data.equipment_id)
        .bind(AssessmentStage::PostReturn)
        .fetch_one(&mut *tx)
        .await?;

        if already_assessed {
            return Err(AppError::Validation(format!(
                "Equipment {} has already been assessed for borrow request {}",
                data.equipment_id, id
            )));
        }

        let outcome = ChecklistItem::outcome_of(&data.items);
        let unit = Self::lock_equipment(&mut tx, data.equipment_id).await?;

        let assessment_id = Self::insert_assessment(
            &mut tx,
            id,
            unit.id,
            AssessmentStage::PostReturn,
            &data.items,
            outcome,
            data.notes.as_deref(),
            actor,
        )
        .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::PostAssessment,
            actor,
            serde_json::json!({
                "borrow_id": id,
                "equipment_id": unit.id,
                "serial_number": returned.serial_number,
                "outcome": outcome,
            }),
        )
        .await?;

        match outcome {
            AssessmentOutcome::Normal => {
                let next = unit.status.apply(EquipmentEvent::ReturnNormal)?;
                Self::set_equipment_status(&mut tx, unit.id, next).await?;
            }
            AssessmentOutcome::Abnormal => {
                let damage = data.damage_description.as_deref().ok_or_else(|| {
                    AppError::Validation(
                        "A damage description is required when the checklist is abnormal"
                            .to_string(),
                    )
                })?;

                let next = unit.status.apply(EquipmentEvent::FailPostReturn)?;
                Self::set_equipment_status(&mut tx, unit.id, next).await?;

                let repair = sqlx::query_as::<_, RepairRequest>(
                    r#"
                    INSERT INTO repair_requests
                        (equipment_id, borrow_id, assessment_id, damage_description, estimated_cost)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(unit.id)
                .bind(id)
                .bind(assessment_id)
                .bind(damage)
                .bind(data.estimated_cost)
                .fetch_one(&mut *tx)
                .await?;

                ActivityRepository::append_tx(
                    &mut tx,
                    ActivityAction::CreateRepairRequestFromAssessment,
                    actor,
                    serde_json::json!({
                        "repair_id": repair.id,
                        "borrow_id": id,
                        "equipment_id": unit.id,
                        "assessment_id": assessment_id,
                        "damage_description": damage,
                        "estimated_cost": data.estimated_cost,
                    }),
                )
                .await?;
            }
        }

        // The request completes only once every returned unit is assessed
        let unassessed: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM borrow_returned_items r
            WHERE r.borrow_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM assessments a
                  WHERE a.borrow_id = r.borrow_id
                    AND a.equipment_id = r.equipment_id
                    AND a.stage = $2
              )
            "#,
        )
        .bind(id)
        .bind(AssessmentStage::PostReturn)
        .fetch_one(&mut *tx)
        .await?;

        if unassessed == 0 {
            let next = request.status.apply(BorrowEvent::AssessAll)?;
            Self::set_request_status(&mut tx, id, next).await?;
        }

        tx.commit().await?;
        self.get_details(id).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_assessment(
        tx: &mut Transaction<'_, Postgres>,
        borrow_id: i32,
        equipment_id: i32,
        stage: AssessmentStage,
        items: &[ChecklistItem],
        outcome: AssessmentOutcome,
        notes: Option<&str>,
        actor: &Actor,
    ) -> AppResult<i32> {
        let assessment_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO assessments
                (borrow_id, equipment_id, stage, items, outcome, notes, assessed_by, assessed_by_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(borrow_id)
        .bind(equipment_id)
        .bind(stage)
        .bind(sqlx::types::Json(items))
        .bind(outcome)
        .bind(notes)
        .bind(actor.id)
        .bind(&actor.name)
        .fetch_one(&mut **tx)
        .await?;
        Ok(assessment_id)
    }

    /// Count active borrows (approved or out, not yet completed)
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE status IN ($1, $2, $3)",
        )
        .bind(BorrowStatus::PendingDelivery)
        .bind(BorrowStatus::Borrowed)
        .bind(BorrowStatus::ReturnedPendingAssessment)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count requests in a given status (for stats)
    pub async fn count_by_status(&self, status: BorrowStatus) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrow_requests WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count overdue borrows (past due date and still out)
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE status = $1 AND due_date < NOW()",
        )
        .bind(BorrowStatus::Borrowed)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn unit(id: i32, equipment_type: &str, day: u32) -> Equipment {
        let created = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        Equipment {
            id,
            name: format!("Unit {}", id),
            serial_number: format!("SN-{:04}", id),
            equipment_type: equipment_type.to_string(),
            status: EquipmentStatus::Available,
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn line(equipment_type: &str, quantity: i32, position: i32) -> BorrowLine {
        BorrowLine {
            id: position + 1,
            borrow_id: 1,
            equipment_type: equipment_type.to_string(),
            quantity,
            position,
        }
    }

    #[test]
    fn planner_fills_lines_in_order() {
        let mut pool = HashMap::new();
        pool.insert(
            "ULV sprayer".to_string(),
            vec![unit(1, "ULV sprayer", 1), unit(2, "ULV sprayer", 2)],
        );
        pool.insert("fog machine".to_string(), vec![unit(3, "fog machine", 1)]);

        let lines = vec![line("ULV sprayer", 2, 0), line("fog machine", 1, 1)];
        let picked = plan_assignments(&lines, &pool).unwrap();

        assert_eq!(
            picked.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn planner_fails_whole_sale_on_shortfall() {
        let mut pool = HashMap::new();
        pool.insert("ULV sprayer".to_string(), vec![unit(1, "ULV sprayer", 1)]);

        let lines = vec![line("ULV sprayer", 2, 0)];
        let err = plan_assignments(&lines, &pool).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("requested 2"));
        assert!(msg.contains("available 1"));
    }

    #[test]
    fn planner_fails_on_unknown_type() {
        let pool = HashMap::new();
        let lines = vec![line("fog machine", 1, 0)];
        assert!(plan_assignments(&lines, &pool).is_err());
    }

    #[test]
    fn planner_shares_a_type_pool_across_lines() {
        // Two lines asking for the same type must not double-pick a unit
        let mut pool = HashMap::new();
        pool.insert(
            "sprayer".to_string(),
            vec![
                unit(1, "sprayer", 1),
                unit(2, "sprayer", 2),
                unit(3, "sprayer", 3),
            ],
        );

        let lines = vec![line("sprayer", 2, 0), line("sprayer", 1, 1)];
        let picked = plan_assignments(&lines, &pool).unwrap();
        assert_eq!(
            picked.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        // A fourth unit is not there to pick
        let lines = vec![line("sprayer", 2, 0), line("sprayer", 2, 1)];
        assert!(plan_assignments(&lines, &pool).is_err());
    }
}
