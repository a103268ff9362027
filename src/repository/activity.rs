//! Activity log repository

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::AppResult,
    models::activity::{ActivityAction, ActivityEntry, ActivityQuery, Actor},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: Pool<Postgres>,
}

impl ActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry inside an open transaction. Workflow mutations call
    /// this so the entry commits or rolls back with the mutation itself.
    pub async fn append_tx(
        tx: &mut Transaction<'_, Postgres>,
        action: ActivityAction,
        actor: &Actor,
        detail: serde_json::Value,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (action, actor_id, actor_name, detail)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(action.as_str())
        .bind(actor.id)
        .bind(&actor.name)
        .bind(detail)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// List entries, newest first, with optional action/actor filters
    pub async fn list(&self, query: &ActivityQuery) -> AppResult<(Vec<ActivityEntry>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);

        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT * FROM activity_log
            WHERE ($1::varchar IS NULL OR action = $1)
              AND ($2::integer IS NULL OR actor_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&query.action)
        .bind(query.actor_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_log
            WHERE ($1::varchar IS NULL OR action = $1)
              AND ($2::integer IS NULL OR actor_id = $2)
            "#,
        )
        .bind(&query.action)
        .bind(query.actor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((entries, total))
    }
}
