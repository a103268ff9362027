//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, Actor},
        user::{Role, User, UserQuery, UserStatus},
    },
};

use super::activity::ActivityRepository;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by login (primary authentication method), excluding deleted
    pub async fn get_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(login) = LOWER($1) AND status != 2",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Count all non-deleted users
    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status != 2")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Check if login already exists
    pub async fn login_exists(&self, login: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(login) = LOWER($1) AND ($2::integer IS NULL OR id != $2)
            )
            "#,
        )
        .bind(login)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// List users with name search and pagination, excluding deleted
    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let name_pattern = query.name.as_ref().map(|n| format!("%{}%", n));

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE status != 2
              AND ($1::varchar IS NULL OR display_name ILIKE $1 OR login ILIKE $1)
              AND ($2::smallint IS NULL OR role = $2)
            ORDER BY display_name, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&name_pattern)
        .bind(query.role)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE status != 2
              AND ($1::varchar IS NULL OR display_name ILIKE $1 OR login ILIKE $1)
              AND ($2::smallint IS NULL OR role = $2)
            "#,
        )
        .bind(&name_pattern)
        .bind(query.role)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }

    /// Create a user. The password arrives already hashed from the service.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        login: &str,
        password_hash: &str,
        display_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        role: Role,
        actor: &Actor,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password, display_name, email, phone, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .bind(display_name)
        .bind(email)
        .bind(phone)
        .bind(role)
        .bind(UserStatus::Active)
        .fetch_one(&mut *tx)
        .await?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::CreateUser,
            actor,
            serde_json::json!({
                "user_id": user.id,
                "login": user.login,
                "role": user.role,
            }),
        )
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Update a user. Optional fields keep their current value.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: i32,
        login: Option<&str>,
        password_hash: Option<&str>,
        display_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        role: Option<Role>,
        status: Option<UserStatus>,
        actor: &Actor,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                login = COALESCE($2, login),
                password = COALESCE($3, password),
                display_name = COALESCE($4, display_name),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                role = COALESCE($7, role),
                status = COALESCE($8, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(login)
        .bind(password_hash)
        .bind(display_name)
        .bind(email)
        .bind(phone)
        .bind(role)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::UpdateUser,
            actor,
            serde_json::json!({
                "user_id": user.id,
                "login": user.login,
            }),
        )
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Soft delete: status becomes deleted, the row is never removed
    pub async fn soft_delete(&self, id: i32, actor: &Actor) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET status = $1, updated_at = NOW() WHERE id = $2 AND status != $1",
        )
        .bind(UserStatus::Deleted)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        ActivityRepository::append_tx(
            &mut tx,
            ActivityAction::DeleteUser,
            actor,
            serde_json::json!({ "user_id": id }),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
