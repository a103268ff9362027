//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        activity::Actor,
        user::{CreateUser, Role, UpdateUser, User, UserClaims, UserQuery, UserStatus},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by login and return a JWT token with the user
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if user.status == UserStatus::Blocked {
            return Err(AppError::Authentication("Account is blocked".to_string()));
        }

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid login or password".to_string(),
            ));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            display_name: user.display_name.clone(),
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let hash = match &user.password {
            Some(h) => h,
            None => return Ok(false),
        };
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Create the bootstrap admin account on an empty database so the
    /// instance is reachable on first start
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        if self.repository.users.count_all().await? > 0 {
            return Ok(());
        }

        let password_hash = self.hash_password(&self.config.bootstrap_password)?;
        let system = Actor {
            id: 0,
            name: "system".to_string(),
        };
        let admin = self
            .repository
            .users
            .create(
                "admin",
                &password_hash,
                "Administrator",
                None,
                None,
                Role::Admin,
                &system,
            )
            .await?;

        tracing::warn!(
            "Created bootstrap admin account (id {}); change its password",
            admin.id
        );
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query).await
    }

    pub async fn create_user(&self, data: CreateUser, actor: &Actor) -> AppResult<User> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.users.login_exists(&data.login, None).await? {
            return Err(AppError::Conflict(format!(
                "Login \"{}\" already exists",
                data.login
            )));
        }

        let password_hash = self.hash_password(&data.password)?;
        self.repository
            .users
            .create(
                &data.login,
                &password_hash,
                &data.display_name,
                data.email.as_deref(),
                data.phone.as_deref(),
                data.role.unwrap_or(Role::Requester),
                actor,
            )
            .await
    }

    pub async fn update_user(&self, id: i32, data: UpdateUser, actor: &Actor) -> AppResult<User> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(ref login) = data.login {
            if self.repository.users.login_exists(login, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Login \"{}\" already exists",
                    login
                )));
            }
        }

        let password_hash = match data.password.as_deref() {
            Some(p) => Some(self.hash_password(p)?),
            None => None,
        };

        self.repository
            .users
            .update(
                id,
                data.login.as_deref(),
                password_hash.as_deref(),
                data.display_name.as_deref(),
                data.email.as_deref(),
                data.phone.as_deref(),
                data.role,
                data.status,
                actor,
            )
            .await
    }

    pub async fn delete_user(&self, id: i32, actor: &Actor) -> AppResult<()> {
        if id == actor.id {
            return Err(AppError::Validation(
                "Cannot delete your own account".to_string(),
            ));
        }
        self.repository.users.soft_delete(id, actor).await
    }
}
