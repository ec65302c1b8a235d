use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{NewUser, ProfileUpdate, User};
use crate::store::UserStore;

const USER_COLUMNS: &str = "id, name, email, photo, role, password_hash, \
     password_changed_at, password_reset_token, password_reset_expires, created_at";

/// Postgres-backed account store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (name, email, photo, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.photo)
            .bind(new_user.role)
            .bind(&new_user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("Email already in use".into())
                }
                other => other.into(),
            })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users \
             WHERE password_reset_token = $1 AND password_reset_expires > $2",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET \
               name = COALESCE($2, name), \
               email = COALESCE($3, email), \
               photo = COALESCE($4, photo) \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.email.map(|e| e.to_lowercase()))
            .bind(update.photo)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("Email already in use".into())
                }
                other => other.into(),
            })?;

        user.ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn set_password(
        &self,
        id: i32,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET \
               password_hash = $2, \
               password_changed_at = $3, \
               password_reset_token = NULL, \
               password_reset_expires = NULL \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(password_hash)
            .bind(changed_at)
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn set_reset_secret(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_expires = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn clear_reset_secret(&self, id: i32) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET password_reset_token = NULL, password_reset_expires = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }
}
