//! The account document store.
//!
//! Auth flows depend on this trait rather than on a concrete driver so the
//! security-sensitive logic can be exercised against `InMemoryUserStore`
//! while production runs on `PgUserStore`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{NewUser, ProfileUpdate, User};

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new account. A duplicate email fails with
    /// `AppError::Conflict`.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Lookup by (lowercased) email. Returns the full record including the
    /// password hash; sanitization happens at serialization.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Finds the account holding this reset-secret digest, but only while the
    /// secret's expiry is still in the future at `now`.
    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    async fn list(&self) -> Result<Vec<User>, AppError>;

    /// Applies a partial profile update (name/email/photo). Fails with
    /// `AppError::NotFound` for an unknown id.
    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, AppError>;

    /// Replaces the password hash, records `changed_at`, and clears any
    /// pending reset secret in the same write.
    async fn set_password(
        &self,
        id: i32,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, AppError>;

    /// Stores a pending reset secret, replacing any previous one. At most one
    /// pending secret exists per account.
    async fn set_reset_secret(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Discards the pending reset secret, if any.
    async fn clear_reset_secret(&self, id: i32) -> Result<(), AppError>;

    async fn delete(&self, id: i32) -> Result<(), AppError>;
}
