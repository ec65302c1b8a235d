use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const DEFAULT_PHOTO: &str = "defaultImg.png";

/// Account role. Self-service signup always produces `User`; `Admin` accounts
/// are only created by an already-authenticated admin.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// An account record as stored in the database.
///
/// The password hash and the pending reset-secret fields never leave the
/// server: they are skipped on serialization, so any handler that returns a
/// `User` returns the sanitized form by construction.
#[derive(Debug, Serialize, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// True iff the password was changed strictly after `issued_at` (seconds
    /// since epoch, as carried in a token's `iat` claim). Used to invalidate
    /// every token minted before a password change.
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => changed_at.timestamp() > issued_at,
            None => false,
        }
    }
}

/// Timestamp recorded as `password_changed_at` when a password changes after
/// initial creation. Backdated by one second so a token minted immediately
/// after the change cannot carry an `iat` earlier than the stamp.
pub fn backdated_change_stamp() -> DateTime<Utc> {
    Utc::now() - Duration::seconds(1)
}

/// Fields required to insert a new account. The role is always assigned by
/// the server-side flow, never taken from the client payload.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
    pub password_hash: String,
}

/// Self-service profile update. Unknown fields are rejected outright, so a
/// request smuggling `password` or `role` alongside profile fields fails
/// instead of being silently ignored.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub photo: Option<String>,
}
