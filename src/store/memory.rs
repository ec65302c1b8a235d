use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::error::AppError;
use crate::models::{NewUser, ProfileUpdate, User};
use crate::store::UserStore;

/// In-memory account store. Backs the integration tests and is handy for
/// running the API locally without Postgres; it mirrors `PgUserStore`
/// behavior including duplicate-email conflicts and reset-secret expiry.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    next_id: i32,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already in use".into()));
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            name: new_user.name,
            email: new_user.email,
            photo: new_user.photo,
            role: new_user.role,
            password_hash: new_user.password_hash,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| {
                u.password_reset_token.as_deref() == Some(token_hash)
                    && u.password_reset_expires.map_or(false, |exp| exp > now)
            })
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.clone())
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, AppError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(new_email) = &update.email {
            let new_email = new_email.to_lowercase();
            if inner.users.iter().any(|u| u.id != id && u.email == new_email) {
                return Err(AppError::Conflict("Email already in use".into()));
            }
        }

        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email.to_lowercase();
        }
        if let Some(photo) = update.photo {
            user.photo = photo;
        }
        Ok(user.clone())
    }

    async fn set_password(
        &self,
        id: i32,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        user.password_hash = password_hash.to_string();
        user.password_changed_at = Some(changed_at);
        user.password_reset_token = None;
        user.password_reset_expires = None;
        Ok(user.clone())
    }

    async fn set_reset_secret(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        user.password_reset_token = Some(token_hash.to_string());
        user.password_reset_expires = Some(expires_at);
        Ok(())
    }

    async fn clear_reset_secret(&self, id: i32) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.password_reset_token = None;
            user.password_reset_expires = None;
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{user::DEFAULT_PHOTO, Role};
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "A".to_string(),
            email: email.to_string(),
            photo: DEFAULT_PHOTO.to_string(),
            role: Role::User,
            password_hash: "hash".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@x.com")).await.unwrap();

        let err = store.create(new_user("a@x.com")).await.unwrap_err();
        assert_eq!(err, AppError::Conflict("Email already in use".into()));
    }

    #[actix_rt::test]
    async fn test_reset_token_lookup_respects_expiry() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("b@x.com")).await.unwrap();
        let now = Utc::now();

        store
            .set_reset_secret(user.id, "digest", now + Duration::minutes(10))
            .await
            .unwrap();

        assert!(store
            .find_by_reset_token("digest", now)
            .await
            .unwrap()
            .is_some());
        // Same digest, but presented after the window has elapsed.
        assert!(store
            .find_by_reset_token("digest", now + Duration::minutes(11))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_reset_token("wrong-digest", now)
            .await
            .unwrap()
            .is_none());
    }

    #[actix_rt::test]
    async fn test_set_password_clears_pending_secret() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("c@x.com")).await.unwrap();
        let now = Utc::now();

        store
            .set_reset_secret(user.id, "digest", now + Duration::minutes(10))
            .await
            .unwrap();
        let updated = store.set_password(user.id, "newhash", now).await.unwrap();

        assert_eq!(updated.password_hash, "newhash");
        assert_eq!(updated.password_changed_at, Some(now));
        assert!(updated.password_reset_token.is_none());
        assert!(updated.password_reset_expires.is_none());
    }

    #[actix_rt::test]
    async fn test_initial_creation_leaves_changed_at_unset() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("d@x.com")).await.unwrap();
        assert!(user.password_changed_at.is_none());
    }
}
