use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims encoded within a session JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the account id.
    pub sub: i32,
    /// Issue timestamp (seconds since epoch). Compared against the account's
    /// `password_changed_at` by the authorization pipeline.
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET not set".into()))
}

fn expiry_hours() -> i64 {
    std::env::var("JWT_EXPIRES_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(24)
}

/// Generates a signed session token for a given account id.
///
/// The token expires `JWT_EXPIRES_HOURS` (default 24) after issuance and is
/// signed with `JWT_SECRET`. Tokens are never persisted or individually
/// revoked; a password change invalidates all tokens issued before it.
pub fn generate_token(user_id: i32) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::hours(expiry_hours()))
        .expect("valid timestamp");

    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Verifies a session token's signature and expiry and decodes its claims.
///
/// Purely cryptographic: no data store is consulted. Expired tokens fail with
/// `AppError::SessionExpired`, every other defect with
/// `AppError::InvalidSession`.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref JWT_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    // Runs test logic with a temporarily set JWT_SECRET, serialized against
    // other env-touching tests in this binary.
    fn run_with_temp_jwt_secret<F>(secret_value: &str, test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = JWT_ENV_LOCK.lock().unwrap();

        let original_secret_val = std::env::var("JWT_SECRET").ok();
        std::env::set_var("JWT_SECRET", secret_value);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        if let Some(original) = original_secret_val {
            std::env::set_var("JWT_SECRET", original);
        } else {
            std::env::remove_var("JWT_SECRET");
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }

    #[test]
    fn test_token_generation_and_verification() {
        run_with_temp_jwt_secret("test_secret_for_gen_verify", || {
            let user_id = 1;
            let before = chrono::Utc::now().timestamp();
            let token = generate_token(user_id).unwrap();
            let claims = verify_token(&token).unwrap();

            assert_eq!(claims.sub, user_id);
            assert!(claims.iat >= before);
            assert!(claims.exp > claims.iat);
        });
    }

    #[test]
    fn test_expired_token_fails_with_expired_kind() {
        run_with_temp_jwt_secret("test_secret_for_expiration", || {
            let now = chrono::Utc::now().timestamp();
            let claims = Claims {
                sub: 2,
                iat: now - 7200,
                exp: now - 3600,
            };
            let expired_token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret("test_secret_for_expiration".as_bytes()),
            )
            .unwrap();

            assert_eq!(
                verify_token(&expired_token).unwrap_err(),
                AppError::SessionExpired
            );
        });
    }

    #[test]
    fn test_tampered_signature_fails_with_invalid_kind() {
        run_with_temp_jwt_secret("a_completely_different_secret", || {
            let now = chrono::Utc::now().timestamp();
            let claims = Claims {
                sub: 3,
                iat: now,
                exp: now + 3600,
            };
            let foreign_token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret("some_other_secret".as_bytes()),
            )
            .unwrap();

            assert_eq!(
                verify_token(&foreign_token).unwrap_err(),
                AppError::InvalidSession
            );
            assert_eq!(
                verify_token("not-even-a-jwt").unwrap_err(),
                AppError::InvalidSession
            );
        });
    }
}
