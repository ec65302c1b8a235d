pub mod extractors;
pub mod middleware;
pub mod password;
pub mod reset;
pub mod token;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;
use crate::models::User;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::{AuthMiddleware, RoleGuard};
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "jwt";

/// Payload for self-service signup. Deliberately carries no role field: the
/// role is server-assigned, so a client cannot grant itself `admin`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub password_confirm: String,
    pub photo: Option<String>,
}

/// Payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide a password"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

/// New password accompanying a raw reset secret from a reset link.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub password_confirm: String,
}

/// Password change for an already-authenticated account.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Please provide your current password"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub password_confirm: String,
}

/// Response body for every flow that issues a session token. The embedded
/// user serializes without its password hash or reset-secret fields.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// The confirmation check applied before any new password is committed.
pub fn ensure_passwords_match(password: &str, confirm: &str) -> Result<(), AppError> {
    if password != confirm {
        return Err(AppError::Validation("Passwords are not the same".into()));
    }
    Ok(())
}

/// Computes the session cookie for one response at call time.
///
/// Attributes derive from the current config rather than from state baked in
/// at process start: httpOnly always, cross-site capable, Secure outside
/// development.
pub fn session_cookie(token: &str, config: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_owned())
        .path("/")
        .http_only(true)
        .same_site(SameSite::None)
        .secure(config.is_production())
        .max_age(CookieDuration::days(config.cookie_expires_days))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn config(environment: Environment) -> Config {
        Config {
            database_url: String::new(),
            server_port: 8080,
            server_host: "127.0.0.1".to_string(),
            environment,
            cookie_expires_days: 7,
        }
    }

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
            password_confirm: "secret123".to_string(),
            photo: None,
        };
        assert!(valid.validate().is_ok());

        let bad_email = SignupRequest {
            email: "not-an-email".to_string(),
            ..valid_signup()
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            password: "short".to_string(),
            ..valid_signup()
        };
        assert!(short_password.validate().is_err());
    }

    fn valid_signup() -> SignupRequest {
        SignupRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
            password_confirm: "secret123".to_string(),
            photo: None,
        }
    }

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid_email = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email.validate().is_err());

        let empty_password = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(empty_password.validate().is_err());
    }

    #[test]
    fn test_password_confirmation_check() {
        assert!(ensure_passwords_match("secret123", "secret123").is_ok());

        let err = ensure_passwords_match("secret123", "secret124").unwrap_err();
        assert_eq!(
            err,
            AppError::Validation("Passwords are not the same".into())
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok123", &config(Environment::Development));

        assert_eq!(cookie.name(), "jwt");
        assert_eq!(cookie.value(), "tok123");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(7)));

        let cookie = session_cookie("tok123", &config(Environment::Production));
        assert_eq!(cookie.secure(), Some(true));
    }
}
