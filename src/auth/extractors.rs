use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// Extracts the authenticated account from request extensions.
///
/// Intended for routes behind `AuthMiddleware`, which validates the session
/// and inserts the loaded `User`. If no identity is attached the extractor
/// rejects with 401, so a handler that forgets the middleware fails closed.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<User>().cloned() {
            Some(user) => ready(Ok(AuthenticatedUser(user))),
            None => ready(Err(AppError::Unauthenticated.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::Utc;

    #[actix_rt::test]
    async fn test_extractor_returns_attached_identity() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(User {
            id: 42,
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            photo: "defaultImg.png".to_string(),
            role: Role::User,
            password_hash: "hash".to_string(),
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: Utc::now(),
        });

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.0.id, 42);
    }

    #[actix_rt::test]
    async fn test_extractor_fails_closed_without_identity() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = AuthenticatedUser::from_request(&req, &mut payload).await;
        assert!(result.is_err());

        let response = result.unwrap_err().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
