//! Request gates.
//!
//! `AuthMiddleware` authenticates a request: it extracts the session token,
//! verifies it, loads the account, rejects tokens that predate a password
//! change, and attaches the account to the request for downstream handlers.
//! `RoleGuard` is a second, stateless gate over the attached identity.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::token::verify_token;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::store::UserStore;

/// Pulls the session token off a request: `Authorization: Bearer <token>` is
/// preferred, the `jwt` cookie is the fallback for browser clients.
fn extract_session_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    bearer.or_else(|| req.cookie(super::SESSION_COOKIE).map(|c| c.value().to_string()))
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = extract_session_token(&req).ok_or(AppError::Unauthenticated)?;

            let claims = verify_token(&token)?;

            let store = req
                .app_data::<web::Data<dyn UserStore>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("user store is not configured".into()))?;

            // The account may have been deleted since the token was issued.
            let user = store
                .find_by_id(claims.sub)
                .await?
                .ok_or(AppError::StaleSession)?;

            if user.changed_password_after(claims.iat) {
                return Err(AppError::PasswordChanged.into());
            }

            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}

/// Role gate, applied after `AuthMiddleware`. Independent of how the identity
/// was authenticated: it only inspects the `User` already attached to the
/// request.
pub struct RoleGuard {
    allowed: Vec<Role>,
}

impl RoleGuard {
    pub fn new(allowed: &[Role]) -> Self {
        Self {
            allowed: allowed.to_vec(),
        }
    }

    pub fn admin() -> Self {
        Self::new(&[Role::Admin])
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RoleGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleGuardService {
            service,
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RoleGuardService<S> {
    service: S,
    allowed: Vec<Role>,
}

impl<S, B> Service<ServiceRequest> for RoleGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<User>().map(|user| user.role);

        match role {
            Some(role) if self.allowed.contains(&role) => Box::pin(self.service.call(req)),
            Some(_) => Box::pin(async move { Err(AppError::Forbidden.into()) }),
            None => Box::pin(async move { Err(AppError::Unauthenticated.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{test, App, HttpResponse};
    use chrono::Utc;

    #[actix_rt::test]
    async fn test_bearer_header_is_preferred_over_cookie() {
        let req = test::TestRequest::default()
            .insert_header(("Authorization", "Bearer header-token"))
            .cookie(Cookie::new("jwt", "cookie-token"))
            .to_srv_request();

        assert_eq!(
            extract_session_token(&req).as_deref(),
            Some("header-token")
        );
    }

    #[actix_rt::test]
    async fn test_cookie_fallback_and_absence() {
        let req = test::TestRequest::default()
            .cookie(Cookie::new("jwt", "cookie-token"))
            .to_srv_request();
        assert_eq!(
            extract_session_token(&req).as_deref(),
            Some("cookie-token")
        );

        let req = test::TestRequest::default().to_srv_request();
        assert_eq!(extract_session_token(&req), None);

        // A non-Bearer Authorization header does not count.
        let req = test::TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwdw=="))
            .to_srv_request();
        assert_eq!(extract_session_token(&req), None);
    }

    fn identity(role: Role) -> User {
        User {
            id: 1,
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            photo: "defaultImg.png".to_string(),
            role,
            password_hash: "hash".to_string(),
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: Utc::now(),
        }
    }

    async fn role_guard_status(attached: Option<User>) -> StatusCode {
        let app = test::init_service(
            App::new()
                .wrap_fn(move |req, srv| {
                    if let Some(user) = attached.clone() {
                        req.extensions_mut().insert(user);
                    }
                    srv.call(req)
                })
                .service(
                    web::scope("/admin")
                        .wrap(RoleGuard::admin())
                        .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri("/admin/ping").to_request();
        test::try_call_service(&app, req)
            .await
            .map(|resp| resp.status())
            .unwrap_or_else(|err| err.error_response().status())
    }

    #[actix_rt::test]
    async fn test_role_guard_accepts_admin() {
        assert_eq!(
            role_guard_status(Some(identity(Role::Admin))).await,
            StatusCode::OK
        );
    }

    #[actix_rt::test]
    async fn test_role_guard_rejects_plain_user_with_forbidden() {
        assert_eq!(
            role_guard_status(Some(identity(Role::User))).await,
            StatusCode::FORBIDDEN
        );
    }

    #[actix_rt::test]
    async fn test_role_guard_without_identity_is_unauthenticated() {
        assert_eq!(role_guard_status(None).await, StatusCode::UNAUTHORIZED);
    }
}
