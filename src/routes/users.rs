use crate::{
    auth::{AuthenticatedUser, SignupRequest},
    config::Config,
    error::AppError,
    models::{ProfileUpdate, Role},
    routes::auth::create_account,
    store::UserStore,
};
use actix_web::{delete, get, http::StatusCode, patch, post, web, HttpResponse, Responder};
use validator::Validate;

/// Returns the caller's own (sanitized) account.
#[get("/me")]
pub async fn get_me(AuthenticatedUser(identity): AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(identity)
}

/// Updates the caller's profile fields (name, email, photo).
///
/// The payload rejects unknown fields, so password or role changes smuggled
/// through this route fail at deserialization; passwords move only through
/// the dedicated password flows.
#[patch("/me")]
pub async fn update_me(
    store: web::Data<dyn UserStore>,
    AuthenticatedUser(identity): AuthenticatedUser,
    payload: web::Json<ProfileUpdate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let updated = store
        .update_profile(identity.id, payload.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes the caller's own account.
#[delete("/me")]
pub async fn delete_me(
    store: web::Data<dyn UserStore>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    store.delete(identity.id).await?;
    log::info!("account deleted: {}", identity.id);
    Ok(HttpResponse::NoContent().finish())
}

/// Lists all accounts. Admin only (enforced by the route table's RoleGuard).
#[get("/users")]
pub async fn list_users(
    store: web::Data<dyn UserStore>,
) -> Result<impl Responder, AppError> {
    let users = store.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Creates an `admin`-role account.
///
/// Reachable only through the admin scope: admin principals are provisioned
/// by an already-authenticated admin, never by self-service signup.
#[post("/users")]
pub async fn create_admin(
    store: web::Data<dyn UserStore>,
    config: web::Data<Config>,
    payload: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    let new_admin = create_account(store.as_ref(), payload.into_inner(), Role::Admin).await?;

    log::info!("admin account created: {}", new_admin.id);
    crate::routes::auth::send_token(new_admin, StatusCode::CREATED, &config)
}

#[get("/users/{id}")]
pub async fn get_user(
    store: web::Data<dyn UserStore>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user = store
        .find_by_id(user_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(user))
}

#[patch("/users/{id}")]
pub async fn update_user(
    store: web::Data<dyn UserStore>,
    user_id: web::Path<i32>,
    payload: web::Json<ProfileUpdate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let updated = store
        .update_profile(user_id.into_inner(), payload.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    store: web::Data<dyn UserStore>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    store.delete(user_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
