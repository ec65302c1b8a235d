use crate::{
    auth::{
        ensure_passwords_match, generate_token, hash_password, reset, session_cookie,
        verify_password, AuthResponse, AuthenticatedUser, ForgotPasswordRequest, LoginRequest,
        ResetPasswordRequest, SignupRequest, UpdatePasswordRequest,
    },
    config::Config,
    error::AppError,
    models::{user, NewUser, Role, User},
    notifier::{EmailMessage, Notifier},
    store::UserStore,
};
use actix_web::{http::StatusCode, patch, post, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

/// Builds the dual-delivery success response: the token in the JSON body for
/// native clients and in the session cookie for browsers, alongside the
/// sanitized account.
pub(crate) fn send_token(
    user: User,
    status: StatusCode,
    config: &Config,
) -> Result<HttpResponse, AppError> {
    let token = generate_token(user.id)?;
    let cookie = session_cookie(&token, config);

    Ok(HttpResponse::build(status)
        .cookie(cookie)
        .json(AuthResponse { token, user }))
}

/// Hashes a password on the blocking thread pool so bcrypt work does not
/// stall the async workers.
async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
}

async fn verify_password_blocking(password: String, hashed: String) -> Result<bool, AppError> {
    web::block(move || verify_password(&password, &hashed))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))
}

/// Creates an account with the given server-assigned role. Shared by
/// self-service signup (always `user`) and admin-signup (always `admin`).
pub(crate) async fn create_account(
    store: &dyn UserStore,
    payload: SignupRequest,
    role: Role,
) -> Result<User, AppError> {
    payload.validate()?;
    ensure_passwords_match(&payload.password, &payload.password_confirm)?;

    let password_hash = hash_password_blocking(payload.password).await?;

    store
        .create(NewUser {
            name: payload.name,
            email: payload.email.to_lowercase(),
            photo: payload.photo.unwrap_or_else(|| user::DEFAULT_PHOTO.to_string()),
            role,
            password_hash,
        })
        .await
}

/// Self-service signup. The payload type has no role field, so any
/// client-supplied role is dropped before it can reach the store; every
/// account created here is a plain `user`.
#[post("/signup")]
pub async fn signup(
    store: web::Data<dyn UserStore>,
    config: web::Data<Config>,
    payload: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    let new_user = create_account(store.as_ref(), payload.into_inner(), Role::User).await?;

    log::info!("account created: {}", new_user.id);
    send_token(new_user, StatusCode::CREATED, &config)
}

/// Authenticates by email and password.
///
/// An unknown email and a wrong password fail identically so responses do not
/// reveal which emails have accounts. A successful login discards any pending
/// reset secret before a fresh token is issued.
#[post("/login")]
pub async fn login(
    store: web::Data<dyn UserStore>,
    config: web::Data<Config>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let email = payload.email.to_lowercase();
    let user = store
        .find_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let password = payload.into_inner().password;
    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    store.clear_reset_secret(user.id).await?;

    send_token(user, StatusCode::OK, &config)
}

/// Starts password recovery: stores the hashed reset secret with a 10-minute
/// expiry and mails the raw secret as a reset link.
///
/// If delivery fails the pending secret is rolled back so no live,
/// undelivered secret remains on the account.
#[post("/forgot-password")]
pub async fn forgot_password(
    store: web::Data<dyn UserStore>,
    notifier: web::Data<dyn Notifier>,
    payload: web::Json<ForgotPasswordRequest>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let email = payload.email.to_lowercase();
    let user = store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no user with that email address".into()))?;

    let now = chrono::Utc::now();
    let secret = reset::generate(now);
    store
        .set_reset_secret(user.id, &secret.hashed, secret.expires_at)
        .await?;

    let (scheme, host) = {
        let info = req.connection_info();
        (info.scheme().to_owned(), info.host().to_owned())
    };
    let reset_url = format!(
        "{}://{}/api/auth/reset-password/{}",
        scheme, host, secret.raw
    );
    let message = EmailMessage {
        to: user.email.clone(),
        subject: "Your password reset token (valid for 10 minutes)".to_string(),
        body: format!(
            "Forgot your password? Submit a PATCH request with your new password \
             and confirmation to: {}\nIf you didn't request this, ignore this email.",
            reset_url
        ),
    };

    if let Err(delivery_err) = notifier.send(message).await {
        // Compensating action: a secret that never reached the account holder
        // must not stay live.
        store.clear_reset_secret(user.id).await?;
        return Err(delivery_err);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Token sent to email"
    })))
}

/// Completes password recovery with the raw secret from the reset link.
///
/// The secret is single-use: committing the new password clears it, so a
/// second presentation of the same raw value fails like an expired one.
#[patch("/reset-password/{token}")]
pub async fn reset_password(
    store: web::Data<dyn UserStore>,
    config: web::Data<Config>,
    raw_token: web::Path<String>,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    ensure_passwords_match(&payload.password, &payload.password_confirm)?;

    // The clock is read once here at the boundary; everything downstream
    // takes the timestamp as a parameter.
    let now = chrono::Utc::now();
    let token_hash = reset::hash_token(&raw_token);
    let user = store
        .find_by_reset_token(&token_hash, now)
        .await?
        .ok_or_else(|| AppError::BadRequest("Token is invalid or has expired".into()))?;

    let password_hash = hash_password_blocking(payload.into_inner().password).await?;
    let user = store
        .set_password(user.id, &password_hash, user::backdated_change_stamp())
        .await?;

    log::info!("password reset completed for account {}", user.id);
    send_token(user, StatusCode::OK, &config)
}

/// Password change for a logged-in account. Requires the current password,
/// then re-keys the session: the issued token postdates the change stamp
/// while every older token is invalidated.
#[patch("/password")]
pub async fn update_password(
    store: web::Data<dyn UserStore>,
    config: web::Data<Config>,
    AuthenticatedUser(identity): AuthenticatedUser,
    payload: web::Json<UpdatePasswordRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    ensure_passwords_match(&payload.password, &payload.password_confirm)?;

    let payload = payload.into_inner();
    if !verify_password_blocking(payload.current_password, identity.password_hash.clone()).await? {
        return Err(AppError::IncorrectPassword);
    }

    let password_hash = hash_password_blocking(payload.password).await?;
    let user = store
        .set_password(identity.id, &password_hash, user::backdated_change_stamp())
        .await?;

    send_token(user, StatusCode::OK, &config)
}
