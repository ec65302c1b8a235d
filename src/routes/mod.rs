pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::{AuthMiddleware, RoleGuard};

/// Route table for the `/api` scope.
///
/// `/auth` holds the public issuance flows; everything else sits behind
/// `AuthMiddleware`, and the `/admin` scope adds `RoleGuard` as a second
/// gate. Middleware executes in reverse registration order, so on `/admin`
/// the authentication gate runs before the role check.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login)
            .service(auth::forgot_password)
            .service(auth::reset_password),
    )
    .service(
        web::scope("/users")
            .wrap(AuthMiddleware)
            .service(auth::update_password)
            .service(users::get_me)
            .service(users::update_me)
            .service(users::delete_me),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/admin")
            .wrap(RoleGuard::admin())
            .wrap(AuthMiddleware)
            .service(users::list_users)
            .service(users::create_admin)
            .service(users::get_user)
            .service(users::update_user)
            .service(users::delete_user),
    );
}
