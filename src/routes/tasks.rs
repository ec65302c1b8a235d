use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Role, Task, TaskInput, TaskQuery},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str = "id, title, description, completed, created_at, user_id";

/// Lists tasks.
///
/// Plain users see their own tasks; admins see everyone's. Supports filtering
/// by completion state and a case-insensitive search over title and
/// description. Ordered newest first.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
    let mut conditions: Vec<String> = Vec::new();
    let mut param_count = 1;

    if identity.role != Role::Admin {
        conditions.push(format!("user_id = ${}", param_count));
        param_count += 1;
    }
    if query_params.completed.is_some() {
        conditions.push(format!("completed = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        conditions.push(format!(
            "(title ILIKE ${} OR description ILIKE ${})",
            param_count, param_count
        ));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&sql);

    if identity.role != Role::Admin {
        query_builder = query_builder.bind(identity.id);
    }
    if let Some(completed) = query_params.completed {
        query_builder = query_builder.bind(completed);
    }
    if let Some(search) = &query_params.search {
        query_builder = query_builder.bind(format!("%{}%", search));
    }

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the caller.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), identity.id);

    let sql = format!(
        "INSERT INTO tasks (id, title, description, completed, created_at, user_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        TASK_COLUMNS
    );
    let created = sqlx::query_as::<_, Task>(&sql)
        .bind(task.id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.user_id)
        .fetch_one(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(created))
}

/// Retrieves a single task. Owners and admins only; anyone else gets the same
/// 404 a missing task would produce, so task ids leak nothing.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id.into_inner())
        .fetch_optional(&**pool)
        .await?;

    match task {
        Some(task) if task.user_id == identity.id || identity.role == Role::Admin => {
            Ok(HttpResponse::Ok().json(task))
        }
        _ => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates a task the caller owns.
#[patch("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let sql = format!(
        "UPDATE tasks SET title = $1, description = $2, completed = $3 \
         WHERE id = $4 AND user_id = $5 RETURNING {}",
        TASK_COLUMNS
    );
    let updated = sqlx::query_as::<_, Task>(&sql)
        .bind(&task_data.title)
        .bind(&task_data.description)
        .bind(task_data.completed)
        .bind(task_id.into_inner())
        .bind(identity.id)
        .fetch_optional(&**pool)
        .await?;

    match updated {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes a task. Owners may delete their own; admins may delete any.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = if identity.role == Role::Admin {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id.into_inner())
            .execute(&**pool)
            .await?
    } else {
        sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id.into_inner())
            .bind(identity.id)
            .execute(&**pool)
            .await?
    };

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
