use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Input structure for creating or updating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Optional short title.
    #[validate(length(max = 200))]
    pub title: Option<String>,

    /// The task body. Required, 1 to 1000 characters.
    #[validate(length(min = 1, max = 1000))]
    pub description: String,

    #[serde(default)]
    pub completed: bool,
}

/// A task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Identifier of the account that owns the task.
    pub user_id: i32,
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskQuery {
    pub completed: Option<bool>,
    /// Case-insensitive match against title and description.
    pub search: Option<String>,
}

impl Task {
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            completed: input.completed,
            created_at: Utc::now(),
            user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let input = TaskInput {
            title: Some("Groceries".to_string()),
            description: "Buy milk".to_string(),
            completed: false,
        };

        let task = Task::new(input, 7);
        assert_eq!(task.title.as_deref(), Some("Groceries"));
        assert_eq!(task.description, "Buy milk");
        assert_eq!(task.user_id, 7);
        assert!(!task.completed);
    }

    #[test]
    fn test_task_input_validation() {
        let valid = TaskInput {
            title: None,
            description: "Water the plants".to_string(),
            completed: false,
        };
        assert!(valid.validate().is_ok());

        let empty_description = TaskInput {
            title: Some("t".to_string()),
            description: "".to_string(),
            completed: false,
        };
        assert!(empty_description.validate().is_err());

        let oversized = TaskInput {
            title: Some("a".repeat(201)),
            description: "ok".to_string(),
            completed: false,
        };
        assert!(oversized.validate().is_err());
    }

    #[test]
    fn test_completed_defaults_to_false() {
        let input: TaskInput = serde_json::from_str(r#"{"description": "stretch"}"#).unwrap();
        assert!(!input.completed);
    }
}
