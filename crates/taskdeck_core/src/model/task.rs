//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its creation request shape.
//! - Provide visibility/ownership helpers used by the service layer.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `owner` and `created_at` are set once at creation and never change.
//! - `shared_with` is a set and never contains `owner`.

use crate::model::user::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Maximum accepted title length in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Validation failure for task field constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Title exceeds [`MAX_TITLE_CHARS`].
    TitleTooLong { chars: usize },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::TitleTooLong { chars } => write!(
                f,
                "task title is {chars} characters, limit is {MAX_TITLE_CHARS}"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// `shared_with` grants read-only visibility; every mutation right stays
/// with `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID, assigned by the store on creation.
    pub id: TaskId,
    /// Short human-readable title. Non-empty, at most 255 characters.
    pub title: String,
    /// Free-form body text. Empty string means "no description".
    pub description: String,
    /// Calendar due date, no time component. Past dates are permitted.
    pub due_date: NaiveDate,
    /// Completion flag. Only the owner may change it.
    pub is_completed: bool,
    /// The single user holding mutation rights.
    pub owner: UserId,
    /// Users granted read access. Never contains `owner`.
    pub shared_with: BTreeSet<UserId>,
    /// Unix epoch milliseconds, assigned by the store on creation.
    pub created_at: i64,
}

impl Task {
    /// Returns whether `user` may read this task.
    pub fn is_visible_to(&self, user: UserId) -> bool {
        self.owner == user || self.shared_with.contains(&user)
    }

    /// Returns whether `user` holds mutation rights on this task.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Human-readable completion label derived from `is_completed`.
    pub fn status_label(&self) -> &'static str {
        if self.is_completed {
            "Completed"
        } else {
            "Pending"
        }
    }

    /// Validates field constraints shared by create and update paths.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }
}

/// Creation request for a new task.
///
/// The store assigns `id` and `created_at`; the new task starts pending
/// with an empty share set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
}

impl TaskDraft {
    /// Creates a draft owned by `owner`.
    pub fn new(
        owner: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            owner,
            title: title.into(),
            description: description.into(),
            due_date,
        }
    }

    /// Validates field constraints before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }
}

fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    let chars = title.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(TaskValidationError::TitleTooLong { chars });
    }
    Ok(())
}
