//! Task use-case service.
//!
//! # Responsibility
//! - Provide create/list/retrieve/update/delete/complete/share entry points
//!   for the request-handling layer, each taking a resolved caller identity.
//! - Enforce the ownership, visibility and sharing invariants.
//!
//! # Invariants
//! - Mutations are owner-only; the check runs before any write.
//! - `retrieve` collapses not-visible into not-found so existence never
//!   leaks to unauthorized callers.
//! - Sharing is idempotent; the owner is never added to the share set.

use crate::model::task::{Task, TaskDraft, TaskId};
use crate::model::user::{User, UserId};
use crate::repo::task_repo::{RepoError, TaskListFilter, TaskRepository};
use crate::repo::user_repo::UserDirectory;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Typed failure surfaced to the request-handling layer.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Malformed input (empty title, share request naming no target, ...).
    InvalidRequest(String),
    /// Referenced task does not exist, or is not visible to the caller.
    NotFound(TaskId),
    /// Caller lacks ownership of the task for a mutating operation.
    Forbidden(TaskId),
    /// Share target resolution failed.
    UserNotFound(String),
    /// Storage transport failure.
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Forbidden(id) => write!(f, "caller does not own task {id}"),
            Self::UserNotFound(target) => write!(f, "user not found: {target}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::InvalidRequest(err.to_string()),
            other => Self::Repo(other),
        }
    }
}

/// Request model for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
}

/// Partial update applied by the owner. `None` fields keep their value.
///
/// Owner and creation time have no counterpart here on purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: Option<bool>,
}

/// Share request naming the target by id, by email, or (invalidly) neither.
///
/// Resolution tries `user_id` first, then `email`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareRequest {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
}

impl ShareRequest {
    /// Targets a user by stable id.
    pub fn by_user_id(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            email: None,
        }
    }

    /// Targets a user by exact email.
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            user_id: None,
            email: Some(email.into()),
        }
    }
}

/// Successful share outcome naming the resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareConfirmation {
    /// Task state after the share.
    pub task: Task,
    /// The user the task is now shared with.
    pub target: User,
}

/// Use-case service for task operations.
pub struct TaskService<R: TaskRepository, D: UserDirectory> {
    tasks: R,
    users: D,
}

impl<R: TaskRepository, D: UserDirectory> TaskService<R, D> {
    /// Creates a service over the provided store and directory.
    pub fn new(tasks: R, users: D) -> Self {
        Self { tasks, users }
    }

    /// Creates a task owned by the caller.
    ///
    /// # Contract
    /// - Empty titles are rejected with `InvalidRequest`.
    /// - Past due dates are permitted.
    /// - The result starts pending with an empty share set.
    pub fn create_task(&self, caller: UserId, request: &CreateTaskRequest) -> ServiceResult<Task> {
        let draft = TaskDraft::new(
            caller,
            request.title.clone(),
            request.description.clone(),
            request.due_date,
        );
        Ok(self.tasks.create_task(&draft)?)
    }

    /// Lists tasks the caller owns or is shared on.
    ///
    /// Filter predicates compose with AND; an empty result is not an error.
    pub fn list_tasks(&self, caller: UserId, filter: &TaskListFilter) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.list_visible(caller, filter)?)
    }

    /// Gets one task visible to the caller.
    ///
    /// Unknown ids and tasks the caller may not see both answer `NotFound`.
    pub fn retrieve_task(&self, caller: UserId, id: TaskId) -> ServiceResult<Task> {
        let task = self
            .tasks
            .get_task(id)?
            .ok_or(TaskServiceError::NotFound(id))?;

        if !task.is_visible_to(caller) {
            return Err(TaskServiceError::NotFound(id));
        }

        Ok(task)
    }

    /// Applies a partial update to an owned task.
    pub fn update_task(
        &self,
        caller: UserId,
        id: TaskId,
        update: &TaskUpdate,
    ) -> ServiceResult<Task> {
        let mut task = self.load_owned(caller, id)?;

        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(description) = &update.description {
            task.description = description.clone();
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(is_completed) = update.is_completed {
            task.is_completed = is_completed;
        }

        self.tasks.update_task(&task)?;
        Ok(task)
    }

    /// Deletes an owned task together with all its sharing relationships.
    pub fn delete_task(&self, caller: UserId, id: TaskId) -> ServiceResult<()> {
        let task = self.load_owned(caller, id)?;
        self.tasks.delete_task(task.id)?;
        Ok(())
    }

    /// Marks an owned task completed.
    ///
    /// Idempotent: completing an already-completed task succeeds and leaves
    /// state unchanged.
    pub fn complete_task(&self, caller: UserId, id: TaskId) -> ServiceResult<Task> {
        let mut task = self.load_owned(caller, id)?;
        task.is_completed = true;
        self.tasks.update_task(&task)?;
        Ok(task)
    }

    /// Shares an owned task with another user for read access.
    ///
    /// # Contract
    /// - Resolution tries `user_id`, then `email`; naming neither is
    ///   `InvalidRequest`, a failed resolution is `UserNotFound`.
    /// - Sharing with an already-shared user, or with the owner, succeeds
    ///   without changing state.
    pub fn share_task(
        &self,
        caller: UserId,
        id: TaskId,
        request: &ShareRequest,
    ) -> ServiceResult<ShareConfirmation> {
        let mut task = self.load_owned(caller, id)?;
        let target = self.resolve_share_target(request)?;

        if target.id != task.owner {
            self.tasks.add_share(task.id, target.id)?;
            task.shared_with.insert(target.id);
        }

        Ok(ShareConfirmation { task, target })
    }

    fn resolve_share_target(&self, request: &ShareRequest) -> ServiceResult<User> {
        if let Some(user_id) = request.user_id {
            return self
                .users
                .find_by_id(user_id)?
                .ok_or_else(|| TaskServiceError::UserNotFound(user_id.to_string()));
        }

        if let Some(email) = request.email.as_deref() {
            return self
                .users
                .find_by_email(email)?
                .ok_or_else(|| TaskServiceError::UserNotFound(email.to_string()));
        }

        Err(TaskServiceError::InvalidRequest(
            "provide user_id or email".to_string(),
        ))
    }

    /// Loads a task and verifies the caller owns it.
    ///
    /// Unknown ids answer `NotFound`; known-but-foreign tasks answer
    /// `Forbidden` (mutating operations may acknowledge existence).
    fn load_owned(&self, caller: UserId, id: TaskId) -> ServiceResult<Task> {
        let task = self
            .tasks
            .get_task(id)?
            .ok_or(TaskServiceError::NotFound(id))?;

        if !task.is_owned_by(caller) {
            return Err(TaskServiceError::Forbidden(id));
        }

        Ok(task)
    }
}
