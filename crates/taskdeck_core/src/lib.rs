//! Core domain logic for taskdeck.
//! This crate is the single source of truth for task ownership, sharing
//! and reminder-dispatch invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Task, TaskDraft, TaskId, TaskValidationError, MAX_TITLE_CHARS};
pub use model::user::{User, UserId};
pub use notify::dispatcher::{DispatchReport, DispatchStatus, DueSoonDispatcher, TaskDispatch};
pub use notify::mailer::{LogMailer, MailError, Mailer, OutgoingEmail};
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskListFilter, TaskRepository,
};
pub use repo::user_repo::{SqliteUserDirectory, UserDirectory};
pub use service::task_service::{
    CreateTaskRequest, ServiceResult, ShareConfirmation, ShareRequest, TaskService,
    TaskServiceError, TaskUpdate,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
