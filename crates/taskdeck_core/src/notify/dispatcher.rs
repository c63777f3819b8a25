//! Due-soon notification dispatcher.
//!
//! # Responsibility
//! - Find every incomplete task due on the next calendar day.
//! - Notify the owner and all shared users of each such task.
//! - Capture per-task outcomes so "continue on failure" is observable.
//!
//! # Invariants
//! - The failure-isolation unit is a single task's send; the run always
//!   attempts every qualifying task.
//! - Recipient lists preserve first-seen order and contain no exact-string
//!   duplicates and no blank addresses.
//! - No send history is kept: a re-run the same day re-sends the same
//!   reminders, derived purely from current store state.

use crate::model::task::{Task, TaskId};
use crate::notify::mailer::{Mailer, OutgoingEmail};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use crate::repo::user_repo::UserDirectory;
use chrono::{Days, Local, NaiveDate};
use log::{info, warn};
use std::collections::HashSet;

/// Outcome of one task's dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    /// The mailer accepted the message.
    Sent,
    /// Every resolvable recipient had a blank address; nothing to send.
    SkippedNoRecipients,
    /// Recipient resolution or delivery failed for this task.
    Failed(String),
}

/// Per-task record in a run's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDispatch {
    pub task_id: TaskId,
    pub title: String,
    pub recipients: Vec<String>,
    pub status: DispatchStatus,
}

/// Result of one dispatcher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// The calendar date the run notified about (run date + 1 day).
    pub target_date: NaiveDate,
    /// One entry per qualifying task, in store order.
    pub outcomes: Vec<TaskDispatch>,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.count(|status| matches!(status, DispatchStatus::Sent))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, DispatchStatus::SkippedNoRecipients))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, DispatchStatus::Failed(_)))
    }

    fn count(&self, matcher: impl Fn(&DispatchStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matcher(&outcome.status))
            .count()
    }
}

/// Periodic batch job notifying about tasks due tomorrow.
///
/// Stateless between runs; safe to invoke from any scheduler.
pub struct DueSoonDispatcher<R: TaskRepository, D: UserDirectory, M: Mailer> {
    tasks: R,
    users: D,
    mailer: M,
}

impl<R: TaskRepository, D: UserDirectory, M: Mailer> DueSoonDispatcher<R, D, M> {
    /// Creates a dispatcher over the provided store, directory and mailer.
    pub fn new(tasks: R, users: D, mailer: M) -> Self {
        Self {
            tasks,
            users,
            mailer,
        }
    }

    /// Runs one dispatch cycle against the server-local calendar date.
    pub fn run(&self) -> RepoResult<DispatchReport> {
        self.run_for(Local::now().date_naive())
    }

    /// Runs one dispatch cycle treating `today` as the current date.
    ///
    /// Only the due-task query can fail the run as a whole; everything
    /// downstream is captured per task in the report.
    pub fn run_for(&self, today: NaiveDate) -> RepoResult<DispatchReport> {
        let target_date = today + Days::new(1);

        info!("event=due_soon_run module=notify status=start target_date={target_date}");

        let due_tasks = self.tasks.list_due_incomplete(target_date)?;
        let mut outcomes = Vec::with_capacity(due_tasks.len());

        for task in &due_tasks {
            outcomes.push(self.dispatch_one(task));
        }

        let report = DispatchReport {
            target_date,
            outcomes,
        };
        info!(
            "event=due_soon_run module=notify status=ok target_date={target_date} tasks={} sent={} skipped={} failed={}",
            report.outcomes.len(),
            report.sent(),
            report.skipped(),
            report.failed()
        );

        Ok(report)
    }

    fn dispatch_one(&self, task: &Task) -> TaskDispatch {
        let recipients = match self.collect_recipients(task) {
            Ok(recipients) => recipients,
            Err(err) => {
                warn!(
                    "event=due_soon_dispatch module=notify status=error task={} error_code=recipient_lookup_failed error={err}",
                    task.id
                );
                return TaskDispatch {
                    task_id: task.id,
                    title: task.title.clone(),
                    recipients: Vec::new(),
                    status: DispatchStatus::Failed(err.to_string()),
                };
            }
        };

        if recipients.is_empty() {
            return TaskDispatch {
                task_id: task.id,
                title: task.title.clone(),
                recipients,
                status: DispatchStatus::SkippedNoRecipients,
            };
        }

        let email = compose_reminder(task, recipients.clone());
        let status = match self.mailer.send(&email) {
            Ok(()) => DispatchStatus::Sent,
            Err(err) => {
                warn!(
                    "event=due_soon_dispatch module=notify status=error task={} error_code=delivery_failed error={err}",
                    task.id
                );
                DispatchStatus::Failed(err.to_string())
            }
        };

        TaskDispatch {
            task_id: task.id,
            title: task.title.clone(),
            recipients,
            status,
        }
    }

    /// Owner email first, then each shared user's, trimmed, blanks dropped,
    /// exact-string duplicates removed keeping the first occurrence.
    fn collect_recipients(&self, task: &Task) -> RepoResult<Vec<String>> {
        let mut recipients = Vec::new();

        if let Some(owner) = self.users.find_by_id(task.owner)? {
            if let Some(email) = owner.deliverable_email() {
                recipients.push(email.to_string());
            }
        }

        for member in &task.shared_with {
            if let Some(user) = self.users.find_by_id(*member)? {
                if let Some(email) = user.deliverable_email() {
                    recipients.push(email.to_string());
                }
            }
        }

        let mut seen = HashSet::new();
        recipients.retain(|address| seen.insert(address.clone()));

        Ok(recipients)
    }
}

fn compose_reminder(task: &Task, recipients: Vec<String>) -> OutgoingEmail {
    let description = if task.description.is_empty() {
        "No description"
    } else {
        task.description.as_str()
    };

    let body = [
        "Hello,".to_string(),
        format!(
            "Reminder: The task **{}** is due on {}.",
            task.title, task.due_date
        ),
        "Description:".to_string(),
        description.to_string(),
        format!("Status: {}", task.status_label()),
        "-- Taskdeck".to_string(),
    ]
    .join("\n");

    OutgoingEmail {
        subject: format!("Task due tomorrow: {}", task.title),
        body,
        recipients,
    }
}
