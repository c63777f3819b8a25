//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `tasks` storage.
//! - Answer the visibility-scoped list query and the dispatcher's due query.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must pass model validation before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - `task_shares` rows never reference the task owner.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::task::{Task, TaskDraft, TaskId, TaskValidationError};
use crate::model::user::UserId;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    due_date,
    is_completed,
    owner_uuid,
    created_at
FROM tasks";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
    /// The connection has not been migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter options for the visibility-scoped list query.
///
/// All supplied predicates compose with logical AND.
#[derive(Debug, Clone, Default)]
pub struct TaskListFilter {
    /// Exact match on the completion flag.
    pub is_completed: Option<bool>,
    /// Exact match on the due date.
    pub due_date: Option<NaiveDate>,
    /// Case-insensitive substring match on the title.
    pub title_contains: Option<String>,
}

/// Repository interface for task CRUD, sharing and due-date queries.
pub trait TaskRepository {
    /// Persists a draft; the store assigns `id` and `created_at`.
    fn create_task(&self, draft: &TaskDraft) -> RepoResult<Task>;
    /// Rewrites the mutable fields (title, description, due date,
    /// completion flag) of an existing task. Owner and creation time are
    /// never written.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    /// Gets one task by id, including its share set.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists tasks the viewer owns or is shared on, oldest first.
    fn list_visible(&self, viewer: UserId, filter: &TaskListFilter) -> RepoResult<Vec<Task>>;
    /// Hard-deletes a task; sharing rows go with it.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Adds `user` to the task's share set. Idempotent; adding the owner
    /// is a no-op.
    fn add_share(&self, task_id: TaskId, user: UserId) -> RepoResult<()>;
    /// Returns every incomplete task due exactly on `due_date`.
    fn list_due_incomplete(&self, due_date: NaiveDate) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
#[derive(Debug)]
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn load_shared_with(&self, task_id: TaskId) -> RepoResult<BTreeSet<UserId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_uuid FROM task_shares WHERE task_uuid = ?1;")?;
        let mut rows = stmt.query([task_id.to_string()])?;
        let mut members = BTreeSet::new();

        while let Some(row) = rows.next()? {
            let user_text: String = row.get(0)?;
            let user = Uuid::parse_str(&user_text).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid uuid value `{user_text}` in task_shares.user_uuid"
                ))
            })?;
            members.insert(user);
        }

        Ok(members)
    }

    fn collect_tasks(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        for task in &mut tasks {
            task.shared_with = self.load_shared_with(task.id)?;
        }

        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, draft: &TaskDraft) -> RepoResult<Task> {
        draft.validate()?;

        let id: TaskId = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                title,
                description,
                due_date,
                is_completed,
                owner_uuid
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5);",
            params![
                id.to_string(),
                draft.title.as_str(),
                draft.description.as_str(),
                draft.due_date.format(DATE_FORMAT).to_string(),
                draft.owner.to_string(),
            ],
        )?;

        let created_at: i64 = self.conn.query_row(
            "SELECT created_at FROM tasks WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;

        Ok(Task {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: draft.due_date,
            is_completed: false,
            owner: draft.owner,
            shared_with: BTreeSet::new(),
            created_at,
        })
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                due_date = ?3,
                is_completed = ?4
             WHERE uuid = ?5;",
            params![
                task.title.as_str(),
                task.description.as_str(),
                task.due_date.format(DATE_FORMAT).to_string(),
                bool_to_int(task.is_completed),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            task.shared_with = self.load_shared_with(task.id)?;
            return Ok(Some(task));
        }

        Ok(None)
    }

    fn list_visible(&self, viewer: UserId, filter: &TaskListFilter) -> RepoResult<Vec<Task>> {
        let mut sql = format!(
            "{TASK_SELECT_SQL}
             WHERE (owner_uuid = ?
                OR uuid IN (SELECT task_uuid FROM task_shares WHERE user_uuid = ?))"
        );
        let viewer_text = viewer.to_string();
        let mut bind_values: Vec<Value> = vec![
            Value::Text(viewer_text.clone()),
            Value::Text(viewer_text),
        ];

        if let Some(is_completed) = filter.is_completed {
            sql.push_str(" AND is_completed = ?");
            bind_values.push(Value::Integer(bool_to_int(is_completed)));
        }

        if let Some(due_date) = filter.due_date {
            sql.push_str(" AND due_date = ?");
            bind_values.push(Value::Text(due_date.format(DATE_FORMAT).to_string()));
        }

        if let Some(needle) = filter.title_contains.as_deref() {
            sql.push_str(" AND instr(lower(title), lower(?)) > 0");
            bind_values.push(Value::Text(needle.to_string()));
        }

        sql.push_str(" ORDER BY created_at ASC, uuid ASC");

        self.collect_tasks(&sql, bind_values)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn add_share(&self, task_id: TaskId, user: UserId) -> RepoResult<()> {
        let owner_text: Option<String> = self
            .conn
            .query_row(
                "SELECT owner_uuid FROM tasks WHERE uuid = ?1;",
                [task_id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some(owner_text) = owner_text else {
            return Err(RepoError::NotFound(task_id));
        };

        if owner_text == user.to_string() {
            return Ok(());
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO task_shares (task_uuid, user_uuid) VALUES (?1, ?2);",
            params![task_id.to_string(), user.to_string()],
        )?;

        Ok(())
    }

    fn list_due_incomplete(&self, due_date: NaiveDate) -> RepoResult<Vec<Task>> {
        let sql = format!(
            "{TASK_SELECT_SQL}
             WHERE due_date = ?
               AND is_completed = 0
             ORDER BY created_at ASC, uuid ASC"
        );
        let bind_values = vec![Value::Text(due_date.format(DATE_FORMAT).to_string())];

        self.collect_tasks(&sql, bind_values)
    }
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();

    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    let owner_text: String = row.get("owner_uuid")?;
    let owner = Uuid::parse_str(&owner_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{owner_text}` in tasks.owner_uuid"
        ))
    })?;

    let due_text: String = row.get("due_date")?;
    let due_date = NaiveDate::parse_from_str(&due_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date value `{due_text}` in tasks.due_date"))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    Ok(Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date,
        is_completed,
        owner,
        shared_with: BTreeSet::new(),
        created_at: row.get("created_at")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
