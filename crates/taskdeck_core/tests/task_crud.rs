use chrono::NaiveDate;
use rusqlite::Connection;
use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::{
    RepoError, SqliteTaskRepository, SqliteUserDirectory, TaskDraft, TaskListFilter,
    TaskRepository, User, UserDirectory,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed_user(conn: &Connection, username: &str, email: &str) -> User {
    let directory = SqliteUserDirectory::try_new(conn).unwrap();
    directory.create_user(username, email).unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    let draft = TaskDraft::new(owner.id, "Finish project", "Complete the API", date(2026, 9, 1));
    let created = repo.create_task(&draft).unwrap();

    assert_eq!(created.owner, owner.id);
    assert!(!created.is_completed);
    assert!(created.shared_with.is_empty());
    assert!(created.created_at > 0);

    let loaded = repo.get_task(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn store_assigns_distinct_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    let draft = TaskDraft::new(owner.id, "Same title", "", date(2026, 9, 1));
    let first = repo.create_task(&draft).unwrap();
    let second = repo.create_task(&draft).unwrap();

    assert_ne!(first.id, second.id);
}

#[test]
fn update_rewrites_mutable_fields_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");
    let other = seed_user(&conn, "other", "other@example.com");

    let draft = TaskDraft::new(owner.id, "Update me", "Old desc", date(2026, 9, 1));
    let created = repo.create_task(&draft).unwrap();

    let mut changed = created.clone();
    changed.title = "Updated".to_string();
    changed.description = "New desc".to_string();
    changed.due_date = date(2026, 9, 2);
    changed.is_completed = true;
    // These two must be ignored by the write path.
    changed.owner = other.id;
    changed.created_at = 999;
    repo.update_task(&changed).unwrap();

    let loaded = repo.get_task(created.id).unwrap().unwrap();
    assert_eq!(loaded.title, "Updated");
    assert_eq!(loaded.description, "New desc");
    assert_eq!(loaded.due_date, date(2026, 9, 2));
    assert!(loaded.is_completed);
    assert_eq!(loaded.owner, owner.id);
    assert_eq!(loaded.created_at, created.created_at);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    let draft = TaskDraft::new(owner.id, "Missing", "", date(2026, 9, 1));
    let mut task = repo.create_task(&draft).unwrap();
    repo.delete_task(task.id).unwrap();

    task.title = "Still missing".to_string();
    let err = repo.update_task(&task).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == task.id));
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    let invalid = TaskDraft::new(owner.id, "", "", date(2026, 9, 1));
    let create_err = repo.create_task(&invalid).unwrap_err();
    assert!(matches!(create_err, RepoError::Validation(_)));

    let valid = TaskDraft::new(owner.id, "Valid", "", date(2026, 9, 1));
    let mut task = repo.create_task(&valid).unwrap();
    task.title = "   ".to_string();
    let update_err = repo.update_task(&task).unwrap_err();
    assert!(matches!(update_err, RepoError::Validation(_)));
}

#[test]
fn delete_removes_task_and_share_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");
    let member = seed_user(&conn, "member", "member@example.com");

    let draft = TaskDraft::new(owner.id, "Shared then deleted", "", date(2026, 9, 1));
    let task = repo.create_task(&draft).unwrap();
    repo.add_share(task.id, member.id).unwrap();

    repo.delete_task(task.id).unwrap();

    assert!(repo.get_task(task.id).unwrap().is_none());
    let share_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM task_shares;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(share_rows, 0);

    let err = repo.delete_task(task.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == task.id));
}

#[test]
fn add_share_is_idempotent_and_skips_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");
    let member = seed_user(&conn, "member", "member@example.com");

    let draft = TaskDraft::new(owner.id, "Shared task", "", date(2026, 9, 1));
    let task = repo.create_task(&draft).unwrap();

    repo.add_share(task.id, member.id).unwrap();
    repo.add_share(task.id, member.id).unwrap();
    repo.add_share(task.id, owner.id).unwrap();

    let loaded = repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.shared_with.len(), 1);
    assert!(loaded.shared_with.contains(&member.id));
    assert!(!loaded.shared_with.contains(&owner.id));
}

#[test]
fn add_share_unknown_task_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let member = seed_user(&conn, "member", "member@example.com");

    let missing = uuid::Uuid::new_v4();
    let err = repo.add_share(missing, member.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn list_visible_covers_owned_and_shared_tasks_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");
    let member = seed_user(&conn, "member", "member@example.com");
    let stranger = seed_user(&conn, "stranger", "stranger@example.com");

    let owned = repo
        .create_task(&TaskDraft::new(owner.id, "Owned", "", date(2026, 9, 1)))
        .unwrap();
    let shared = repo
        .create_task(&TaskDraft::new(owner.id, "Shared", "", date(2026, 9, 1)))
        .unwrap();
    repo.add_share(shared.id, member.id).unwrap();

    let owner_view = repo.list_visible(owner.id, &TaskListFilter::default()).unwrap();
    assert_eq!(owner_view.len(), 2);
    let owner_ids: Vec<_> = owner_view.iter().map(|task| task.id).collect();
    assert!(owner_ids.contains(&owned.id));
    assert!(owner_ids.contains(&shared.id));

    let member_view = repo.list_visible(member.id, &TaskListFilter::default()).unwrap();
    assert_eq!(member_view.len(), 1);
    assert_eq!(member_view[0].id, shared.id);
    assert!(member_view[0].shared_with.contains(&member.id));

    let stranger_view = repo
        .list_visible(stranger.id, &TaskListFilter::default())
        .unwrap();
    assert!(stranger_view.is_empty());
}

#[test]
fn list_filters_compose_with_and() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    let read = repo
        .create_task(&TaskDraft::new(owner.id, "Read book", "", date(2026, 9, 1)))
        .unwrap();
    let mut completed_read = repo.get_task(read.id).unwrap().unwrap();
    completed_read.is_completed = true;
    repo.update_task(&completed_read).unwrap();

    repo.create_task(&TaskDraft::new(owner.id, "Write code", "", date(2026, 9, 1)))
        .unwrap();
    repo.create_task(&TaskDraft::new(owner.id, "Read mail", "", date(2026, 9, 2)))
        .unwrap();

    let completed_only = repo
        .list_visible(
            owner.id,
            &TaskListFilter {
                is_completed: Some(true),
                ..TaskListFilter::default()
            },
        )
        .unwrap();
    assert_eq!(completed_only.len(), 1);
    assert_eq!(completed_only[0].id, read.id);

    let by_date = repo
        .list_visible(
            owner.id,
            &TaskListFilter {
                due_date: Some(date(2026, 9, 2)),
                ..TaskListFilter::default()
            },
        )
        .unwrap();
    assert_eq!(by_date.len(), 1);
    assert_eq!(by_date[0].title, "Read mail");

    let combined = repo
        .list_visible(
            owner.id,
            &TaskListFilter {
                is_completed: Some(false),
                title_contains: Some("read".to_string()),
                ..TaskListFilter::default()
            },
        )
        .unwrap();
    assert_eq!(combined.len(), 1);
    assert_eq!(combined[0].title, "Read mail");
}

#[test]
fn title_filter_matches_substring_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    repo.create_task(&TaskDraft::new(owner.id, "Write CODE", "", date(2026, 9, 1)))
        .unwrap();
    repo.create_task(&TaskDraft::new(owner.id, "Read book", "", date(2026, 9, 1)))
        .unwrap();

    let hits = repo
        .list_visible(
            owner.id,
            &TaskListFilter {
                title_contains: Some("code".to_string()),
                ..TaskListFilter::default()
            },
        )
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Write CODE");

    let partial = repo
        .list_visible(
            owner.id,
            &TaskListFilter {
                title_contains: Some("RIT".to_string()),
                ..TaskListFilter::default()
            },
        )
        .unwrap();
    assert_eq!(partial.len(), 1);
}

#[test]
fn list_order_is_stable_across_reads() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    for index in 0..5 {
        repo.create_task(&TaskDraft::new(
            owner.id,
            format!("Task {index}"),
            "",
            date(2026, 9, 1),
        ))
        .unwrap();
    }

    let first = repo.list_visible(owner.id, &TaskListFilter::default()).unwrap();
    let second = repo.list_visible(owner.id, &TaskListFilter::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn due_query_returns_incomplete_tasks_on_exact_date_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let owner = seed_user(&conn, "test", "test@example.com");

    let due = repo
        .create_task(&TaskDraft::new(owner.id, "Due tomorrow", "", date(2026, 8, 7)))
        .unwrap();
    repo.create_task(&TaskDraft::new(owner.id, "Due today", "", date(2026, 8, 6)))
        .unwrap();
    repo.create_task(&TaskDraft::new(owner.id, "Due later", "", date(2026, 8, 8)))
        .unwrap();

    let done = repo
        .create_task(&TaskDraft::new(owner.id, "Done already", "", date(2026, 8, 7)))
        .unwrap();
    let mut done = repo.get_task(done.id).unwrap().unwrap();
    done.is_completed = true;
    repo.update_task(&done).unwrap();

    let hits = repo.list_due_incomplete(date(2026, 8, 7)).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, due.id);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => {
            assert!(expected_version > 0);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
