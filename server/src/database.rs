// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{Permission, Task, TaskStatus, User};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction, migrate::MigrateDatabase};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Tables for users, their tasks, view permissions and login sessions.
///
/// Every child row cascades from its parent, including permissions whose
/// grantee is deleted. `(task_id, user_id)` is unique so sharing can upsert.
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NULL,
        status TEXT NOT NULL DEFAULT 'NOT_STARTED',
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL
    );

    CREATE TABLE IF NOT EXISTS permissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        can_view BOOLEAN NOT NULL DEFAULT 0,
        can_view_status BOOLEAN NOT NULL DEFAULT 1,
        UNIQUE (task_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);
    CREATE INDEX IF NOT EXISTS idx_permissions_user ON permissions(user_id);
"#;

/// Establishes the database connection pool.
/// If the database does not exist, it creates it, then makes sure every
/// table exists.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .context("Invalid database URL")?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// A fresh, isolated in-memory store.
///
/// Every connection to `:memory:` opens its own empty database, so the pool
/// is pinned to a single connection that is never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;

    create_schema(&pool).await?;

    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to create tables")?;

    info!("'users', 'tasks', 'permissions' and 'sessions' tables are ready.");

    Ok(())
}

/// Opens a transaction holding the write lock from its first statement.
///
/// A deferred transaction that reads before writing cannot wait for a
/// concurrent writer and fails with `database is locked` instead.
pub async fn begin_write(pool: &SqlitePool) -> sqlx::Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// True when `err` was caused by a UNIQUE constraint rejecting a write.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
    )
}

// --- Users ---

pub async fn insert_user_in_db(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<User> {
    let id = sqlx::query("INSERT INTO users (username, password_hash, is_admin) VALUES (?, ?, ?)")
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .execute(&mut *conn)
        .await
        .context("Failed to insert user into DB")?
        .last_insert_rowid();

    Ok(User {
        id,
        username: username.to_string(),
        is_admin,
    })
}

pub async fn find_user_by_id_in_db(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT id, username, is_admin FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to load user {}", user_id))
}

/// Exact, case-sensitive username lookup.
pub async fn find_user_by_username_in_db(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT id, username, is_admin FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up user by name")
}

/// The only query that reads `password_hash`; its result never leaves the
/// account service.
pub async fn find_credentials_in_db(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<(User, String)>> {
    let row = sqlx::query_as::<_, (i64, String, bool, String)>(
        "SELECT id, username, is_admin, password_hash FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to load credentials")?;

    Ok(row.map(|(id, username, is_admin, hash)| {
        (
            User {
                id,
                username,
                is_admin,
            },
            hash,
        )
    }))
}

pub async fn list_users_in_db(conn: &mut SqliteConnection) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT id, username, is_admin FROM users ORDER BY id ASC")
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list users")
}

pub async fn set_admin_in_db(conn: &mut SqliteConnection, user_id: i64, is_admin: bool) -> Result<()> {
    sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
        .bind(is_admin)
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to update admin flag of user {}", user_id))?;

    Ok(())
}

/// Deletes a user. Owned tasks, their permissions, permissions granted to
/// the user and the user's sessions go with it.
pub async fn delete_user_in_db(conn: &mut SqliteConnection, user_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to delete user {}", user_id))?;

    Ok(result.rows_affected() > 0)
}

// --- Tasks ---

pub async fn create_task_in_db(
    conn: &mut SqliteConnection,
    owner_id: i64,
    title: &str,
    description: Option<&str>,
) -> Result<Task> {
    let created_at: DateTime<Utc> = Utc::now();
    let status = TaskStatus::NotStarted;

    debug!(
        "Insert values: owner_id={}, title={}, description={:?}, status={}, created_at={}",
        owner_id, title, description, status, created_at
    );

    let id = sqlx::query(
        "INSERT INTO tasks (title, description, status, owner_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(title)
    .bind(description)
    .bind(status)
    .bind(owner_id)
    .bind(created_at)
    .execute(&mut *conn)
    .await
    .context("Failed to insert task into DB")?
    .last_insert_rowid();

    Ok(Task {
        id,
        title: title.to_string(),
        description: description.map(str::to_string),
        status,
        owner_id,
        created_at,
    })
}

pub async fn find_task_in_db(conn: &mut SqliteConnection, task_id: i64) -> Result<Option<Task>> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to load task {}", task_id))
}

pub async fn list_all_tasks_in_db(conn: &mut SqliteConnection) -> Result<Vec<Task>> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks ORDER BY id ASC")
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list all tasks")
}

/// Tasks owned by `user_id` plus tasks shared with them through a
/// permission with `can_view` set. Each task appears once.
pub async fn list_visible_tasks_in_db(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<Task>> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT t.* FROM tasks t
        WHERE t.owner_id = ?1
           OR EXISTS (
                SELECT 1 FROM permissions p
                WHERE p.task_id = t.id AND p.user_id = ?1 AND p.can_view = 1
           )
        ORDER BY t.id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .with_context(|| format!("Failed to list tasks visible to user {}", user_id))
}

pub async fn update_task_details_in_db(
    conn: &mut SqliteConnection,
    task_id: i64,
    title: &str,
    description: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE tasks SET title = ?, description = ? WHERE id = ?")
        .bind(title)
        .bind(description)
        .bind(task_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to update task {}", task_id))?;

    Ok(())
}

pub async fn update_task_status_in_db(
    conn: &mut SqliteConnection,
    task_id: i64,
    status: TaskStatus,
) -> Result<()> {
    sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
        .bind(status)
        .bind(task_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to update status of task {}", task_id))?;

    Ok(())
}

/// Hard deletes a task; its permissions cascade.
/// Returns true if a task was removed, false if no task had the given ID.
pub async fn delete_task_in_db(conn: &mut SqliteConnection, task_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to delete task with ID: {}", task_id))?;

    let rows_affected = result.rows_affected();
    info!("Deleted {} rows for task ID: {}", rows_affected, task_id);

    Ok(rows_affected > 0)
}

// --- Permissions ---

pub async fn find_permission_in_db(
    conn: &mut SqliteConnection,
    task_id: i64,
    user_id: i64,
) -> Result<Option<Permission>> {
    sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE task_id = ? AND user_id = ?")
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up permission")
}

/// Grants full view access, inserting the row or upgrading the existing one.
pub async fn upsert_view_permission_in_db(
    conn: &mut SqliteConnection,
    task_id: i64,
    user_id: i64,
) -> Result<Permission> {
    sqlx::query_as::<_, Permission>(
        r#"
        INSERT INTO permissions (task_id, user_id, can_view, can_view_status)
        VALUES (?, ?, 1, 1)
        ON CONFLICT (task_id, user_id) DO UPDATE SET can_view = 1, can_view_status = 1
        RETURNING *
        "#,
    )
    .bind(task_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("Failed to grant user {} access to task {}", user_id, task_id))
}

#[cfg(test)]
pub async fn list_permissions_for_task_in_db(
    conn: &mut SqliteConnection,
    task_id: i64,
) -> Result<Vec<Permission>> {
    sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE task_id = ? ORDER BY id ASC")
        .bind(task_id)
        .fetch_all(&mut *conn)
        .await
        .with_context(|| format!("Failed to list permissions of task {}", task_id))
}
