//! Row-level operations on the `users` table.

use futures::StreamExt;
use uuid::Uuid;

use super::{SqlxBackend, SqlxResultExt};
use crate::Result;
use crate::backend::UserStream;
use crate::backend::errors::BackendError;
use crate::permissions::Permissions;
use crate::user::UserRecord;

/// `(id, username, permissions, flags)` as stored.
type UserRow = (String, String, Option<i64>, Option<i64>);

const SELECT_USERS: &str = "SELECT id, username, permissions, flags FROM users";
const SELECT_USERS_ORDERED: &str =
    "SELECT id, username, permissions, flags FROM users ORDER BY username";

// Masks are stored as their two's-complement bit pattern.
fn to_column(mask: u64) -> i64 {
    mask as i64
}

fn from_column(value: i64) -> u64 {
    value as u64
}

fn row_to_record((id, username, permissions, flags): UserRow) -> Result<UserRecord> {
    let id = Uuid::parse_str(&id).map_err(|e| BackendError::CorruptRecord {
        reason: format!("user {username} has invalid id {id:?}: {e}"),
    })?;
    let permissions = match (permissions, flags) {
        (None, None) => None,
        (p, f) => Some(Permissions::new(
            p.map(from_column).unwrap_or_default(),
            f.map(from_column).unwrap_or_default(),
        )),
    };
    Ok(UserRecord::with_id(id, username, permissions))
}

fn mask_columns(user: &UserRecord) -> (Option<i64>, Option<i64>) {
    match &user.permissions {
        Some(p) => (Some(to_column(p.permissions)), Some(to_column(p.flags))),
        None => (None, None),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

pub(super) fn find_all(backend: &SqlxBackend) -> UserStream<'_> {
    sqlx::query_as::<_, UserRow>(SELECT_USERS_ORDERED)
        .fetch(backend.pool())
        .map(|row| row.sql_context("Failed to list users").and_then(row_to_record))
        .boxed()
}

pub(super) async fn find_by_username(
    backend: &SqlxBackend,
    username: &str,
) -> Result<Option<UserRecord>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USERS} WHERE username = $1"))
        .bind(username)
        .fetch_optional(backend.pool())
        .await
        .sql_context("Failed to look up user")?;
    row.map(row_to_record).transpose()
}

pub(super) async fn update(backend: &SqlxBackend, user: &UserRecord) -> Result<()> {
    let (permissions, flags) = mask_columns(user);
    let result = sqlx::query(
        "UPDATE users SET username = $1, permissions = $2, flags = $3 WHERE id = $4",
    )
    .bind(&user.username)
    .bind(permissions)
    .bind(flags)
    .bind(user.id().to_string())
    .execute(backend.pool())
    .await;

    let result = match result {
        Err(e) if is_unique_violation(&e) => {
            return Err(BackendError::DuplicateUsername {
                username: user.username.clone(),
            }
            .into());
        }
        other => other.sql_context("Failed to update user")?,
    };

    if result.rows_affected() == 0 {
        return Err(BackendError::UserNotFound { id: user.id() }.into());
    }
    Ok(())
}

pub(super) async fn insert(backend: &SqlxBackend, user: &UserRecord) -> Result<()> {
    let (permissions, flags) = mask_columns(user);
    let result = sqlx::query(
        "INSERT INTO users (id, username, permissions, flags) VALUES ($1, $2, $3, $4)",
    )
    .bind(user.id().to_string())
    .bind(&user.username)
    .bind(permissions)
    .bind(flags)
    .execute(backend.pool())
    .await;

    match result {
        Err(e) if is_unique_violation(&e) => Err(BackendError::DuplicateUsername {
            username: user.username.clone(),
        }
        .into()),
        other => other.sql_context("Failed to insert user").map(|_| ()),
    }
}

pub(super) async fn count(backend: &SqlxBackend) -> Result<u64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to count users")?;
    Ok(u64::try_from(count).unwrap_or_default())
}
