//! Postgres implementations of the store traits

pub mod chats;
pub mod contents;
pub mod users;

use super::StoreError;

/// Map unique-key violations to a conflict, everything else stays a database error
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> StoreError {
    let is_unique = err
        .as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false);

    if is_unique {
        StoreError::Conflict(message.to_string())
    } else {
        StoreError::Database(err)
    }
}
