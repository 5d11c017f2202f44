//! What happens to rows that reference a user when that user is deleted.
//!
//! # Responsibility
//! - Declare every `users(id)` reference together with its delete action.
//! - Rewrite redirect-on-delete references to the sentinel account.
//!
//! # Invariants
//! - `Cascade` entries are enforced by `ON DELETE CASCADE` in the schema.
//! - `RedirectToSentinel` entries have no schema action and must be rewritten
//!   by [`redirect_user_references`] before the user row is removed;
//!   otherwise the foreign key rejects the delete.
//! - Completed-game history (results, game creators) is never deleted along
//!   with an account.

use crate::model::UserId;
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Action applied to a referencing row when its user is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Remove the referencing row.
    Cascade,
    /// Point the reference at the sentinel account and keep the row.
    RedirectToSentinel,
}

/// One foreign-key column that references `users(id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserReference {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: OnDelete,
}

const fn cascade(table: &'static str, column: &'static str) -> UserReference {
    UserReference {
        table,
        column,
        on_delete: OnDelete::Cascade,
    }
}

const fn redirect(table: &'static str, column: &'static str) -> UserReference {
    UserReference {
        table,
        column,
        on_delete: OnDelete::RedirectToSentinel,
    }
}

/// Every reference to `users(id)` in the schema.
pub const USER_REFERENCES: &[UserReference] = &[
    cascade("user_answers", "user_id"),
    cascade("user_relationships", "user_first_id"),
    cascade("user_relationships", "user_second_id"),
    cascade("login_attempts", "user_id"),
    cascade("practices", "user_id"),
    cascade("user_scores", "user_id"),
    redirect("results", "winner_id"),
    redirect("results", "second_place_id"),
    redirect("results", "third_place_id"),
    redirect("results", "fourth_place_id"),
    redirect("results", "fifth_place_id"),
    redirect("results", "sixth_place_id"),
    redirect("games", "created_by_id"),
];

/// References rewritten to the sentinel instead of being deleted.
pub fn redirect_references() -> impl Iterator<Item = &'static UserReference> {
    USER_REFERENCES
        .iter()
        .filter(|reference| reference.on_delete == OnDelete::RedirectToSentinel)
}

/// Counts rows whose redirect-on-delete columns point at `user`.
pub(crate) fn count_redirect_references(conn: &Connection, user: UserId) -> RepoResult<i64> {
    let mut total = 0;
    for reference in redirect_references() {
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?1;",
                reference.table, reference.column
            ),
            [user],
            |row| row.get(0),
        )?;
        total += count;
    }
    Ok(total)
}

/// Rewrites every redirect-on-delete reference from `from` to `to`.
///
/// Returns the number of column values rewritten. A result row in which the
/// user holds two placements counts twice.
pub(crate) fn redirect_user_references(
    conn: &Connection,
    from: UserId,
    to: UserId,
) -> RepoResult<usize> {
    let mut rewritten = 0;
    for reference in redirect_references() {
        rewritten += conn.execute(
            &format!(
                "UPDATE {table} SET {column} = ?2 WHERE {column} = ?1;",
                table = reference.table,
                column = reference.column
            ),
            [from, to],
        )?;
    }
    Ok(rewritten)
}
