//! User account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `users` table.
//! - Resolve the sentinel account and apply the user delete policy.
//!
//! # Invariants
//! - Uniqueness of `username` and `email` is enforced by the store; a
//!   violating write fails with `RepoError::Integrity` and persists nothing.
//! - At most one sentinel row exists; creation races are settled by the
//!   `username` uniqueness constraint.
//! - The sentinel row is never updated or deleted through this repository.

use crate::model::password;
use crate::model::user::{
    normalize_email, validate_email, validate_username, NewUser, User, SENTINEL_EMAIL,
    SENTINEL_USERNAME,
};
use crate::model::{now_epoch_ms, UserId};
use crate::repo::delete_policy::{count_redirect_references, redirect_user_references};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, push_pagination, RepoError, RepoResult,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    password,
    salt,
    email_verified,
    avatar,
    date_joined,
    last_updated,
    last_login,
    is_active,
    is_staff,
    is_superuser
FROM users";

/// Query options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub active_only: bool,
    pub include_sentinel: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Outcome of deleting one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserDeletion {
    pub user_id: UserId,
    /// Column values rewritten to the sentinel.
    pub redirected_references: usize,
    /// Sentinel id, set only when at least one reference was redirected.
    pub sentinel_id: Option<UserId>,
}

/// Repository interface for user accounts.
pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>>;
    /// Counts every account row, the sentinel included.
    fn count_users(&self) -> RepoResult<i64>;
    /// Persists mutable account fields and stamps `last_updated`.
    fn update_user(&self, user: &User) -> RepoResult<()>;
    /// Stamps `last_login` without touching `last_updated`.
    fn record_last_login(&self, id: UserId, at: i64) -> RepoResult<()>;
    /// Deletes one account, redirecting history to the sentinel first.
    fn delete_user(&self, id: UserId) -> RepoResult<UserDeletion>;
    fn get_or_create_sentinel_user(&self) -> RepoResult<User>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        user.validate()?;
        let email = normalize_email(&user.email);

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO users (
                username,
                email,
                password,
                salt,
                email_verified,
                avatar,
                date_joined,
                is_active,
                is_staff,
                is_superuser
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                user.username.as_deref(),
                email.as_str(),
                user.password.as_str(),
                user.salt.as_str(),
                bool_to_int(user.email_verified),
                user.avatar.as_deref(),
                user.date_joined,
                bool_to_int(user.is_active),
                bool_to_int(user.is_staff),
                bool_to_int(user.is_superuser),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        load_user(self.conn, "id", Value::Integer(id))
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        load_user(self.conn, "username", Value::Text(username.to_string()))
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        load_user(self.conn, "email", Value::Text(normalize_email(email)))
    }

    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.active_only {
            sql.push_str(" AND is_active = 1");
        }
        if !query.include_sentinel {
            sql.push_str(" AND username <> ?");
            bind_values.push(Value::Text(SENTINEL_USERNAME.to_string()));
        }

        sql.push_str(" ORDER BY id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        Ok(users)
    }

    fn count_users(&self) -> RepoResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        Ok(count)
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        let stored = load_user(self.conn, "id", Value::Integer(user.id))?.ok_or(
            RepoError::NotFound {
                entity: "user",
                id: user.id,
            },
        )?;
        if stored.is_sentinel() {
            return Err(RepoError::SentinelProtected(user.id));
        }
        validate_username(&user.username)?;
        let email = normalize_email(&user.email);
        validate_email(&email)?;

        self.conn.execute(
            "UPDATE users
             SET
                username = ?1,
                email = ?2,
                password = ?3,
                salt = ?4,
                email_verified = ?5,
                avatar = ?6,
                last_login = ?7,
                is_active = ?8,
                is_staff = ?9,
                is_superuser = ?10,
                last_updated = ?11
             WHERE id = ?12;",
            params![
                user.username.as_str(),
                email.as_str(),
                user.password.as_str(),
                user.salt.as_str(),
                bool_to_int(user.email_verified),
                user.avatar.as_deref(),
                user.last_login,
                bool_to_int(user.is_active),
                bool_to_int(user.is_staff),
                bool_to_int(user.is_superuser),
                now_epoch_ms(),
                user.id,
            ],
        )?;

        Ok(())
    }

    fn record_last_login(&self, id: UserId, at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2;",
            params![at, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        Ok(())
    }

    fn delete_user(&self, id: UserId) -> RepoResult<UserDeletion> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let user = load_user(&tx, "id", Value::Integer(id))?
            .ok_or(RepoError::NotFound { entity: "user", id })?;
        if user.is_sentinel() {
            return Err(RepoError::SentinelProtected(id));
        }

        let (redirected_references, sentinel_id) = if count_redirect_references(&tx, id)? > 0 {
            let sentinel = get_or_create_sentinel(&tx)?;
            let rewritten = redirect_user_references(&tx, id, sentinel.id)?;
            (rewritten, Some(sentinel.id))
        } else {
            (0, None)
        };

        tx.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!(
            "event=user_delete module=repo status=ok user_id={id} redirected_refs={redirected_references}"
        );
        Ok(UserDeletion {
            user_id: id,
            redirected_references,
            sentinel_id,
        })
    }

    fn get_or_create_sentinel_user(&self) -> RepoResult<User> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sentinel = get_or_create_sentinel(&tx)?;
        tx.commit()?;
        Ok(sentinel)
    }
}

/// Looks up the sentinel, inserting it on first use.
///
/// A concurrent or earlier insert wins through the uniqueness constraint and
/// this call reads the surviving row.
fn get_or_create_sentinel(conn: &Connection) -> RepoResult<User> {
    let digest = password::unusable_password();
    let inserted = conn.execute(
        "INSERT INTO users (
            username,
            email,
            password,
            salt,
            email_verified,
            date_joined,
            is_active,
            is_staff,
            is_superuser
        ) VALUES (?1, ?2, ?3, ?4, 0, ?5, 0, 0, 0)
        ON CONFLICT DO NOTHING;",
        params![
            SENTINEL_USERNAME,
            SENTINEL_EMAIL,
            digest.hash.as_str(),
            digest.salt.as_str(),
            now_epoch_ms(),
        ],
    )?;
    if inserted == 1 {
        info!(
            "event=sentinel_create module=repo status=ok user_id={}",
            conn.last_insert_rowid()
        );
    }

    load_user(conn, "username", Value::Text(SENTINEL_USERNAME.to_string()))?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "sentinel account could not be created; email `{SENTINEL_EMAIL}` is taken"
        ))
    })
}

fn load_user(conn: &Connection, column: &'static str, value: Value) -> RepoResult<Option<User>> {
    conn.query_row(
        &format!("{USER_SELECT_SQL} WHERE {column} = ?1;"),
        [value],
        |row| Ok(parse_user_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password: row.get("password")?,
        salt: row.get("salt")?,
        email_verified: int_to_bool(row.get("email_verified")?, "users.email_verified")?,
        avatar: row.get("avatar")?,
        date_joined: row.get("date_joined")?,
        last_updated: row.get("last_updated")?,
        last_login: row.get("last_login")?,
        is_active: int_to_bool(row.get("is_active")?, "users.is_active")?,
        is_staff: int_to_bool(row.get("is_staff")?, "users.is_staff")?,
        is_superuser: int_to_bool(row.get("is_superuser")?, "users.is_superuser")?,
    })
}
