//! Relationship and login-activity repository contracts and SQLite
//! implementation.
//!
//! # Invariants
//! - Both sides of a relationship and every login attempt are removed along
//!   with the account they reference.
//! - Relationship listing matches the user on either side.

use crate::model::social::{
    LoginAttempt, LoginStatus, NewUserRelationship, RelationshipStatus, UserRelationship,
};
use crate::model::{LoginAttemptId, RelationshipId, UserId};
use crate::repo::{ensure_connection_ready, parse_choice, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const RELATIONSHIP_SELECT_SQL: &str = "SELECT
    id,
    user_first_id,
    user_second_id,
    relationship_status
FROM user_relationships";

/// Repository interface for relationships between players and login history.
pub trait SocialRepository {
    fn create_relationship(&self, relationship: &NewUserRelationship)
        -> RepoResult<RelationshipId>;
    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<UserRelationship>>;
    fn set_relationship_status(
        &self,
        id: RelationshipId,
        status: RelationshipStatus,
    ) -> RepoResult<()>;
    /// Lists relationships where `user` is on either side.
    fn list_relationships(
        &self,
        user: UserId,
        status: Option<RelationshipStatus>,
    ) -> RepoResult<Vec<UserRelationship>>;
    fn delete_relationship(&self, id: RelationshipId) -> RepoResult<()>;
    fn record_login_attempt(
        &self,
        user: UserId,
        status: LoginStatus,
        attempted_at: i64,
    ) -> RepoResult<LoginAttemptId>;
    /// Lists attempts newest first.
    fn list_login_attempts(&self, user: UserId, limit: Option<u32>)
        -> RepoResult<Vec<LoginAttempt>>;
}

/// SQLite-backed social repository.
pub struct SqliteSocialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSocialRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["user_relationships", "login_attempts"])?;
        Ok(Self { conn })
    }
}

impl SocialRepository for SqliteSocialRepository<'_> {
    fn create_relationship(
        &self,
        relationship: &NewUserRelationship,
    ) -> RepoResult<RelationshipId> {
        relationship.validate()?;

        self.conn.execute(
            "INSERT INTO user_relationships (user_first_id, user_second_id, relationship_status)
             VALUES (?1, ?2, ?3);",
            params![
                relationship.user_first,
                relationship.user_second,
                relationship.relationship_status.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<UserRelationship>> {
        self.conn
            .query_row(
                &format!("{RELATIONSHIP_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_relationship_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn set_relationship_status(
        &self,
        id: RelationshipId,
        status: RelationshipStatus,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE user_relationships SET relationship_status = ?1 WHERE id = ?2;",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "relationship",
                id,
            });
        }
        Ok(())
    }

    fn list_relationships(
        &self,
        user: UserId,
        status: Option<RelationshipStatus>,
    ) -> RepoResult<Vec<UserRelationship>> {
        let mut sql =
            format!("{RELATIONSHIP_SELECT_SQL} WHERE (user_first_id = ? OR user_second_id = ?)");
        let mut bind_values = vec![Value::Integer(user), Value::Integer(user)];
        if let Some(status) = status {
            sql.push_str(" AND relationship_status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut relationships = Vec::new();
        while let Some(row) = rows.next()? {
            relationships.push(parse_relationship_row(row)?);
        }

        Ok(relationships)
    }

    fn delete_relationship(&self, id: RelationshipId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM user_relationships WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "relationship",
                id,
            });
        }
        Ok(())
    }

    fn record_login_attempt(
        &self,
        user: UserId,
        status: LoginStatus,
        attempted_at: i64,
    ) -> RepoResult<LoginAttemptId> {
        self.conn.execute(
            "INSERT INTO login_attempts (user_id, last_login, login_status)
             VALUES (?1, ?2, ?3);",
            params![user, attempted_at, status.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_login_attempts(
        &self,
        user: UserId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<LoginAttempt>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, last_login, login_status
             FROM login_attempts
             WHERE user_id = ?1
             ORDER BY last_login DESC, id DESC
             LIMIT ?2;",
        )?;
        let limit = limit.map_or(-1, i64::from);
        let mut rows = stmt.query(params![user, limit])?;
        let mut attempts = Vec::new();
        while let Some(row) = rows.next()? {
            let status: String = row.get("login_status")?;
            attempts.push(LoginAttempt {
                id: row.get("id")?,
                user: row.get("user_id")?,
                last_login: row.get("last_login")?,
                login_status: parse_choice(&status, "login_attempts.login_status")?,
            });
        }

        Ok(attempts)
    }
}

fn parse_relationship_row(row: &Row<'_>) -> RepoResult<UserRelationship> {
    let status: String = row.get("relationship_status")?;
    Ok(UserRelationship {
        id: row.get("id")?,
        user_first: row.get("user_first_id")?,
        user_second: row.get("user_second_id")?,
        relationship_status: parse_choice(&status, "user_relationships.relationship_status")?,
    })
}
