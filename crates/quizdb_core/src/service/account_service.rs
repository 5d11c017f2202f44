//! Account use-case service.
//!
//! # Responsibility
//! - Act as the user factory: normalize email, hash password, fill defaults.
//! - Expose deletion with the sentinel redirect policy.
//!
//! # Invariants
//! - A missing email is rejected before any write.
//! - Missing or duplicate usernames/emails are rejected by the store and
//!   leave the user count unchanged.

use crate::model::user::{NewUser, User};
use crate::model::{now_epoch_ms, UserId, ValidationError};
use crate::repo::user_repo::{UserDeletion, UserListQuery, UserRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    /// Input rejected before persistence.
    Validation(ValidationError),
    /// Store rejected the write (duplicate or missing unique field).
    Integrity(String),
    UserNotFound(UserId),
    /// Target is the deleted-account placeholder.
    SentinelProtected(UserId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Integrity(message) => write!(f, "account rejected by store: {message}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::SentinelProtected(id) => {
                write!(f, "user {id} is the deleted-account placeholder")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent account state: {details}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for AccountServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Integrity(message) => Self::Integrity(message),
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(id),
            RepoError::SentinelProtected(id) => Self::SentinelProtected(id),
            other => Self::Repo(other),
        }
    }
}

pub type AccountResult<T> = Result<T, AccountServiceError>;

/// Account facade over a user repository.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a regular, inactive, unverified account.
    ///
    /// # Errors
    /// - `Validation(MissingEmail)` when `email` is absent; nothing is written.
    /// - `Integrity` when `username` is absent or either identifier is taken.
    pub fn create_user(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> AccountResult<User> {
        let new_user = NewUser::new(username, email, password, now_epoch_ms())?;
        self.insert_and_read_back(&new_user)
    }

    /// Creates a staff account with every permission.
    pub fn create_superuser(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> AccountResult<User> {
        let new_user = NewUser::new(username, email, password, now_epoch_ms())?.into_superuser();
        self.insert_and_read_back(&new_user)
    }

    pub fn get_user(&self, id: UserId) -> AccountResult<Option<User>> {
        Ok(self.repo.get_user(id)?)
    }

    pub fn get_user_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        Ok(self.repo.get_user_by_email(email)?)
    }

    /// Lists regular accounts; the sentinel is left out.
    pub fn list_users(&self, limit: Option<u32>, offset: u32) -> AccountResult<Vec<User>> {
        let query = UserListQuery {
            limit,
            offset,
            ..UserListQuery::default()
        };
        Ok(self.repo.list_users(&query)?)
    }

    pub fn count_users(&self) -> AccountResult<i64> {
        Ok(self.repo.count_users()?)
    }

    /// Checks `raw` against the stored password of `id`.
    ///
    /// A match stamps `last_login`. The sentinel never matches.
    pub fn check_password(&self, id: UserId, raw: &str) -> AccountResult<bool> {
        let user = self.require_user(id)?;
        if user.is_sentinel() || !user.check_password(raw) {
            return Ok(false);
        }
        self.repo.record_last_login(id, now_epoch_ms())?;
        Ok(true)
    }

    /// Replaces the password of `id`; `None` makes it unusable.
    pub fn set_password(&self, id: UserId, raw: Option<&str>) -> AccountResult<()> {
        let mut user = self.require_user(id)?;
        user.set_password(raw)?;
        self.repo.update_user(&user)?;
        Ok(())
    }

    /// Marks the account's email as verified and activates it.
    pub fn verify_email(&self, id: UserId) -> AccountResult<User> {
        let mut user = self.require_user(id)?;
        user.email_verified = true;
        user.is_active = true;
        self.repo.update_user(&user)?;
        self.require_user(id)
    }

    /// Deletes an account.
    ///
    /// Results and games keep their rows and point at the sentinel; answers,
    /// relationships, login attempts, practices and scores of the account
    /// are removed.
    pub fn delete_user(&self, id: UserId) -> AccountResult<UserDeletion> {
        let deletion = self.repo.delete_user(id)?;
        info!(
            "event=account_delete module=service status=ok user_id={} sentinel_used={}",
            id,
            deletion.sentinel_id.is_some()
        );
        Ok(deletion)
    }

    pub fn get_or_create_sentinel_user(&self) -> AccountResult<User> {
        Ok(self.repo.get_or_create_sentinel_user()?)
    }

    fn insert_and_read_back(&self, new_user: &NewUser) -> AccountResult<User> {
        let id = self.repo.create_user(new_user)?;
        self.repo
            .get_user(id)?
            .ok_or(AccountServiceError::InconsistentState(
                "created user not found in read-back",
            ))
    }

    fn require_user(&self, id: UserId) -> AccountResult<User> {
        self.repo
            .get_user(id)?
            .ok_or(AccountServiceError::UserNotFound(id))
    }
}
