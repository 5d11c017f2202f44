//! User account model.
//!
//! # Responsibility
//! - Define the persisted account record and its insert payload.
//! - Normalize and validate account fields before persistence.
//!
//! # Invariants
//! - `email` is the login identifier; `username` is the display identity.
//! - Emails are stored with a lower-cased domain part.
//! - The username `Deleted` and the email `deleted@gmail.com` belong to the
//!   sentinel account only.

use super::password::{self, PasswordDigest};
use super::{check_max_chars, UserId, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const USERNAME_MAX_CHARS: usize = 15;
pub const EMAIL_MAX_CHARS: usize = 128;

/// Username of the placeholder account that inherits historical references.
pub const SENTINEL_USERNAME: &str = "Deleted";
/// Email of the placeholder account.
pub const SENTINEL_EMAIL: &str = "deleted@gmail.com";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Persisted user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// bcrypt hash, see [`password`].
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(skip_serializing, default)]
    pub salt: String,
    pub email_verified: bool,
    /// Relative path of an uploaded avatar image.
    pub avatar: Option<String>,
    /// Unix epoch milliseconds.
    pub date_joined: i64,
    pub last_updated: Option<i64>,
    pub last_login: Option<i64>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl User {
    /// Checks a raw password against the stored digest.
    pub fn check_password(&self, raw: &str) -> bool {
        password::verify_password(raw, &self.password)
    }

    pub fn has_usable_password(&self) -> bool {
        password::is_usable(&self.password)
    }

    /// Replaces the stored hash; `None` makes the password unusable.
    pub fn set_password(&mut self, raw: Option<&str>) -> Result<(), ValidationError> {
        let PasswordDigest { hash, salt } = password::make_password(raw)?;
        self.password = hash;
        self.salt = salt;
        Ok(())
    }

    /// Returns whether this is the deleted-account placeholder.
    pub fn is_sentinel(&self) -> bool {
        self.username == SENTINEL_USERNAME
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

/// Insert payload for a new account.
///
/// `username` stays optional here so a missing username is rejected by the
/// store's NOT NULL constraint inside the write transaction, the same way a
/// duplicate one is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub salt: String,
    pub email_verified: bool,
    pub avatar: Option<String>,
    pub date_joined: i64,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    /// Builds a regular account payload.
    ///
    /// # Defaults
    /// - `email_verified = false`, `is_active = false`.
    /// - `is_staff = false`, `is_superuser = false`.
    /// - A missing password yields an unusable digest.
    ///
    /// # Errors
    /// - `MissingEmail` when `email` is absent or blank; nothing is written.
    /// - `InvalidPassword` when the hasher rejects `password`.
    pub fn new(
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
        date_joined: i64,
    ) -> Result<Self, ValidationError> {
        let email = match email.map(str::trim) {
            Some(value) if !value.is_empty() => normalize_email(value),
            _ => return Err(ValidationError::MissingEmail),
        };
        let PasswordDigest { hash, salt } = password::make_password(password)?;

        Ok(Self {
            username: username.map(str::to_string),
            email,
            password: hash,
            salt,
            email_verified: false,
            avatar: None,
            date_joined,
            is_active: false,
            is_staff: false,
            is_superuser: false,
        })
    }

    /// Marks the payload as a privileged account.
    pub fn into_superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }

    /// Validates field-level constraints the store cannot express clearly.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = self.username.as_deref() {
            validate_username(username)?;
        }
        validate_email(&self.email)?;
        check_max_chars("password", &self.password, 254)?;
        check_max_chars("salt", &self.salt, 128)?;
        Ok(())
    }
}

/// Lower-cases the domain part of an email address.
///
/// The local part is left untouched. Values without `@` are returned as-is
/// and rejected later by [`validate_email`].
pub fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.trim().to_string(),
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    check_max_chars("email", email, EMAIL_MAX_CHARS)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    if normalize_email(email).eq_ignore_ascii_case(SENTINEL_EMAIL) {
        return Err(ValidationError::ReservedEmail(email.to_string()));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }
    check_max_chars("username", username, USERNAME_MAX_CHARS)?;
    if username.eq_ignore_ascii_case(SENTINEL_USERNAME) {
        return Err(ValidationError::ReservedUsername(username.to_string()));
    }
    Ok(())
}
