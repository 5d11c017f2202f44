//! Domain model for accounts, questions, games and scores.
//!
//! # Responsibility
//! - Define the records persisted by the repository layer.
//! - Validate field-level constraints before any write is attempted.
//! - Own value conventions shared by every table (ids, timestamps, choices).
//!
//! # Invariants
//! - Ids are SQLite row ids assigned on insert; `New*` payloads carry none.
//! - Timestamps are Unix epoch milliseconds supplied by the caller or by a
//!   service factory, never read from ambient state inside the model.
//! - Choice enums round-trip through the exact strings stored on disk.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod game;
pub mod password;
pub mod question;
pub mod score;
pub mod social;
pub mod user;

pub type UserId = i64;
pub type QuestionId = i64;
pub type AnswerId = i64;
pub type UserAnswerId = i64;
pub type RelationshipId = i64;
pub type LoginAttemptId = i64;
pub type PracticeId = i64;
pub type ResultId = i64;
pub type SuddenDeathId = i64;
pub type GameId = i64;
pub type UserScoreId = i64;

/// Field-level validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account creation requires an email address.
    MissingEmail,
    /// Email does not look like `local@domain`.
    InvalidEmail(String),
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Text field exceeds its stored character limit.
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Numeric field is outside its stored range.
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },
    /// Username is reserved for the deleted-account placeholder.
    ReservedUsername(String),
    /// Email is reserved for the deleted-account placeholder.
    ReservedEmail(String),
    /// Password was rejected by the hasher.
    InvalidPassword(String),
    /// Score total differs from `base_score + bonus_score` (thousandths).
    ScoreTotalMismatch { expected: i32, actual: i32 },
    /// A relationship must pair two different users.
    SelfRelationship(UserId),
    /// Stored choice string is not part of the enumeration.
    UnknownChoice {
        field: &'static str,
        value: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEmail => write!(f, "email address is required"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "`{field}` allows at most {max_chars} characters, got {actual_chars}"
            ),
            Self::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "`{field}` must be within {min}..={max}, got {actual}"),
            Self::ReservedUsername(value) => write!(f, "username `{value}` is reserved"),
            Self::ReservedEmail(value) => write!(f, "email `{value}` is reserved"),
            Self::InvalidPassword(message) => write!(f, "password cannot be hashed: {message}"),
            Self::ScoreTotalMismatch { expected, actual } => write!(
                f,
                "`total_score` must equal base plus bonus ({expected} thousandths), got {actual}"
            ),
            Self::SelfRelationship(user) => {
                write!(f, "user {user} cannot have a relationship with itself")
            }
            Self::UnknownChoice { field, value } => {
                write!(f, "`{value}` is not a valid choice for `{field}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Current wall-clock time as Unix epoch milliseconds.
///
/// Used by service factories to fill timestamp defaults.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

pub(crate) fn check_max_chars(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ValidationError::FieldTooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}

pub(crate) fn check_required_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    check_max_chars(field, value, max_chars)
}

pub(crate) fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}
