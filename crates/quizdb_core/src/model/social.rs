//! Player relationships and login activity.

use super::{LoginAttemptId, RelationshipId, UserId, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// State of a pairing between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Pending,
    Friends,
    Blocked,
}

impl RelationshipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Friends => "friends",
            Self::Blocked => "blocked",
        }
    }
}

impl FromStr for RelationshipStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "friends" => Ok(Self::Friends),
            "blocked" => Ok(Self::Blocked),
            other => Err(ValidationError::UnknownChoice {
                field: "relationship_status",
                value: other.to_string(),
            }),
        }
    }
}

impl Display for RelationshipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairing of two users. Undirected in intent: `user_first` is whoever
/// initiated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRelationship {
    pub id: RelationshipId,
    pub user_first: UserId,
    pub user_second: UserId,
    pub relationship_status: RelationshipStatus,
}

impl UserRelationship {
    /// Returns the other side of the pairing, if `user` takes part in it.
    pub fn other_user(&self, user: UserId) -> Option<UserId> {
        if self.user_first == user {
            Some(self.user_second)
        } else if self.user_second == user {
            Some(self.user_first)
        } else {
            None
        }
    }
}

impl Display for UserRelationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.relationship_status, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRelationship {
    pub user_first: UserId,
    pub user_second: UserId,
    pub relationship_status: RelationshipStatus,
}

impl NewUserRelationship {
    /// New pairings start out `pending`.
    pub fn request(user_first: UserId, user_second: UserId) -> Self {
        Self {
            user_first,
            user_second,
            relationship_status: RelationshipStatus::Pending,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_first == self.user_second {
            return Err(ValidationError::SelfRelationship(self.user_first));
        }
        Ok(())
    }
}

/// Outcome of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Failed,
    Success,
}

impl LoginStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Success => "success",
        }
    }
}

impl FromStr for LoginStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "failed" => Ok(Self::Failed),
            "success" => Ok(Self::Success),
            other => Err(ValidationError::UnknownChoice {
                field: "login_status",
                value: other.to_string(),
            }),
        }
    }
}

impl Display for LoginStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: LoginAttemptId,
    pub user: UserId,
    /// Unix epoch milliseconds of the attempt.
    pub last_login: i64,
    pub login_status: LoginStatus,
}

impl Display for LoginAttempt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.login_status, f)
    }
}
