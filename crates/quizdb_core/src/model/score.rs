//! Fixed-point score with three decimal places.
//!
//! Scores are `decimal(6, 3)` on disk, stored as integer thousandths so the
//! value survives round-trips without float drift.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Largest magnitude representable with six digits, three of them decimal.
pub const MAX_THOUSANDTHS: i32 = 999_999;

/// Score in thousandths of a point, within `-999.999..=999.999`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct FixedScore(i32);

impl FixedScore {
    pub const ZERO: Self = Self(0);

    /// Builds a score from thousandths of a point.
    pub fn from_thousandths(value: i32) -> Result<Self, ValidationError> {
        if !(-MAX_THOUSANDTHS..=MAX_THOUSANDTHS).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "score",
                min: i64::from(-MAX_THOUSANDTHS),
                max: i64::from(MAX_THOUSANDTHS),
                actual: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Builds a score from whole points.
    pub fn from_points(points: i16) -> Result<Self, ValidationError> {
        Self::from_thousandths(i32::from(points) * 1000)
    }

    pub fn thousandths(self) -> i32 {
        self.0
    }

    /// Adds two scores, failing when the sum leaves the stored range.
    pub fn checked_add(self, other: Self) -> Result<Self, ValidationError> {
        Self::from_thousandths(self.0 + other.0)
    }
}

impl Display for FixedScore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:03}", magnitude / 1000, magnitude % 1000)
    }
}

/// Failure to parse a decimal score string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseScoreError(String);

impl Display for ParseScoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid score `{}`", self.0)
    }
}

impl Error for ParseScoreError {}

impl FromStr for FixedScore {
    type Err = ParseScoreError;

    /// Parses `12`, `12.5`, `-0.125`; at most three decimals.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseScoreError(value.to_string());
        let trimmed = value.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty()
            || fraction.len() > 3
            || !whole.bytes().all(|byte| byte.is_ascii_digit())
            || !fraction.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i32 = whole.parse().map_err(|_| invalid())?;
        let fraction: i32 = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<3}").parse().map_err(|_| invalid())?
        };
        let magnitude = whole
            .checked_mul(1000)
            .and_then(|value| value.checked_add(fraction))
            .ok_or_else(invalid)?;
        let signed = if negative { -magnitude } else { magnitude };

        Self::from_thousandths(signed).map_err(|_| invalid())
    }
}

impl From<FixedScore> for String {
    fn from(value: FixedScore) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for FixedScore {
    type Error = ParseScoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
