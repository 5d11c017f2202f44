//! Question bank and answer history records.
//!
//! # Invariants
//! - Every answer set belongs to exactly one question and holds one correct
//!   and three incorrect choices.
//! - A user answer references one user and one question.

use super::{check_required_text, AnswerId, QuestionId, UserAnswerId, UserId, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const TEXT_MAX_CHARS: usize = 254;
const QUESTION_TYPE_MAX_CHARS: usize = 20;

/// Difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ValidationError::UnknownChoice {
                field: "difficulty",
                value: other.to_string(),
            }),
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub category: String,
    pub difficulty: Difficulty,
    /// Free-form kind, e.g. `multiple` or `boolean`.
    pub question_type: String,
    pub text: String,
}

impl Display for Question {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub category: String,
    pub difficulty: Difficulty,
    pub question_type: String,
    pub text: String,
}

impl NewQuestion {
    pub fn new(
        category: impl Into<String>,
        difficulty: Difficulty,
        question_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            difficulty,
            question_type: question_type.into(),
            text: text.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required_text("category", &self.category, TEXT_MAX_CHARS)?;
        check_required_text("question_type", &self.question_type, QUESTION_TYPE_MAX_CHARS)?;
        check_required_text("text", &self.text, TEXT_MAX_CHARS)?;
        Ok(())
    }
}

/// Answer choices for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub question: QuestionId,
    pub correct_answer: String,
    pub incorrect_answer: String,
    pub incorrect_answer2: String,
    pub incorrect_answer3: String,
}

impl Answer {
    /// All four choices, correct one first.
    pub fn choices(&self) -> [&str; 4] {
        [
            self.correct_answer.as_str(),
            self.incorrect_answer.as_str(),
            self.incorrect_answer2.as_str(),
            self.incorrect_answer3.as_str(),
        ]
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct_answer == choice
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question: QuestionId,
    pub correct_answer: String,
    pub incorrect_answers: [String; 3],
}

impl NewAnswer {
    pub fn new(
        question: QuestionId,
        correct_answer: impl Into<String>,
        incorrect_answers: [&str; 3],
    ) -> Self {
        Self {
            question,
            correct_answer: correct_answer.into(),
            incorrect_answers: incorrect_answers.map(str::to_string),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required_text("correct_answer", &self.correct_answer, TEXT_MAX_CHARS)?;
        for (field, value) in ["incorrect_answer", "incorrect_answer2", "incorrect_answer3"]
            .into_iter()
            .zip(&self.incorrect_answers)
        {
            check_required_text(field, value, TEXT_MAX_CHARS)?;
        }
        Ok(())
    }
}

/// One user's response to one question, with running tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub id: UserAnswerId,
    pub user: UserId,
    pub question: QuestionId,
    pub result: bool,
    pub count_correct: i16,
    pub count_incorrect: i16,
}

impl Display for UserAnswer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserAnswer {
    pub user: UserId,
    pub question: QuestionId,
    pub result: bool,
    pub count_correct: i16,
    pub count_incorrect: i16,
}

impl NewUserAnswer {
    /// Records a response; `result` defaults to incorrect and
    /// `count_incorrect` to zero.
    pub fn new(user: UserId, question: QuestionId, count_correct: i16) -> Self {
        Self {
            user,
            question,
            result: false,
            count_correct,
            count_incorrect: 0,
        }
    }

    pub fn with_result(mut self, result: bool) -> Self {
        self.result = result;
        self
    }

    pub fn with_count_incorrect(mut self, count_incorrect: i16) -> Self {
        self.count_incorrect = count_incorrect;
        self
    }
}
