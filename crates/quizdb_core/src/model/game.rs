//! Practice sessions, multiplayer games and their outcomes.
//!
//! # Invariants
//! - A result ranks exactly six placements, winner first.
//! - User references in results and `Game::created_by` survive account
//!   deletion by pointing at the sentinel account.
//! - Practice `score` fits three digits and `time_taken_seconds` five.

use super::score::FixedScore;
use super::{
    check_range, GameId, PracticeId, ResultId, SuddenDeathId, UserId, UserScoreId,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const PRACTICE_SCORE_MAX: u16 = 999;
pub const PRACTICE_SECONDS_MAX: u32 = 99_999;
pub const MAX_PLAYERS: i16 = 6;

/// Question category a game draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameCategory {
    #[serde(rename = "general knowledge")]
    GeneralKnowledge,
    Science,
    Mythology,
    Sports,
    Geography,
    History,
    Politics,
    Art,
    Celebrities,
    Animals,
    Vehicles,
    Entertainment,
    Random,
}

impl GameCategory {
    pub const ALL: [Self; 13] = [
        Self::GeneralKnowledge,
        Self::Science,
        Self::Mythology,
        Self::Sports,
        Self::Geography,
        Self::History,
        Self::Politics,
        Self::Art,
        Self::Celebrities,
        Self::Animals,
        Self::Vehicles,
        Self::Entertainment,
        Self::Random,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeneralKnowledge => "general knowledge",
            Self::Science => "science",
            Self::Mythology => "mythology",
            Self::Sports => "sports",
            Self::Geography => "geography",
            Self::History => "history",
            Self::Politics => "politics",
            Self::Art => "art",
            Self::Celebrities => "celebrities",
            Self::Animals => "animals",
            Self::Vehicles => "vehicles",
            Self::Entertainment => "entertainment",
            Self::Random => "random",
        }
    }
}

impl FromStr for GameCategory {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| ValidationError::UnknownChoice {
                field: "category",
                value: value.to_string(),
            })
    }
}

impl Display for GameCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solo practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    pub id: PracticeId,
    pub user: UserId,
    pub score: u16,
    pub start_time: i64,
    pub time_taken_seconds: u32,
}

impl Display for Practice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPractice {
    pub user: UserId,
    pub score: u16,
    pub start_time: i64,
    pub time_taken_seconds: u32,
}

impl NewPractice {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("score", i64::from(self.score), 0, i64::from(PRACTICE_SCORE_MAX))?;
        check_range(
            "time_taken_seconds",
            i64::from(self.time_taken_seconds),
            0,
            i64::from(PRACTICE_SECONDS_MAX),
        )?;
        Ok(())
    }
}

/// Final ranking of a multiplayer game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: ResultId,
    pub winner: UserId,
    pub second_place: UserId,
    pub third_place: UserId,
    pub fourth_place: UserId,
    pub fifth_place: UserId,
    pub sixth_place: UserId,
}

impl MatchResult {
    /// Placements in rank order, winner first.
    pub fn placements(&self) -> [UserId; 6] {
        [
            self.winner,
            self.second_place,
            self.third_place,
            self.fourth_place,
            self.fifth_place,
            self.sixth_place,
        ]
    }
}

/// Renders the winner's identity.
impl Display for MatchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.winner)
    }
}

/// Insert payload for a result, placements in rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewMatchResult {
    pub placements: [UserId; 6],
}

impl NewMatchResult {
    pub fn new(placements: [UserId; 6]) -> Self {
        Self { placements }
    }

    pub fn winner(&self) -> UserId {
        self.placements[0]
    }
}

/// Tiebreak bookkeeping for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuddenDeath {
    pub id: SuddenDeathId,
    pub rounds: i16,
}

impl Display for SuddenDeath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rounds)
    }
}

/// Match configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub number_of_questions: i16,
    pub number_of_players: i16,
    pub start_time: i64,
    pub category: GameCategory,
    pub created_by: UserId,
    pub result: Option<ResultId>,
    pub sudden_death: Option<SuddenDeathId>,
}

/// Renders the identity of the user the game is attributed to.
impl Display for Game {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.created_by)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    pub number_of_questions: i16,
    pub number_of_players: i16,
    pub start_time: i64,
    pub category: GameCategory,
    pub created_by: UserId,
}

impl NewGame {
    pub fn new(
        created_by: UserId,
        category: GameCategory,
        number_of_questions: i16,
        number_of_players: i16,
        start_time: i64,
    ) -> Self {
        Self {
            number_of_questions,
            number_of_players,
            start_time,
            category,
            created_by,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range(
            "number_of_questions",
            i64::from(self.number_of_questions),
            1,
            i64::from(i16::MAX),
        )?;
        check_range(
            "number_of_players",
            i64::from(self.number_of_players),
            1,
            i64::from(MAX_PLAYERS),
        )?;
        Ok(())
    }
}

/// Per-user score breakdown for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserScore {
    pub id: UserScoreId,
    pub game: GameId,
    pub user: UserId,
    pub base_score: i16,
    pub bonus_score: FixedScore,
    pub total_score: FixedScore,
    pub time_taken_seconds: u32,
}

/// Renders the total with three decimals, e.g. `12.500`.
impl Display for UserScore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.total_score, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserScore {
    pub game: GameId,
    pub user: UserId,
    pub base_score: i16,
    pub bonus_score: FixedScore,
    pub total_score: FixedScore,
    pub time_taken_seconds: u32,
}

impl NewUserScore {
    /// Builds a score row whose total is `base_score + bonus_score`.
    pub fn from_parts(
        game: GameId,
        user: UserId,
        base_score: i16,
        bonus_score: FixedScore,
        time_taken_seconds: u32,
    ) -> Result<Self, ValidationError> {
        let total_score = FixedScore::from_points(base_score)?.checked_add(bonus_score)?;
        Ok(Self {
            game,
            user,
            base_score,
            bonus_score,
            total_score,
            time_taken_seconds,
        })
    }

    /// Checks that `total_score` is `base_score + bonus_score`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let expected = FixedScore::from_points(self.base_score)?.checked_add(self.bonus_score)?;
        if expected != self.total_score {
            return Err(ValidationError::ScoreTotalMismatch {
                expected: expected.thousandths(),
                actual: self.total_score.thousandths(),
            });
        }
        Ok(())
    }
}
