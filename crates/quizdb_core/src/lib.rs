//! Data layer for a quiz/trivia application.
//!
//! Accounts, questions and answers, games with their results and scores, and
//! relationships between players, persisted in SQLite.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::game::{
    Game, GameCategory, MatchResult, NewGame, NewMatchResult, NewPractice, NewUserScore, Practice,
    SuddenDeath, UserScore,
};
pub use model::question::{
    Answer, Difficulty, NewAnswer, NewQuestion, NewUserAnswer, Question, UserAnswer,
};
pub use model::score::FixedScore;
pub use model::social::{
    LoginAttempt, LoginStatus, NewUserRelationship, RelationshipStatus, UserRelationship,
};
pub use model::user::{NewUser, User, SENTINEL_EMAIL, SENTINEL_USERNAME};
pub use model::{UserId, ValidationError};
pub use repo::delete_policy::{OnDelete, UserReference, USER_REFERENCES};
pub use repo::game_repo::{GameRepository, SqliteGameRepository};
pub use repo::question_repo::{QuestionListQuery, QuestionRepository, SqliteQuestionRepository};
pub use repo::social_repo::{SocialRepository, SqliteSocialRepository};
pub use repo::user_repo::{SqliteUserRepository, UserDeletion, UserListQuery, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountResult, AccountService, AccountServiceError};
pub use service::game_service::GameService;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
