//! Game bookkeeping service.
//!
//! # Responsibility
//! - Create games and practice sessions with start-time defaults.
//! - Record outcomes (results, tiebreaks, scores) and read them back.
//!
//! # Invariants
//! - Recording a result or starting a tiebreak links it to the game in the
//!   same transaction that creates it.
//! - Score totals are always `base_score + bonus_score`.

use crate::model::game::{
    Game, GameCategory, MatchResult, NewGame, NewMatchResult, NewPractice, NewUserScore, Practice,
    SuddenDeath, UserScore,
};
use crate::model::score::FixedScore;
use crate::model::{now_epoch_ms, GameId, UserId};
use crate::repo::game_repo::GameRepository;
use crate::repo::{RepoError, RepoResult};

/// Use-case service wrapper for game records.
pub struct GameService<R: GameRepository> {
    repo: R,
}

impl<R: GameRepository> GameService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Sets up a game starting now.
    pub fn create_game(
        &self,
        created_by: UserId,
        category: GameCategory,
        number_of_questions: i16,
        number_of_players: i16,
    ) -> RepoResult<Game> {
        let new_game = NewGame::new(
            created_by,
            category,
            number_of_questions,
            number_of_players,
            now_epoch_ms(),
        );
        let id = self.repo.create_game(&new_game)?;
        self.require_game(id)
    }

    pub fn get_game(&self, id: GameId) -> RepoResult<Option<Game>> {
        self.repo.get_game(id)
    }

    /// Stores the final ranking of `game`, winner first.
    ///
    /// A game that already has a result is rejected with `Integrity`.
    pub fn record_result(&self, game: GameId, placements: [UserId; 6]) -> RepoResult<MatchResult> {
        let result_id = self
            .repo
            .record_game_result(game, &NewMatchResult::new(placements))?;
        self.repo.get_result(result_id)?.ok_or(RepoError::NotFound {
            entity: "result",
            id: result_id,
        })
    }

    /// Returns the result linked to `game`, if one was recorded.
    pub fn result_for_game(&self, game: GameId) -> RepoResult<Option<MatchResult>> {
        match self.require_game(game)?.result {
            Some(result_id) => self.repo.get_result(result_id),
            None => Ok(None),
        }
    }

    /// Opens a tiebreak for `game` at `rounds`.
    ///
    /// A game keeps a single tiebreak; starting a second one fails with
    /// `Integrity`.
    pub fn start_sudden_death(&self, game: GameId, rounds: i16) -> RepoResult<SuddenDeath> {
        let id = self.repo.start_game_sudden_death(game, rounds)?;
        self.repo.get_sudden_death(id)?.ok_or(RepoError::NotFound {
            entity: "sudden_death",
            id,
        })
    }

    /// Counts another tiebreak round, starting the tiebreak at round one.
    pub fn add_sudden_death_round(&self, game: GameId) -> RepoResult<SuddenDeath> {
        match self.require_game(game)?.sudden_death {
            Some(sudden_death_id) => self.repo.add_sudden_death_round(sudden_death_id),
            None => self.start_sudden_death(game, 1),
        }
    }

    /// Records one player's score; the total is derived from its parts.
    pub fn record_score(
        &self,
        game: GameId,
        user: UserId,
        base_score: i16,
        bonus_score: FixedScore,
        time_taken_seconds: u32,
    ) -> RepoResult<UserScore> {
        let new_score =
            NewUserScore::from_parts(game, user, base_score, bonus_score, time_taken_seconds)?;
        let id = self.repo.create_user_score(&new_score)?;
        Ok(UserScore {
            id,
            game: new_score.game,
            user: new_score.user,
            base_score: new_score.base_score,
            bonus_score: new_score.bonus_score,
            total_score: new_score.total_score,
            time_taken_seconds: new_score.time_taken_seconds,
        })
    }

    /// Scores of `game`, best first.
    pub fn leaderboard(&self, game: GameId) -> RepoResult<Vec<UserScore>> {
        self.repo.list_scores_for_game(game)
    }

    /// Records a finished practice session that started `time_taken_seconds`
    /// before now.
    pub fn record_practice(
        &self,
        user: UserId,
        score: u16,
        time_taken_seconds: u32,
    ) -> RepoResult<Practice> {
        let start_time = now_epoch_ms() - i64::from(time_taken_seconds) * 1000;
        let practice = NewPractice {
            user,
            score,
            start_time,
            time_taken_seconds,
        };
        let id = self.repo.create_practice(&practice)?;
        Ok(Practice {
            id,
            user,
            score,
            start_time,
            time_taken_seconds,
        })
    }

    fn require_game(&self, id: GameId) -> RepoResult<Game> {
        self.repo
            .get_game(id)?
            .ok_or(RepoError::NotFound { entity: "game", id })
    }
}
