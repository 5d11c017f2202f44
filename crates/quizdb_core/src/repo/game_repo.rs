//! Practice, game, result and score repository contracts and SQLite
//! implementation.
//!
//! # Responsibility
//! - Persist solo practice sessions and multiplayer game records.
//! - Link results and sudden-death records to their game atomically.
//!
//! # Invariants
//! - Deleting a result or sudden-death record deletes the games linked to it.
//! - Deleting a game deletes its user scores.
//! - A game's result and sudden-death links are set at most once.
//! - Stored score totals equal `base_score + bonus_score`.
//! - Score lists are ordered by `total_score DESC, time_taken_seconds ASC`.

use crate::model::game::{
    Game, MatchResult, NewGame, NewMatchResult, NewPractice, NewUserScore, Practice, SuddenDeath,
    UserScore,
};
use crate::model::score::FixedScore;
use crate::model::{GameId, PracticeId, ResultId, SuddenDeathId, UserId, UserScoreId};
use crate::repo::{ensure_connection_ready, parse_choice, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const GAME_SELECT_SQL: &str = "SELECT
    id,
    number_of_questions,
    number_of_players,
    start_time,
    category,
    created_by_id,
    result_id,
    sudden_death_id
FROM games";

const RESULT_SELECT_SQL: &str = "SELECT
    id,
    winner_id,
    second_place_id,
    third_place_id,
    fourth_place_id,
    fifth_place_id,
    sixth_place_id
FROM results";

const USER_SCORE_SELECT_SQL: &str = "SELECT
    id,
    game_id,
    user_id,
    base_score,
    bonus_score,
    total_score,
    time_taken_seconds
FROM user_scores";

/// Repository interface for practices, games and their outcomes.
pub trait GameRepository {
    fn create_practice(&self, practice: &NewPractice) -> RepoResult<PracticeId>;
    /// Lists practice sessions of `user`, newest first.
    fn list_practices(&self, user: UserId) -> RepoResult<Vec<Practice>>;

    fn create_result(&self, result: &NewMatchResult) -> RepoResult<ResultId>;
    fn get_result(&self, id: ResultId) -> RepoResult<Option<MatchResult>>;
    /// Deletes a result together with the games linked to it.
    fn delete_result(&self, id: ResultId) -> RepoResult<()>;

    fn create_sudden_death(&self, rounds: i16) -> RepoResult<SuddenDeathId>;
    fn get_sudden_death(&self, id: SuddenDeathId) -> RepoResult<Option<SuddenDeath>>;
    fn add_sudden_death_round(&self, id: SuddenDeathId) -> RepoResult<SuddenDeath>;

    fn create_game(&self, game: &NewGame) -> RepoResult<GameId>;
    fn get_game(&self, id: GameId) -> RepoResult<Option<Game>>;
    fn list_games_by_creator(&self, user: UserId) -> RepoResult<Vec<Game>>;
    /// Links an existing result; fails with `Integrity` if one is linked.
    fn attach_result(&self, game: GameId, result: ResultId) -> RepoResult<()>;
    fn attach_sudden_death(&self, game: GameId, sudden_death: SuddenDeathId) -> RepoResult<()>;
    /// Creates a result and links it to `game` in one transaction.
    ///
    /// A game that already has a result fails with `Integrity` and no new
    /// result row is kept.
    fn record_game_result(&self, game: GameId, result: &NewMatchResult) -> RepoResult<ResultId>;
    /// Creates a sudden-death record and links it to `game` in one
    /// transaction.
    fn start_game_sudden_death(&self, game: GameId, rounds: i16) -> RepoResult<SuddenDeathId>;
    fn delete_game(&self, id: GameId) -> RepoResult<()>;

    fn create_user_score(&self, score: &NewUserScore) -> RepoResult<UserScoreId>;
    fn list_scores_for_game(&self, game: GameId) -> RepoResult<Vec<UserScore>>;
    fn list_scores_for_user(&self, user: UserId) -> RepoResult<Vec<UserScore>>;
}

/// SQLite-backed game repository.
pub struct SqliteGameRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGameRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["practices", "results", "sudden_deaths", "games", "user_scores"],
        )?;
        Ok(Self { conn })
    }
}

impl GameRepository for SqliteGameRepository<'_> {
    fn create_practice(&self, practice: &NewPractice) -> RepoResult<PracticeId> {
        practice.validate()?;

        self.conn.execute(
            "INSERT INTO practices (user_id, score, start_time, time_taken_seconds)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                practice.user,
                practice.score,
                practice.start_time,
                practice.time_taken_seconds,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_practices(&self, user: UserId) -> RepoResult<Vec<Practice>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, score, start_time, time_taken_seconds
             FROM practices
             WHERE user_id = ?1
             ORDER BY start_time DESC, id DESC;",
        )?;
        let mut rows = stmt.query([user])?;
        let mut practices = Vec::new();
        while let Some(row) = rows.next()? {
            practices.push(Practice {
                id: row.get("id")?,
                user: row.get("user_id")?,
                score: row.get("score")?,
                start_time: row.get("start_time")?,
                time_taken_seconds: row.get("time_taken_seconds")?,
            });
        }

        Ok(practices)
    }

    fn create_result(&self, result: &NewMatchResult) -> RepoResult<ResultId> {
        insert_result(self.conn, result)
    }

    fn get_result(&self, id: ResultId) -> RepoResult<Option<MatchResult>> {
        self.conn
            .query_row(
                &format!("{RESULT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_result_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn delete_result(&self, id: ResultId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM results WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "result",
                id,
            });
        }
        Ok(())
    }

    fn create_sudden_death(&self, rounds: i16) -> RepoResult<SuddenDeathId> {
        self.conn
            .execute("INSERT INTO sudden_deaths (rounds) VALUES (?1);", [rounds])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_sudden_death(&self, id: SuddenDeathId) -> RepoResult<Option<SuddenDeath>> {
        let sudden_death = self
            .conn
            .query_row(
                "SELECT id, rounds FROM sudden_deaths WHERE id = ?1;",
                [id],
                |row| {
                    Ok(SuddenDeath {
                        id: row.get("id")?,
                        rounds: row.get("rounds")?,
                    })
                },
            )
            .optional()?;
        Ok(sudden_death)
    }

    fn add_sudden_death_round(&self, id: SuddenDeathId) -> RepoResult<SuddenDeath> {
        let changed = self.conn.execute(
            "UPDATE sudden_deaths SET rounds = rounds + 1 WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "sudden_death",
                id,
            });
        }
        self.get_sudden_death(id)?.ok_or(RepoError::NotFound {
            entity: "sudden_death",
            id,
        })
    }

    fn create_game(&self, game: &NewGame) -> RepoResult<GameId> {
        game.validate()?;

        self.conn.execute(
            "INSERT INTO games (
                number_of_questions,
                number_of_players,
                start_time,
                category,
                created_by_id
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                game.number_of_questions,
                game.number_of_players,
                game.start_time,
                game.category.as_str(),
                game.created_by,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_game(&self, id: GameId) -> RepoResult<Option<Game>> {
        self.conn
            .query_row(
                &format!("{GAME_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_game_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_games_by_creator(&self, user: UserId) -> RepoResult<Vec<Game>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GAME_SELECT_SQL}
             WHERE created_by_id = ?1
             ORDER BY start_time DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([user])?;
        let mut games = Vec::new();
        while let Some(row) = rows.next()? {
            games.push(parse_game_row(row)?);
        }

        Ok(games)
    }

    fn attach_result(&self, game: GameId, result: ResultId) -> RepoResult<()> {
        link_game_column(self.conn, game, "result_id", result)
    }

    fn attach_sudden_death(&self, game: GameId, sudden_death: SuddenDeathId) -> RepoResult<()> {
        link_game_column(self.conn, game, "sudden_death_id", sudden_death)
    }

    fn record_game_result(&self, game: GameId, result: &NewMatchResult) -> RepoResult<ResultId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let result_id = insert_result(&tx, result)?;
        link_game_column(&tx, game, "result_id", result_id)?;
        tx.commit()?;
        Ok(result_id)
    }

    fn start_game_sudden_death(&self, game: GameId, rounds: i16) -> RepoResult<SuddenDeathId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("INSERT INTO sudden_deaths (rounds) VALUES (?1);", [rounds])?;
        let sudden_death_id = tx.last_insert_rowid();
        link_game_column(&tx, game, "sudden_death_id", sudden_death_id)?;
        tx.commit()?;
        Ok(sudden_death_id)
    }

    fn delete_game(&self, id: GameId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM games WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "game", id });
        }
        Ok(())
    }

    fn create_user_score(&self, score: &NewUserScore) -> RepoResult<UserScoreId> {
        score.validate()?;

        self.conn.execute(
            "INSERT INTO user_scores (
                game_id,
                user_id,
                base_score,
                bonus_score,
                total_score,
                time_taken_seconds
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                score.game,
                score.user,
                score.base_score,
                score.bonus_score.thousandths(),
                score.total_score.thousandths(),
                score.time_taken_seconds,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_scores_for_game(&self, game: GameId) -> RepoResult<Vec<UserScore>> {
        list_scores(self.conn, "game_id", game)
    }

    fn list_scores_for_user(&self, user: UserId) -> RepoResult<Vec<UserScore>> {
        list_scores(self.conn, "user_id", user)
    }
}

fn insert_result(conn: &Connection, result: &NewMatchResult) -> RepoResult<ResultId> {
    let [winner, second, third, fourth, fifth, sixth] = result.placements;
    conn.execute(
        "INSERT INTO results (
            winner_id,
            second_place_id,
            third_place_id,
            fourth_place_id,
            fifth_place_id,
            sixth_place_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![winner, second, third, fourth, fifth, sixth],
    )?;
    Ok(conn.last_insert_rowid())
}

fn link_game_column(
    conn: &Connection,
    game: GameId,
    column: &'static str,
    target: i64,
) -> RepoResult<()> {
    let changed = conn.execute(
        &format!("UPDATE games SET {column} = ?1 WHERE id = ?2 AND {column} IS NULL;"),
        [target, game],
    )?;
    if changed == 1 {
        return Ok(());
    }

    let existing: Option<Option<i64>> = conn
        .query_row(
            &format!("SELECT {column} FROM games WHERE id = ?1;"),
            [game],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        None => Err(RepoError::NotFound {
            entity: "game",
            id: game,
        }),
        Some(linked) => Err(RepoError::Integrity(format!(
            "game {game} already has {column} {}",
            linked.unwrap_or_default()
        ))),
    }
}

fn list_scores(conn: &Connection, column: &'static str, id: i64) -> RepoResult<Vec<UserScore>> {
    let mut stmt = conn.prepare(&format!(
        "{USER_SCORE_SELECT_SQL}
         WHERE {column} = ?1
         ORDER BY total_score DESC, time_taken_seconds ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([id])?;
    let mut scores = Vec::new();
    while let Some(row) = rows.next()? {
        scores.push(parse_user_score_row(row)?);
    }
    Ok(scores)
}

fn parse_game_row(row: &Row<'_>) -> RepoResult<Game> {
    let category: String = row.get("category")?;
    Ok(Game {
        id: row.get("id")?,
        number_of_questions: row.get("number_of_questions")?,
        number_of_players: row.get("number_of_players")?,
        start_time: row.get("start_time")?,
        category: parse_choice(&category, "games.category")?,
        created_by: row.get("created_by_id")?,
        result: row.get("result_id")?,
        sudden_death: row.get("sudden_death_id")?,
    })
}

fn parse_result_row(row: &Row<'_>) -> RepoResult<MatchResult> {
    Ok(MatchResult {
        id: row.get("id")?,
        winner: row.get("winner_id")?,
        second_place: row.get("second_place_id")?,
        third_place: row.get("third_place_id")?,
        fourth_place: row.get("fourth_place_id")?,
        fifth_place: row.get("fifth_place_id")?,
        sixth_place: row.get("sixth_place_id")?,
    })
}

fn parse_user_score_row(row: &Row<'_>) -> RepoResult<UserScore> {
    Ok(UserScore {
        id: row.get("id")?,
        game: row.get("game_id")?,
        user: row.get("user_id")?,
        base_score: row.get("base_score")?,
        bonus_score: parse_fixed_score(row.get("bonus_score")?, "user_scores.bonus_score")?,
        total_score: parse_fixed_score(row.get("total_score")?, "user_scores.total_score")?,
        time_taken_seconds: row.get("time_taken_seconds")?,
    })
}

fn parse_fixed_score(thousandths: i32, column: &str) -> RepoResult<FixedScore> {
    FixedScore::from_thousandths(thousandths).map_err(|_| {
        RepoError::InvalidData(format!("invalid score `{thousandths}` in {column}"))
    })
}
