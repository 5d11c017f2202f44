//! Question bank repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A question that still has answer sets cannot be deleted.
//! - Deleting a question removes the user answers that reference it.

use crate::model::question::{
    Answer, Difficulty, NewAnswer, NewQuestion, NewUserAnswer, Question, UserAnswer,
};
use crate::model::{AnswerId, QuestionId, UserAnswerId, UserId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, parse_choice, push_pagination, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Query options for listing questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionListQuery {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for questions, answers and answer history.
pub trait QuestionRepository {
    fn create_question(&self, question: &NewQuestion) -> RepoResult<QuestionId>;
    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>>;
    fn list_questions(&self, query: &QuestionListQuery) -> RepoResult<Vec<Question>>;
    /// Fails with `Integrity` while answer sets still reference the question.
    fn delete_question(&self, id: QuestionId) -> RepoResult<()>;
    fn create_answer(&self, answer: &NewAnswer) -> RepoResult<AnswerId>;
    fn list_answers(&self, question: QuestionId) -> RepoResult<Vec<Answer>>;
    /// Removes every answer set of `question`, returning how many went.
    fn delete_answers(&self, question: QuestionId) -> RepoResult<usize>;
    fn record_user_answer(&self, answer: &NewUserAnswer) -> RepoResult<UserAnswerId>;
    fn list_user_answers(&self, user: UserId) -> RepoResult<Vec<UserAnswer>>;
}

/// SQLite-backed question repository.
pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["questions", "answers", "user_answers"])?;
        Ok(Self { conn })
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn create_question(&self, question: &NewQuestion) -> RepoResult<QuestionId> {
        question.validate()?;

        self.conn.execute(
            "INSERT INTO questions (category, difficulty, question_type, text)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                question.category.as_str(),
                question.difficulty.as_str(),
                question.question_type.as_str(),
                question.text.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>> {
        self.conn
            .query_row(
                "SELECT id, category, difficulty, question_type, text
                 FROM questions
                 WHERE id = ?1;",
                [id],
                |row| Ok(parse_question_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_questions(&self, query: &QuestionListQuery) -> RepoResult<Vec<Question>> {
        let mut sql = String::from(
            "SELECT id, category, difficulty, question_type, text
             FROM questions
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = query.category.as_ref() {
            sql.push_str(" AND category = ? COLLATE NOCASE");
            bind_values.push(Value::Text(category.clone()));
        }
        if let Some(difficulty) = query.difficulty {
            sql.push_str(" AND difficulty = ?");
            bind_values.push(Value::Text(difficulty.as_str().to_string()));
        }

        sql.push_str(" ORDER BY id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(parse_question_row(row)?);
        }

        Ok(questions)
    }

    fn delete_question(&self, id: QuestionId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM questions WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "question",
                id,
            });
        }
        Ok(())
    }

    fn create_answer(&self, answer: &NewAnswer) -> RepoResult<AnswerId> {
        answer.validate()?;
        let [incorrect, incorrect2, incorrect3] = &answer.incorrect_answers;

        self.conn.execute(
            "INSERT INTO answers (
                question_id,
                correct_answer,
                incorrect_answer,
                incorrect_answer2,
                incorrect_answer3
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                answer.question,
                answer.correct_answer.as_str(),
                incorrect.as_str(),
                incorrect2.as_str(),
                incorrect3.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_answers(&self, question: QuestionId) -> RepoResult<Vec<Answer>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                question_id,
                correct_answer,
                incorrect_answer,
                incorrect_answer2,
                incorrect_answer3
             FROM answers
             WHERE question_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([question])?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next()? {
            answers.push(Answer {
                id: row.get("id")?,
                question: row.get("question_id")?,
                correct_answer: row.get("correct_answer")?,
                incorrect_answer: row.get("incorrect_answer")?,
                incorrect_answer2: row.get("incorrect_answer2")?,
                incorrect_answer3: row.get("incorrect_answer3")?,
            });
        }

        Ok(answers)
    }

    fn delete_answers(&self, question: QuestionId) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM answers WHERE question_id = ?1;", [question])?;
        Ok(removed)
    }

    fn record_user_answer(&self, answer: &NewUserAnswer) -> RepoResult<UserAnswerId> {
        self.conn.execute(
            "INSERT INTO user_answers (
                user_id,
                question_id,
                result,
                count_correct,
                count_incorrect
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                answer.user,
                answer.question,
                bool_to_int(answer.result),
                answer.count_correct,
                answer.count_incorrect,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_user_answers(&self, user: UserId) -> RepoResult<Vec<UserAnswer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, question_id, result, count_correct, count_incorrect
             FROM user_answers
             WHERE user_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([user])?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next()? {
            answers.push(UserAnswer {
                id: row.get("id")?,
                user: row.get("user_id")?,
                question: row.get("question_id")?,
                result: int_to_bool(row.get("result")?, "user_answers.result")?,
                count_correct: row.get("count_correct")?,
                count_incorrect: row.get("count_incorrect")?,
            });
        }

        Ok(answers)
    }
}

fn parse_question_row(row: &Row<'_>) -> RepoResult<Question> {
    let difficulty: String = row.get("difficulty")?;
    Ok(Question {
        id: row.get("id")?,
        category: row.get("category")?,
        difficulty: parse_choice(&difficulty, "questions.difficulty")?,
        question_type: row.get("question_type")?,
        text: row.get("text")?,
    })
}
