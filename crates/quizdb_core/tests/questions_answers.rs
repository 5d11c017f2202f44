use quizdb_core::db::{count_rows, open_db_in_memory};
use quizdb_core::{
    AccountService, Difficulty, NewAnswer, NewQuestion, NewUserAnswer, QuestionListQuery,
    QuestionRepository, RepoError, SqliteQuestionRepository, SqliteUserRepository,
    ValidationError,
};
use rusqlite::Connection;

fn sample_question(text: &str, difficulty: Difficulty) -> NewQuestion {
    NewQuestion::new("Geography", difficulty, "multiple", text)
}

fn new_user_id(conn: &Connection, username: &str) -> i64 {
    let email = format!("{username}@example.com");
    AccountService::new(SqliteUserRepository::try_new(conn).unwrap())
        .create_user(Some(username), Some(email.as_str()), None)
        .unwrap()
        .id
}

#[test]
fn create_and_get_question_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let id = repo
        .create_question(&sample_question(
            "What is the capital of Peru?",
            Difficulty::Medium,
        ))
        .unwrap();
    let question = repo.get_question(id).unwrap().unwrap();

    assert_eq!(question.category, "Geography");
    assert_eq!(question.difficulty, Difficulty::Medium);
    assert_eq!(question.question_type, "multiple");
    assert_eq!(question.to_string(), "What is the capital of Peru?");
    assert!(repo.get_question(id + 1).unwrap().is_none());
}

#[test]
fn blank_or_overlong_question_fields_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let err = repo
        .create_question(&NewQuestion::new("", Difficulty::Easy, "boolean", "Sky is blue?"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField("category"))
    ));

    let err = repo
        .create_question(&NewQuestion::new(
            "Science",
            Difficulty::Easy,
            "a-question-type-that-is-too-long",
            "Sky is blue?",
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::FieldTooLong {
            field: "question_type",
            ..
        })
    ));
    assert_eq!(count_rows(&conn, "questions").unwrap(), 0);
}

#[test]
fn list_questions_filters_by_category_and_difficulty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    repo.create_question(&sample_question("Longest river?", Difficulty::Easy))
        .unwrap();
    repo.create_question(&sample_question("Highest lake?", Difficulty::Hard))
        .unwrap();
    repo.create_question(&NewQuestion::new(
        "History",
        Difficulty::Hard,
        "multiple",
        "First emperor of Rome?",
    ))
    .unwrap();

    let hard_geography = repo
        .list_questions(&QuestionListQuery {
            category: Some("geography".to_string()),
            difficulty: Some(Difficulty::Hard),
            ..QuestionListQuery::default()
        })
        .unwrap();
    assert_eq!(hard_geography.len(), 1);
    assert_eq!(hard_geography[0].text, "Highest lake?");

    let paged = repo
        .list_questions(&QuestionListQuery {
            limit: Some(2),
            offset: 1,
            ..QuestionListQuery::default()
        })
        .unwrap();
    let texts: Vec<&str> = paged.iter().map(|question| question.text.as_str()).collect();
    assert_eq!(texts, vec!["Highest lake?", "First emperor of Rome?"]);
}

#[test]
fn answers_belong_to_question_and_expose_choices() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let question = repo
        .create_question(&sample_question("Capital of Japan?", Difficulty::Easy))
        .unwrap();
    repo.create_answer(&NewAnswer::new(
        question,
        "Tokyo",
        ["Kyoto", "Osaka", "Nagoya"],
    ))
    .unwrap();

    let answers = repo.list_answers(question).unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].choices(), ["Tokyo", "Kyoto", "Osaka", "Nagoya"]);
    assert!(answers[0].is_correct("Tokyo"));
    assert!(!answers[0].is_correct("Osaka"));
}

#[test]
fn answer_for_missing_question_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let err = repo
        .create_answer(&NewAnswer::new(99, "yes", ["no", "maybe", "never"]))
        .unwrap_err();
    assert!(err.is_integrity());
}

#[test]
fn question_with_answers_cannot_be_deleted_until_answers_are() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let question = repo
        .create_question(&sample_question("Largest ocean?", Difficulty::Easy))
        .unwrap();
    repo.create_answer(&NewAnswer::new(
        question,
        "Pacific",
        ["Atlantic", "Indian", "Arctic"],
    ))
    .unwrap();

    let err = repo.delete_question(question).unwrap_err();
    assert!(err.is_integrity());
    assert!(repo.get_question(question).unwrap().is_some());

    assert_eq!(repo.delete_answers(question).unwrap(), 1);
    repo.delete_question(question).unwrap();
    assert!(repo.get_question(question).unwrap().is_none());
}

#[test]
fn deleting_question_removes_user_answers() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();
    let user = new_user_id(&conn, "solver");

    let question = repo
        .create_question(&sample_question("Smallest country?", Difficulty::Medium))
        .unwrap();
    repo.record_user_answer(
        &NewUserAnswer::new(user, question, 3)
            .with_result(true)
            .with_count_incorrect(1),
    )
    .unwrap();

    let recorded = repo.list_user_answers(user).unwrap();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].result);
    assert_eq!(recorded[0].count_correct, 3);
    assert_eq!(recorded[0].count_incorrect, 1);
    assert_eq!(recorded[0].to_string(), "true");

    repo.delete_question(question).unwrap();
    assert!(repo.list_user_answers(user).unwrap().is_empty());
}

#[test]
fn user_answer_defaults_to_incorrect() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();
    let user = new_user_id(&conn, "guesser");

    let question = repo
        .create_question(&sample_question("Deepest trench?", Difficulty::Hard))
        .unwrap();
    repo.record_user_answer(&NewUserAnswer::new(user, question, 0))
        .unwrap();

    let recorded = repo.list_user_answers(user).unwrap();
    assert!(!recorded[0].result);
    assert_eq!(recorded[0].count_incorrect, 0);
    assert_eq!(recorded[0].to_string(), "false");
}

#[test]
fn deleting_missing_question_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQuestionRepository::try_new(&conn).unwrap();

    let err = repo.delete_question(7).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "question",
            id: 7
        }
    ));
}
