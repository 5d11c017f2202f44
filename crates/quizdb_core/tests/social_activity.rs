use quizdb_core::db::open_db_in_memory;
use quizdb_core::{
    AccountService, LoginStatus, NewUserRelationship, RelationshipStatus, RepoError,
    SocialRepository, SqliteSocialRepository, SqliteUserRepository, ValidationError,
};
use rusqlite::Connection;

fn new_user_id(conn: &Connection, username: &str) -> i64 {
    let email = format!("{username}@example.com");
    AccountService::new(SqliteUserRepository::try_new(conn).unwrap())
        .create_user(Some(username), Some(email.as_str()), None)
        .unwrap()
        .id
}

#[test]
fn relationship_request_starts_pending_and_can_be_accepted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSocialRepository::try_new(&conn).unwrap();
    let alice = new_user_id(&conn, "alice");
    let bob = new_user_id(&conn, "bob");

    let id = repo
        .create_relationship(&NewUserRelationship::request(alice, bob))
        .unwrap();
    let pending = repo.get_relationship(id).unwrap().unwrap();
    assert_eq!(pending.relationship_status, RelationshipStatus::Pending);
    assert_eq!(pending.to_string(), "pending");
    assert_eq!(pending.other_user(alice), Some(bob));
    assert_eq!(pending.other_user(bob), Some(alice));
    assert_eq!(pending.other_user(bob + 100), None);

    repo.set_relationship_status(id, RelationshipStatus::Friends)
        .unwrap();
    let accepted = repo.get_relationship(id).unwrap().unwrap();
    assert_eq!(accepted.to_string(), "friends");
}

#[test]
fn list_relationships_matches_either_side_and_status() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSocialRepository::try_new(&conn).unwrap();
    let alice = new_user_id(&conn, "alice");
    let bob = new_user_id(&conn, "bob");
    let carol = new_user_id(&conn, "carol");

    let with_bob = repo
        .create_relationship(&NewUserRelationship::request(alice, bob))
        .unwrap();
    let with_carol = repo
        .create_relationship(&NewUserRelationship::request(carol, alice))
        .unwrap();
    repo.set_relationship_status(with_carol, RelationshipStatus::Blocked)
        .unwrap();

    let all: Vec<i64> = repo
        .list_relationships(alice, None)
        .unwrap()
        .into_iter()
        .map(|relationship| relationship.id)
        .collect();
    assert_eq!(all, vec![with_bob, with_carol]);

    let blocked = repo
        .list_relationships(alice, Some(RelationshipStatus::Blocked))
        .unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].other_user(alice), Some(carol));

    assert_eq!(repo.list_relationships(bob, None).unwrap().len(), 1);
}

#[test]
fn relationship_with_self_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSocialRepository::try_new(&conn).unwrap();
    let alice = new_user_id(&conn, "alice");

    let err = repo
        .create_relationship(&NewUserRelationship::request(alice, alice))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::SelfRelationship(id)) if id == alice
    ));
}

#[test]
fn relationship_with_unknown_user_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSocialRepository::try_new(&conn).unwrap();
    let alice = new_user_id(&conn, "alice");

    let err = repo
        .create_relationship(&NewUserRelationship::request(alice, alice + 50))
        .unwrap_err();
    assert!(err.is_integrity());
}

#[test]
fn deleting_relationship_twice_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSocialRepository::try_new(&conn).unwrap();
    let alice = new_user_id(&conn, "alice");
    let bob = new_user_id(&conn, "bob");

    let id = repo
        .create_relationship(&NewUserRelationship::request(alice, bob))
        .unwrap();
    repo.delete_relationship(id).unwrap();

    let err = repo.delete_relationship(id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "relationship",
            ..
        }
    ));
}

#[test]
fn login_attempts_are_listed_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSocialRepository::try_new(&conn).unwrap();
    let alice = new_user_id(&conn, "alice");
    let bob = new_user_id(&conn, "bob");

    repo.record_login_attempt(alice, LoginStatus::Failed, 1_000)
        .unwrap();
    repo.record_login_attempt(alice, LoginStatus::Success, 3_000)
        .unwrap();
    repo.record_login_attempt(alice, LoginStatus::Failed, 2_000)
        .unwrap();
    repo.record_login_attempt(bob, LoginStatus::Success, 4_000)
        .unwrap();

    let attempts = repo.list_login_attempts(alice, None).unwrap();
    let times: Vec<i64> = attempts.iter().map(|attempt| attempt.last_login).collect();
    assert_eq!(times, vec![3_000, 2_000, 1_000]);
    assert_eq!(attempts[0].to_string(), "success");
    assert_eq!(attempts[1].login_status, LoginStatus::Failed);

    let latest = repo.list_login_attempts(alice, Some(1)).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].login_status, LoginStatus::Success);
}
