use quizdb_core::db::open_db_in_memory;
use quizdb_core::{
    AccountService, AccountServiceError, RepoError, SqliteUserRepository, UserListQuery,
    UserRepository, ValidationError,
};
use rusqlite::Connection;

fn account_service(conn: &Connection) -> AccountService<SqliteUserRepository<'_>> {
    AccountService::new(SqliteUserRepository::try_new(conn).unwrap())
}

#[test]
fn create_user_persists_regular_account() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .create_user(Some("quizmaster"), Some("quiz@example.com"), Some("s3cret!"))
        .unwrap();

    assert_eq!(service.count_users().unwrap(), 1);
    assert_eq!(user.username, "quizmaster");
    assert_eq!(user.email, "quiz@example.com");
    assert!(user.check_password("s3cret!"));
    assert!(!user.check_password("wrong"));
    assert!(!user.is_active);
    assert!(!user.email_verified);
    assert!(!user.is_staff);
    assert!(!user.is_superuser);
    assert_eq!(user.to_string(), "quizmaster");
}

#[test]
fn create_user_without_email_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let err = service
        .create_user(Some("noemail"), None, Some("pw"))
        .unwrap_err();
    assert!(matches!(
        err,
        AccountServiceError::Validation(ValidationError::MissingEmail)
    ));

    let err = service
        .create_user(Some("blankemail"), Some("   "), Some("pw"))
        .unwrap_err();
    assert!(matches!(
        err,
        AccountServiceError::Validation(ValidationError::MissingEmail)
    ));
    assert_eq!(service.count_users().unwrap(), 0);
}

#[test]
fn create_user_without_username_is_rejected_by_store() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let err = service
        .create_user(None, Some("nobody@example.com"), Some("pw"))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::Integrity(_)));
    assert_eq!(service.count_users().unwrap(), 0);
}

#[test]
fn duplicate_email_or_username_leaves_count_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    service
        .create_user(Some("first"), Some("taken@example.com"), Some("pw"))
        .unwrap();
    assert_eq!(service.count_users().unwrap(), 1);

    let err = service
        .create_user(Some("second"), Some("taken@example.com"), Some("pw"))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::Integrity(_)));
    assert_eq!(service.count_users().unwrap(), 1);

    let err = service
        .create_user(Some("first"), Some("other@example.com"), Some("pw"))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::Integrity(_)));
    assert_eq!(service.count_users().unwrap(), 1);
}

#[test]
fn duplicate_email_differing_only_in_domain_case_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    service
        .create_user(Some("first"), Some("player@example.com"), Some("pw"))
        .unwrap();
    let err = service
        .create_user(Some("second"), Some("player@EXAMPLE.COM"), Some("pw"))
        .unwrap_err();

    assert!(matches!(err, AccountServiceError::Integrity(_)));
    assert_eq!(service.count_users().unwrap(), 1);
}

#[test]
fn email_domain_is_normalized_on_create() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .create_user(Some("fake"), Some("fakemail@PROTONMAIL.com"), Some("pw"))
        .unwrap();

    assert_eq!(user.email, "fakemail@protonmail.com");
    let found = service
        .get_user_by_email("fakemail@ProtonMail.COM")
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);
}

#[test]
fn create_superuser_grants_every_permission() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let admin = service
        .create_superuser(Some("admin"), Some("admin@example.com"), Some("root"))
        .unwrap();

    assert!(admin.is_staff);
    assert!(admin.is_superuser);
    assert!(admin.check_password("root"));
    assert_eq!(service.count_users().unwrap(), 1);
}

#[test]
fn deleting_user_or_superuser_removes_the_row() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .create_user(Some("short"), Some("short@example.com"), Some("pw"))
        .unwrap();
    assert_eq!(service.count_users().unwrap(), 1);
    let deletion = service.delete_user(user.id).unwrap();
    assert_eq!(deletion.redirected_references, 0);
    assert_eq!(deletion.sentinel_id, None);
    assert_eq!(service.count_users().unwrap(), 0);

    let admin = service
        .create_superuser(Some("admin"), Some("admin@example.com"), Some("pw"))
        .unwrap();
    assert_eq!(service.count_users().unwrap(), 1);
    service.delete_user(admin.id).unwrap();
    assert_eq!(service.count_users().unwrap(), 0);
}

#[test]
fn deleting_missing_user_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let err = service.delete_user(404).unwrap_err();
    assert!(matches!(err, AccountServiceError::UserNotFound(404)));
}

#[test]
fn reserved_username_is_rejected_for_regular_accounts() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    for username in ["Deleted", "deleted"] {
        let err = service
            .create_user(Some(username), Some("someone@example.com"), Some("pw"))
            .unwrap_err();
        assert!(matches!(
            err,
            AccountServiceError::Validation(ValidationError::ReservedUsername(_))
        ));
    }
    assert_eq!(service.count_users().unwrap(), 0);
}

#[test]
fn overlong_username_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let err = service
        .create_user(Some("a_very_long_username"), Some("long@example.com"), None)
        .unwrap_err();
    assert!(matches!(
        err,
        AccountServiceError::Validation(ValidationError::FieldTooLong {
            field: "username",
            ..
        })
    ));
}

#[test]
fn missing_password_yields_unusable_password() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .create_user(Some("nopass"), Some("nopass@example.com"), None)
        .unwrap();
    assert!(!user.has_usable_password());

    service.set_password(user.id, Some("fresh")).unwrap();
    let updated = service.get_user(user.id).unwrap().unwrap();
    assert!(updated.has_usable_password());
    assert!(updated.check_password("fresh"));
    assert!(updated.last_updated.is_some());
}

#[test]
fn verify_email_activates_account() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .create_user(Some("pending"), Some("pending@example.com"), Some("pw"))
        .unwrap();
    let verified = service.verify_email(user.id).unwrap();

    assert!(verified.email_verified);
    assert!(verified.is_active);
}

#[test]
fn list_users_filters_inactive_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let service = account_service(&conn);

    let first = service
        .create_user(Some("one"), Some("one@example.com"), None)
        .unwrap();
    service
        .create_user(Some("two"), Some("two@example.com"), None)
        .unwrap();
    service
        .create_user(Some("three"), Some("three@example.com"), None)
        .unwrap();
    service.verify_email(first.id).unwrap();

    let active = repo
        .list_users(&UserListQuery {
            active_only: true,
            ..UserListQuery::default()
        })
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].username, "one");

    let page = service.list_users(Some(1), 1).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].username, "two");
}

#[test]
fn serialized_user_omits_password_material() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .create_user(Some("json"), Some("json@example.com"), Some("pw"))
        .unwrap();
    let value = serde_json::to_value(&user).unwrap();

    assert_eq!(value["username"], "json");
    assert!(value.get("password").is_none());
    assert!(value.get("salt").is_none());
}

#[test]
fn check_password_stamps_last_login_on_success_only() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .create_user(Some("login"), Some("login@example.com"), Some("open-sesame"))
        .unwrap();
    assert_eq!(user.last_login, None);

    assert!(!service.check_password(user.id, "wrong").unwrap());
    assert_eq!(service.get_user(user.id).unwrap().unwrap().last_login, None);

    assert!(service.check_password(user.id, "open-sesame").unwrap());
    assert!(service.get_user(user.id).unwrap().unwrap().last_login.is_some());
}

#[test]
fn sentinel_never_passes_password_check() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let sentinel = service.get_or_create_sentinel_user().unwrap();

    assert!(!service.check_password(sentinel.id, "").unwrap());
    assert!(!service.check_password(sentinel.id, &sentinel.password).unwrap());
}

#[test]
fn sentinel_email_cannot_be_registered_or_taken_over() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let service = account_service(&conn);

    for email in ["deleted@gmail.com", "deleted@GMAIL.com"] {
        let err = service
            .create_user(Some("squatter"), Some(email), Some("pw"))
            .unwrap_err();
        assert!(matches!(
            err,
            AccountServiceError::Validation(ValidationError::ReservedEmail(_))
        ));
    }
    assert_eq!(service.count_users().unwrap(), 0);

    let mut user = service
        .create_user(Some("regular"), Some("regular@example.com"), None)
        .unwrap();
    user.email = "deleted@gmail.com".to_string();
    let err = repo.update_user(&user).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::ReservedEmail(_))
    ));
    assert_eq!(
        repo.get_user(user.id).unwrap().unwrap().email,
        "regular@example.com"
    );
}

#[test]
fn updated_email_domain_is_normalized() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let service = account_service(&conn);

    let mut user = service
        .create_user(Some("mover"), Some("u1@example.com"), None)
        .unwrap();
    user.email = "u2@EXAMPLE.COM".to_string();
    repo.update_user(&user).unwrap();

    let stored = repo.get_user(user.id).unwrap().unwrap();
    assert_eq!(stored.email, "u2@example.com");
    let found = repo.get_user_by_email("u2@EXAMPLE.COM").unwrap().unwrap();
    assert_eq!(found.id, user.id);
}
