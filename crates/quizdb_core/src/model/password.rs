//! Password hashing.
//!
//! Usable passwords are stored as bcrypt strings (`$2b$<cost>$<salt><hash>`);
//! the 22-character bcrypt salt is mirrored into the `salt` column. A stored
//! value starting with `!` marks an unusable password that never verifies.

use super::ValidationError;
use bcrypt::{hash_with_result, verify, DEFAULT_COST};
use uuid::Uuid;

pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// Stored hash plus the salt embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: String,
    pub salt: String,
}

/// Hashes `raw` with bcrypt; `None` yields an unusable password.
pub fn make_password(raw: Option<&str>) -> Result<PasswordDigest, ValidationError> {
    let Some(raw) = raw else {
        return Ok(unusable_password());
    };

    let parts = hash_with_result(raw, DEFAULT_COST)
        .map_err(|err| ValidationError::InvalidPassword(err.to_string()))?;
    Ok(PasswordDigest {
        hash: parts.to_string(),
        salt: parts.get_salt(),
    })
}

/// Digest for accounts that can never log in, such as the deleted-account
/// placeholder.
pub fn unusable_password() -> PasswordDigest {
    PasswordDigest {
        hash: format!("{UNUSABLE_PASSWORD_PREFIX}{}", Uuid::new_v4().simple()),
        salt: String::new(),
    }
}

/// Checks `raw` against a stored bcrypt hash.
///
/// Unusable or malformed hashes never verify.
pub fn verify_password(raw: &str, stored: &str) -> bool {
    if !is_usable(stored) {
        return false;
    }
    verify(raw, stored).unwrap_or(false)
}

/// Returns whether a stored hash can ever verify.
pub fn is_usable(stored: &str) -> bool {
    !stored.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::{is_usable, make_password, verify_password};

    #[test]
    fn hash_verifies_only_the_hashed_password() {
        let digest = make_password(Some("password123")).unwrap();
        assert!(digest.hash.starts_with("$2"));
        assert!(digest.hash.contains(&digest.salt));
        assert!(verify_password("password123", &digest.hash));
        assert!(!verify_password("password124", &digest.hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = make_password(Some("hunter2")).unwrap();
        let second = make_password(Some("hunter2")).unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn missing_password_is_unusable() {
        let digest = make_password(None).unwrap();
        assert!(!is_usable(&digest.hash));
        assert!(!verify_password("", &digest.hash));
        assert!(!verify_password(&digest.hash, &digest.hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("secret", "not-a-bcrypt-hash"));
    }

    #[test]
    fn stored_values_fit_column_limits() {
        let digest = make_password(Some("x")).unwrap();
        assert!(digest.hash.len() <= 254);
        assert!(digest.salt.len() <= 128);
    }
}
