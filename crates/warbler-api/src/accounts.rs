//! Account lifecycle: signup and authenticate.

use warbler_db::models::{NewUserRow, UserRow};
use warbler_db::{Database, DbError};
use warbler_types::forms::SignupForm;
use warbler_types::models::User;
use warbler_types::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL};

use crate::password;

#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    /// Duplicate email or username, reported by the store at insert
    /// time. There is deliberately no pre-check.
    #[error("username or email already taken")]
    Taken,
    #[error(transparent)]
    Hash(#[from] password::HashError),
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for SignupError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UniqueViolation(_) => SignupError::Taken,
            other => SignupError::Db(other),
        }
    }
}

/// Hash the password and insert the new user. Blank optional fields
/// fall back to the stock avatar and banner.
pub fn signup(db: &Database, form: &SignupForm) -> Result<User, SignupError> {
    let digest = password::hash(&form.password)?;

    let record = NewUserRow {
        email: form.email.clone(),
        username: form.username.clone(),
        password: digest,
        image_url: or_default(&form.image_url, DEFAULT_IMAGE_URL),
        header_image_url: or_default(&form.header_image_url, DEFAULT_HEADER_IMAGE_URL),
        bio: non_blank(&form.bio),
        location: non_blank(&form.location),
    };
    let id = db.create_user(&record)?;

    Ok(User {
        id,
        email: record.email,
        username: record.username,
        image_url: record.image_url,
        header_image_url: record.header_image_url,
        bio: record.bio,
        location: record.location,
    })
}

/// Look up by username and verify the password. Unknown username and
/// wrong password are indistinguishable from the outside: both come
/// back as `Ok(None)`, never as an error.
pub fn authenticate(
    db: &Database,
    username: &str,
    plaintext: &str,
) -> Result<Option<User>, DbError> {
    let Some(row) = db.get_user_by_username(username)? else {
        return Ok(None);
    };
    if !password::verify(&row.password, plaintext) {
        return Ok(None);
    }
    Ok(Some(user_from_row(row)))
}

pub fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id,
        email: row.email,
        username: row.username,
        image_url: row.image_url,
        header_image_url: row.header_image_url,
        bio: row.bio,
        location: row.location,
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str) -> SignupForm {
        SignupForm {
            email: email.into(),
            username: username.into(),
            password: "password".into(),
            image_url: String::new(),
            header_image_url: String::new(),
            bio: String::new(),
            location: String::new(),
        }
    }

    #[test]
    fn signup_hashes_and_defaults() {
        let db = Database::open_in_memory().unwrap();
        let user = signup(&db, &form("testuser1", "test1@test.com")).unwrap();

        assert_eq!(user.username, "testuser1");
        assert_eq!(user.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(user.header_image_url, DEFAULT_HEADER_IMAGE_URL);
        assert!(user.bio.is_none());

        // Digest stored, plaintext not
        let row = db.get_user_by_username("testuser1").unwrap().unwrap();
        assert_ne!(row.password, "password");
        assert!(password::verify(&row.password, "password"));
        assert!(!password::verify(&row.password, "wrong_password"));
    }

    #[test]
    fn signup_duplicate_is_taken() {
        let db = Database::open_in_memory().unwrap();
        signup(&db, &form("testuser1", "test1@test.com")).unwrap();

        let err = signup(&db, &form("testuser1", "other@test.com")).unwrap_err();
        assert!(matches!(err, SignupError::Taken));

        let err = signup(&db, &form("otheruser", "test1@test.com")).unwrap_err();
        assert!(matches!(err, SignupError::Taken));
    }

    #[test]
    fn authenticate_matches_user() {
        let db = Database::open_in_memory().unwrap();
        let created = signup(&db, &form("testuser1", "test1@test.com")).unwrap();

        let user = authenticate(&db, "testuser1", "password").unwrap().unwrap();
        assert_eq!(user.id, created.id);
    }

    #[test]
    fn authenticate_failures_are_indistinguishable() {
        let db = Database::open_in_memory().unwrap();
        signup(&db, &form("testuser1", "test1@test.com")).unwrap();

        assert!(authenticate(&db, "testuser1", "wrong_password")
            .unwrap()
            .is_none());
        assert!(authenticate(&db, "no_such_user", "password")
            .unwrap()
            .is_none());
    }
}
