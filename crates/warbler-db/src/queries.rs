use rusqlite::Connection;

use crate::models::{MessageRow, NewUserRow, UserRow};
use crate::{Database, DbError, Result};

const MESSAGE_COLUMNS: &str = "m.id, m.text, m.timestamp, m.user_id, u.username,
     (SELECT COUNT(*) FROM likes l WHERE l.message_id = m.id)";

impl Database {
    // -- Users --

    /// Insert a new user. No uniqueness pre-check: the store's UNIQUE
    /// constraints are the single source of truth, and a duplicate
    /// email or username comes back as `DbError::UniqueViolation`.
    pub fn create_user(&self, user: &NewUserRow) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, username, password, image_url, header_image_url, bio, location)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.email,
                    user.username,
                    user.password,
                    user.image_url,
                    user.header_image_url,
                    user.bio,
                    user.location,
                ],
            )
            .map_err(map_unique)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", &[&id]))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", &[&username]))
    }

    /// Deleting a user cascades to their messages, likes, and follow
    /// edges in both directions (FK ON DELETE CASCADE).
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Follows --

    /// Record a "follower follows followee" edge. Idempotent: the
    /// composite primary key already limits each ordered pair to one
    /// edge, so re-following is a no-op rather than an error.
    pub fn follow(&self, follower_id: i64, followee_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followee_id) VALUES (?1, ?2)",
                [follower_id, followee_id],
            )?;
            Ok(())
        })
    }

    pub fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                [follower_id, followee_id],
            )?;
            Ok(())
        })
    }

    pub fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                    [follower_id, followee_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Symmetric view of the same edge: is `user_id` followed by `other_id`?
    pub fn is_followed_by(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.is_following(other_id, user_id)
    }

    pub fn followers_of(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                "id IN (SELECT follower_id FROM follows WHERE followee_id = ?1)",
                user_id,
            )
        })
    }

    pub fn following_of(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                "id IN (SELECT followee_id FROM follows WHERE follower_id = ?1)",
                user_id,
            )
        })
    }

    // -- Messages --

    pub fn create_message(&self, user_id: i64, text: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
                rusqlite::params![text, user_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m JOIN users u ON m.user_id = u.id
                 WHERE m.id = ?1"
            );
            let row = conn.query_row(&sql, [id], message_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn delete_message(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn messages_for_user(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m JOIN users u ON m.user_id = u.id
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC"
            );
            collect_messages(conn, &sql, &[&user_id])
        })
    }

    /// Home feed: the user's own warbles plus those of everyone they
    /// follow, newest first.
    pub fn timeline(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m JOIN users u ON m.user_id = u.id
                 WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT followee_id FROM follows WHERE follower_id = ?1)
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            );
            collect_messages(conn, &sql, &[&user_id, &limit])
        })
    }

    // -- Likes --

    pub fn like(&self, user_id: i64, message_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?1, ?2)",
                [user_id, message_id],
            )?;
            Ok(())
        })
    }

    pub fn unlike(&self, user_id: i64, message_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [user_id, message_id],
            )?;
            Ok(())
        })
    }

    /// Toggle a like: removes if present, inserts if not.
    /// Returns true when the message ends up liked.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [user_id, message_id],
            )?;
            if removed > 0 {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                [user_id, message_id],
            )?;
            Ok(true)
        })
    }

    pub fn is_liked(&self, message_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM likes WHERE message_id = ?1 AND user_id = ?2",
                    [message_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn count_likes(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m JOIN users u ON m.user_id = u.id
                 WHERE m.id IN (SELECT message_id FROM likes WHERE user_id = ?1)
                 ORDER BY m.timestamp DESC, m.id DESC"
            );
            collect_messages(conn, &sql, &[&user_id])
        })
    }
}

fn query_user(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, username, image_url, header_image_url, bio, location, password
         FROM users WHERE {filter}"
    );
    let row = conn.query_row(&sql, params, user_from_row).optional()?;
    Ok(row)
}

fn query_users(conn: &Connection, filter: &str, param: i64) -> Result<Vec<UserRow>> {
    let sql = format!(
        "SELECT id, email, username, image_url, header_image_url, bio, location, password
         FROM users WHERE {filter} ORDER BY username"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([param], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn collect_messages(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        author_username: row.get(4)?,
        like_count: row.get(5)?,
    })
}

/// Translate SQLITE_CONSTRAINT_UNIQUE / _PRIMARYKEY into the typed
/// variant, naming the offending column when SQLite reports it.
fn map_unique(e: rusqlite::Error) -> DbError {
    if let rusqlite::Error::SqliteFailure(err, msg) = &e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            let column = match msg.as_deref() {
                Some(m) if m.contains("users.email") => "users.email",
                Some(m) if m.contains("users.username") => "users.username",
                _ => "unknown",
            };
            return DbError::UniqueViolation(column);
        }
    }
    DbError::Sqlite(e)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, username: &str, email: &str) -> i64 {
        db.create_user(&NewUserRow {
            email: email.into(),
            username: username.into(),
            password: "HASHED_PASSWORD".into(),
            image_url: warbler_types::DEFAULT_IMAGE_URL.into(),
            header_image_url: warbler_types::DEFAULT_HEADER_IMAGE_URL.into(),
            bio: None,
            location: None,
        })
        .unwrap()
    }

    #[test]
    fn create_and_fetch_user() {
        let db = test_db();
        let id = seed_user(&db, "testuser", "test@test.com");

        let user = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "test@test.com");
        assert_eq!(user.image_url, warbler_types::DEFAULT_IMAGE_URL);

        // Fresh user has no messages and no followers
        assert!(db.messages_for_user(id).unwrap().is_empty());
        assert!(db.followers_of(id).unwrap().is_empty());
    }

    #[test]
    fn duplicate_email_rejected() {
        let db = test_db();
        seed_user(&db, "testuser", "test@test.com");

        let err = db
            .create_user(&NewUserRow {
                email: "test@test.com".into(),
                username: "othername".into(),
                password: "HASHED_PASSWORD".into(),
                image_url: String::new(),
                header_image_url: String::new(),
                bio: None,
                location: None,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation("users.email")));
    }

    #[test]
    fn duplicate_username_rejected() {
        let db = test_db();
        seed_user(&db, "testuser", "test@test.com");

        let err = db
            .create_user(&NewUserRow {
                email: "test2@test.com".into(),
                username: "testuser".into(),
                password: "HASHED_PASSWORD".into(),
                image_url: String::new(),
                header_image_url: String::new(),
                bio: None,
                location: None,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation("users.username")));
    }

    #[test]
    fn follow_edges_are_directed() {
        let db = test_db();
        let u1 = seed_user(&db, "testuser1", "test1@test.com");
        let u2 = seed_user(&db, "testuser2", "test2@test.com");

        // user2 follows user1
        db.follow(u2, u1).unwrap();

        assert!(db.is_following(u2, u1).unwrap());
        assert!(!db.is_following(u1, u2).unwrap());
        assert!(db.is_followed_by(u1, u2).unwrap());
        assert!(!db.is_followed_by(u2, u1).unwrap());

        let followers = db.followers_of(u1).unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].username, "testuser2");
        assert!(db.followers_of(u2).unwrap().is_empty());

        let following = db.following_of(u2).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "testuser1");
    }

    #[test]
    fn refollow_is_noop() {
        let db = test_db();
        let u1 = seed_user(&db, "testuser1", "test1@test.com");
        let u2 = seed_user(&db, "testuser2", "test2@test.com");

        db.follow(u2, u1).unwrap();
        db.follow(u2, u1).unwrap();
        assert_eq!(db.followers_of(u1).unwrap().len(), 1);

        db.unfollow(u2, u1).unwrap();
        assert!(!db.is_following(u2, u1).unwrap());
    }

    #[test]
    fn message_lifecycle() {
        let db = test_db();
        let uid = seed_user(&db, "testuser", "test@test.com");

        let mid = db.create_message(uid, "Cake").unwrap();
        let msg = db.get_message(mid).unwrap().unwrap();
        assert_eq!(msg.text, "Cake");
        assert_eq!(msg.author_username, "testuser");
        assert_eq!(msg.like_count, 0);

        db.delete_message(mid).unwrap();
        assert!(db.get_message(mid).unwrap().is_none());
    }

    #[test]
    fn overlong_message_rejected() {
        let db = test_db();
        let uid = seed_user(&db, "testuser", "test@test.com");

        let text = "x".repeat(141);
        assert!(db.create_message(uid, &text).is_err());
    }

    #[test]
    fn like_and_toggle() {
        let db = test_db();
        let uid = seed_user(&db, "testuser", "test@test.com");
        let mid = db.create_message(uid, "Cake").unwrap();

        assert!(!db.is_liked(mid, uid).unwrap());

        db.like(uid, mid).unwrap();
        assert!(db.is_liked(mid, uid).unwrap());
        assert_eq!(db.count_likes(uid).unwrap(), 1);
        assert_eq!(db.get_message(mid).unwrap().unwrap().like_count, 1);

        // Duplicate like is a no-op, not a second row
        db.like(uid, mid).unwrap();
        assert_eq!(db.count_likes(uid).unwrap(), 1);

        assert!(!db.toggle_like(uid, mid).unwrap());
        assert!(!db.is_liked(mid, uid).unwrap());
        assert!(db.toggle_like(uid, mid).unwrap());
        assert_eq!(db.liked_messages(uid).unwrap().len(), 1);
    }

    #[test]
    fn deleting_user_cascades() {
        let db = test_db();
        let u1 = seed_user(&db, "testuser1", "test1@test.com");
        let u2 = seed_user(&db, "testuser2", "test2@test.com");

        let mid = db.create_message(u1, "Cake").unwrap();
        db.like(u2, mid).unwrap();
        db.follow(u2, u1).unwrap();
        db.follow(u1, u2).unwrap();

        db.delete_user(u1).unwrap();

        assert!(db.get_user_by_id(u1).unwrap().is_none());
        assert!(db.get_message(mid).unwrap().is_none());
        assert_eq!(db.count_likes(u2).unwrap(), 0);
        assert!(!db.is_following(u2, u1).unwrap());
        assert!(!db.is_following(u1, u2).unwrap());
        assert!(db.followers_of(u2).unwrap().is_empty());
    }

    #[test]
    fn deleting_message_cascades_to_likes() {
        let db = test_db();
        let uid = seed_user(&db, "testuser", "test@test.com");
        let mid = db.create_message(uid, "Cake").unwrap();
        db.like(uid, mid).unwrap();

        db.delete_message(mid).unwrap();
        assert_eq!(db.count_likes(uid).unwrap(), 0);
    }

    #[test]
    fn timeline_includes_own_and_followed() {
        let db = test_db();
        let u1 = seed_user(&db, "testuser1", "test1@test.com");
        let u2 = seed_user(&db, "testuser2", "test2@test.com");
        let u3 = seed_user(&db, "testuser3", "test3@test.com");

        db.create_message(u1, "mine").unwrap();
        db.create_message(u2, "followed").unwrap();
        db.create_message(u3, "stranger").unwrap();
        db.follow(u1, u2).unwrap();

        let feed = db.timeline(u1, 100).unwrap();
        let texts: Vec<&str> = feed.iter().map(|m| m.text.as_str()).collect();
        assert!(texts.contains(&"mine"));
        assert!(texts.contains(&"followed"));
        assert!(!texts.contains(&"stranger"));
    }
}
