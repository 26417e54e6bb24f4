/// Database row types — these map directly to SQLite rows.
/// Distinct from the warbler-types API models so the password digest
/// never leaves this crate's callers by accident.

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub author_username: String,
    pub like_count: i64,
}

/// Insert payload for a new user. The password field is the finished
/// digest; hashing happens upstream in the account layer.
pub struct NewUserRow {
    pub email: String,
    pub username: String,
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}
