use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as seen by the view layer. The password digest stays in the
/// database layer and is never carried on this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// An individual message (a "warble"), joined with enough author and
/// like data to render it in one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub author_username: String,
    pub like_count: i64,
}
