use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;
use tracing::warn;

use warbler_db::models::MessageRow;
use warbler_types::MAX_MESSAGE_LEN;
use warbler_types::forms::NewMessageForm;
use warbler_types::models::Message;

use crate::auth::{AppState, internal};
use crate::session::{self, CurrentUser};
use crate::templates::{HtmlTemplate, MessagePage};

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<NewMessageForm>,
) -> Result<Response, StatusCode> {
    let text = form.text.trim();
    if text.is_empty() || text.chars().count() > MAX_MESSAGE_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    state.db.create_message(user.id, text).map_err(internal)?;
    Ok(Redirect::to(&format!("/users/{}", user.id)).into_response())
}

pub async fn show(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(message_id): Path<i64>,
) -> Result<Response, StatusCode> {
    let (jar, flash) = session::take_flash(jar);

    let Some(row) = state.db.get_message(message_id).map_err(internal)? else {
        return Err(StatusCode::NOT_FOUND);
    };

    let viewer = session::current_user(&state, &jar).map_err(internal)?;
    let liked = match &viewer {
        Some(v) => state.db.is_liked(message_id, v.id).map_err(internal)?,
        None => false,
    };

    Ok((
        jar,
        HtmlTemplate(MessagePage {
            viewer,
            message: message_from_row(row),
            liked,
            flash,
        }),
    )
        .into_response())
}

/// Authors can delete their own warbles; anyone else gets a 403.
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, StatusCode> {
    let Some(row) = state.db.get_message(message_id).map_err(internal)? else {
        return Err(StatusCode::NOT_FOUND);
    };
    if row.user_id != user.id {
        warn!(
            "user {} tried to delete message {} owned by {}",
            user.id, message_id, row.user_id
        );
        return Err(StatusCode::FORBIDDEN);
    }

    state.db.delete_message(message_id).map_err(internal)?;
    Ok(Redirect::to(&format!("/users/{}", user.id)).into_response())
}

/// Toggle a like: likes if not yet liked, unlikes otherwise.
pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, StatusCode> {
    if state.db.get_message(message_id).map_err(internal)?.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    state.db.toggle_like(user.id, message_id).map_err(internal)?;
    Ok(Redirect::to(&format!("/messages/{message_id}")).into_response())
}

/// SQLite hands timestamps back as "YYYY-MM-DD HH:MM:SS" without a
/// timezone; parse as naive UTC with an RFC 3339 fallback.
pub fn message_from_row(row: MessageRow) -> Message {
    let timestamp = row
        .timestamp
        .parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(&row.timestamp, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on message {}: {}", row.timestamp, row.id, e);
            chrono::DateTime::default()
        });

    Message {
        id: row.id,
        text: row.text,
        timestamp,
        user_id: row.user_id,
        author_username: row.author_username,
        like_count: row.like_count,
    }
}
