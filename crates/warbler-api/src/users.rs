use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;

use crate::accounts::user_from_row;
use crate::auth::{AppState, internal};
use crate::messages::message_from_row;
use crate::session::{self, CurrentUser};
use crate::templates::{HtmlTemplate, ProfilePage};

pub async fn profile(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, StatusCode> {
    let (jar, flash) = session::take_flash(jar);

    let Some(row) = state.db.get_user_by_id(user_id).map_err(internal)? else {
        return Err(StatusCode::NOT_FOUND);
    };
    let user = user_from_row(row);

    let messages = state
        .db
        .messages_for_user(user_id)
        .map_err(internal)?
        .into_iter()
        .map(message_from_row)
        .collect();
    let follower_count = state.db.followers_of(user_id).map_err(internal)?.len();
    let following_count = state.db.following_of(user_id).map_err(internal)?.len();
    let liked_count = state.db.count_likes(user_id).map_err(internal)?;

    let viewer = session::current_user(&state, &jar).map_err(internal)?;
    let viewer_follows = match &viewer {
        Some(v) => state.db.is_following(v.id, user_id).map_err(internal)?,
        None => false,
    };

    Ok((
        jar,
        HtmlTemplate(ProfilePage {
            viewer,
            user,
            messages,
            follower_count,
            following_count,
            liked_count,
            viewer_follows,
            flash,
        }),
    )
        .into_response())
}

/// The schema does not forbid a self-edge, so the handler does.
pub async fn follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(followee_id): Path<i64>,
) -> Result<Response, StatusCode> {
    if followee_id == user.id {
        return Err(StatusCode::BAD_REQUEST);
    }
    if state
        .db
        .get_user_by_id(followee_id)
        .map_err(internal)?
        .is_none()
    {
        return Err(StatusCode::NOT_FOUND);
    }

    state.db.follow(user.id, followee_id).map_err(internal)?;
    Ok(Redirect::to(&format!("/users/{followee_id}")).into_response())
}

pub async fn stop_following(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(followee_id): Path<i64>,
) -> Result<Response, StatusCode> {
    state.db.unfollow(user.id, followee_id).map_err(internal)?;
    Ok(Redirect::to(&format!("/users/{followee_id}")).into_response())
}

/// Delete the signed-in user's account. The store cascades the user's
/// warbles, likes, and follow edges in both directions.
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: SignedCookieJar,
) -> Result<Response, StatusCode> {
    state.db.delete_user(user.id).map_err(internal)?;

    let jar = session::sign_out(jar);
    let jar = session::flash(jar, "Account deleted.");
    Ok((jar, Redirect::to("/signup")).into_response())
}
