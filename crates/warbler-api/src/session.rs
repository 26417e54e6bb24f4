//! Cookie-backed session state. The whole session is one signed
//! `curr_user` cookie holding the user id, plus a one-shot `flash`
//! cookie consumed by the next page render.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::Cookie;

use warbler_types::models::User;

use crate::accounts;
use crate::auth::AppState;

pub const CURR_USER: &str = "curr_user";
pub const FLASH: &str = "flash";

pub fn sign_in(jar: SignedCookieJar, user_id: i64) -> SignedCookieJar {
    jar.add(
        Cookie::build((CURR_USER, user_id.to_string()))
            .path("/")
            .http_only(true),
    )
}

pub fn sign_out(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(CURR_USER).path("/"))
}

pub fn flash(jar: SignedCookieJar, message: impl Into<String>) -> SignedCookieJar {
    jar.add(Cookie::build((FLASH, message.into())).path("/"))
}

/// Pop the pending flash message, if any. Returns the jar with the
/// cookie cleared so the message renders exactly once.
pub fn take_flash(jar: SignedCookieJar) -> (SignedCookieJar, Option<String>) {
    match jar.get(FLASH) {
        Some(cookie) => {
            let message = cookie.value().to_string();
            (jar.remove(Cookie::build(FLASH).path("/")), Some(message))
        }
        None => (jar, None),
    }
}

pub fn user_id(jar: &SignedCookieJar) -> Option<i64> {
    jar.get(CURR_USER)?.value().parse().ok()
}

/// Resolve the session cookie to a full user record. A stale cookie
/// pointing at a deleted user reads as anonymous.
pub fn current_user(
    state: &AppState,
    jar: &SignedCookieJar,
) -> Result<Option<User>, warbler_db::DbError> {
    let Some(id) = user_id(jar) else {
        return Ok(None);
    };
    Ok(state
        .db
        .get_user_by_id(id)?
        .map(accounts::user_from_row))
}

/// Extractor for routes that require a signed-in user. Anonymous
/// requests get bounced to the landing page with a flash.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (SignedCookieJar, Redirect);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match SignedCookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(err) => match err {},
        };

        match current_user(state, &jar) {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            _ => Err((
                flash(jar, "Access unauthorized."),
                Redirect::to("/"),
            )),
        }
    }
}
