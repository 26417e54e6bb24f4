use std::sync::Arc;

use axum::Form;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::Key;
use tracing::{error, warn};

use warbler_db::Database;
use warbler_types::forms::{LoginForm, SignupForm};

use crate::accounts::{self, SignupError};
use crate::messages::message_from_row;
use crate::session;
use crate::templates::{AnonHomePage, HomePage, HtmlTemplate, LoginPage, SignupPage};

#[derive(Clone)]
pub struct AppState(pub Arc<AppStateInner>);

impl std::ops::Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &AppStateInner {
        &self.0
    }
}

pub struct AppStateInner {
    pub db: Database,
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}

const TIMELINE_LIMIT: u32 = 100;

pub async fn homepage(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, StatusCode> {
    let (jar, flash) = session::take_flash(jar);

    let Some(user) = session::current_user(&state, &jar).map_err(internal)? else {
        return Ok((jar, HtmlTemplate(AnonHomePage { flash })).into_response());
    };

    let messages = state
        .db
        .timeline(user.id, TIMELINE_LIMIT)
        .map_err(internal)?
        .into_iter()
        .map(message_from_row)
        .collect();

    Ok((
        jar,
        HtmlTemplate(HomePage {
            user,
            messages,
            flash,
        }),
    )
        .into_response())
}

pub async fn login_form(jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, flash) = session::take_flash(jar);
    (jar, HtmlTemplate(LoginPage { flash }))
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    match accounts::authenticate(&state.db, &form.username, &form.password).map_err(internal)? {
        Some(user) => {
            let jar = session::sign_in(jar, user.id);
            let jar = session::flash(jar, format!("Hello, {}!", user.username));
            Ok((jar, Redirect::to("/")).into_response())
        }
        None => {
            warn!("failed login attempt for {:?}", form.username);
            // Consume any pending flash so it doesn't resurface later
            let (jar, _) = session::take_flash(jar);
            Ok((
                jar,
                HtmlTemplate(LoginPage {
                    flash: Some("Invalid credentials.".into()),
                }),
            )
                .into_response())
        }
    }
}

pub async fn signup_form(jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, flash) = session::take_flash(jar);
    (jar, HtmlTemplate(SignupPage { flash }))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, StatusCode> {
    if form.username.trim().is_empty() || form.email.trim().is_empty() || form.password.is_empty() {
        let (jar, _) = session::take_flash(jar);
        return Ok((
            jar,
            HtmlTemplate(SignupPage {
                flash: Some("Username, e-mail and password are required.".into()),
            }),
        )
            .into_response());
    }

    match accounts::signup(&state.db, &form) {
        Ok(user) => {
            let jar = session::sign_in(jar, user.id);
            let jar = session::flash(jar, format!("Hello, {}!", user.username));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(SignupError::Taken) => {
            let (jar, _) = session::take_flash(jar);
            Ok((
                jar,
                HtmlTemplate(SignupPage {
                    flash: Some("Username or email already taken".into()),
                }),
            )
                .into_response())
        }
        Err(err) => Err(internal(err)),
    }
}

pub async fn logout(jar: SignedCookieJar) -> impl IntoResponse {
    let jar = session::sign_out(jar);
    let jar = session::flash(jar, "You have successfully logged out.");
    (jar, Redirect::to("/login"))
}

/// Store failures land here; log the cause and hand the client a 500.
pub(crate) fn internal(err: impl std::fmt::Display) -> StatusCode {
    error!("internal error: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}
