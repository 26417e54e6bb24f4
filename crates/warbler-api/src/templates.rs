use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use warbler_types::models::{Message, User};

/// Wraps an askama template so handlers can return it directly.
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                error!("template render failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Landing page shown to anonymous visitors.
#[derive(Template)]
#[template(path = "home_anon.html")]
pub struct AnonHomePage {
    pub flash: Option<String>,
}

/// Timeline for a signed-in user: own warbles plus followed users'.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub user: User,
    pub messages: Vec<Message>,
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub viewer: Option<User>,
    pub user: User,
    pub messages: Vec<Message>,
    pub follower_count: usize,
    pub following_count: usize,
    pub liked_count: i64,
    pub viewer_follows: bool,
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "message.html")]
pub struct MessagePage {
    pub viewer: Option<User>,
    pub message: Message,
    pub liked: bool,
    pub flash: Option<String>,
}
