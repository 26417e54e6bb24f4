use std::path::Path;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use warbler_api::auth::AppState;
use warbler_api::{auth, messages, users};

pub fn app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(auth::homepage))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/logout", get(auth::logout))
        .route("/users/{user_id}", get(users::profile))
        .route("/users/follow/{user_id}", post(users::follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/delete", post(users::delete_account))
        .route("/messages", post(messages::create))
        .route("/messages/{message_id}", get(messages::show))
        .route("/messages/{message_id}/delete", post(messages::delete))
        .route("/messages/{message_id}/like", post(messages::toggle_like))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
