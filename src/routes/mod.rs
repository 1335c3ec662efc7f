pub mod auth;
pub mod home;
pub mod messages;
pub mod users;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .merge(auth::router())
        .merge(users::router())
        .merge(messages::router())
}

/// A `302 Found` redirect. The form-post flows in this app are pinned to 302;
/// axum's `Redirect` only produces 303/307/308.
pub fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}
