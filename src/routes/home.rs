use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db::messages;
use crate::db::models::MessageWithAuthor;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::state::AppState;

const TIMELINE_LIMIT: i64 = 100;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub username: String,
    pub messages: Vec<MessageWithAuthor>,
}

#[derive(Template)]
#[template(path = "pages/home_anon.html")]
pub struct HomeAnonTemplate;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET / — timeline for the logged-in user, landing page otherwise.
pub async fn index(State(state): State<AppState>, maybe_user: MaybeUser) -> AppResult<Response> {
    let Some(user) = maybe_user.0 else {
        return Ok(Html(HomeAnonTemplate).into_response());
    };

    let messages = messages::timeline(&state.db, &user.id, TIMELINE_LIMIT)?;
    Ok(Html(HomeTemplate {
        username: user.username,
        messages,
    })
    .into_response())
}
