use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::messages;
use crate::db::models::MessageWithAuthor;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::found;
use crate::routes::home::Html;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/new", get(new_page).post(create))
        .route("/messages/{id}", get(show))
        .route("/messages/{id}/delete", post(delete))
        .route("/messages/{id}/like", post(like))
}

// -- Templates --

#[derive(Template)]
#[template(path = "pages/message_new.html")]
pub struct MessageNewTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/message_show.html")]
pub struct MessageShowTemplate {
    pub message: MessageWithAuthor,
}

#[derive(Template)]
#[template(path = "pages/rejected.html")]
pub struct RejectedTemplate {
    pub message: String,
}

// -- Request types --

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct NewMessageForm {
    pub text: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LikeForm {
    pub from_url: Option<String>,
}

// -- Handlers --

/// GET /messages/new
pub async fn new_page(_user: CurrentUser) -> Html<MessageNewTemplate> {
    Html(MessageNewTemplate { error: None })
}

/// POST /messages/new — owner is always the authenticated actor. Missing
/// text re-renders the form; success redirects to the actor's profile.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<NewMessageForm>,
) -> AppResult<Response> {
    let text = form.text.trim();
    if text.is_empty() {
        return Ok(Html(MessageNewTemplate {
            error: Some("Text is required.".into()),
        })
        .into_response());
    }

    match messages::create(&state.db, &user.id, text) {
        Ok(_) => Ok(found(&format!("/users/{}", user.id))),
        Err(AppError::Constraint(_)) => Ok(Html(MessageNewTemplate {
            error: Some("Message must be at most 140 characters.".into()),
        })
        .into_response()),
        Err(e) => Err(e),
    }
}

/// GET /messages/{id} — 404 for an unknown id.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let message = messages::get_with_author(&state.db, &id)?.ok_or(AppError::NotFound)?;
    Ok(Html(MessageShowTemplate { message }).into_response())
}

/// POST /messages/{id}/delete — owner only. A non-owner sees a rejection
/// page and the message survives; an unknown id is a 404.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    match messages::delete(&state.db, &user.id, &id) {
        Ok(()) => Ok(found(&format!("/users/{}", user.id))),
        Err(AppError::Forbidden(message)) => {
            Ok(Html(RejectedTemplate { message }).into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /messages/{id}/like — toggles the like edge. Liking your own message
/// is rejected with a page, not a redirect.
pub async fn like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<LikeForm>,
) -> AppResult<Response> {
    match messages::toggle_like(&state.db, &user.id, &id) {
        Ok(_) => Ok(found(form.from_url.as_deref().unwrap_or("/"))),
        Err(AppError::Forbidden(message)) => {
            Ok(Html(RejectedTemplate { message }).into_response())
        }
        Err(e) => Err(e),
    }
}
