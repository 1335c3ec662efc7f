use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::password;
use crate::db::models::{MessageWithAuthor, User};
use crate::db::{messages, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::found;
use crate::routes::home::Html;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/profile", get(profile_page).post(profile_update))
        .route("/users/delete", post(delete_account))
        .route("/users/follow/{id}", post(follow))
        .route("/users/stop-following/{id}", post(stop_following))
        .route("/users/{id}", get(show))
        .route("/users/{id}/following", get(following))
        .route("/users/{id}/followers", get(followers))
        .route("/users/{id}/likes", get(likes))
}

// -- Templates --

#[derive(Template)]
#[template(path = "pages/user_index.html")]
pub struct UserIndexTemplate {
    pub query: String,
    pub users: Vec<User>,
}

#[derive(Template)]
#[template(path = "pages/user_detail.html")]
pub struct UserDetailTemplate {
    pub user: User,
    pub messages: Vec<MessageWithAuthor>,
    pub following_count: usize,
    pub followers_count: usize,
    pub likes_count: usize,
    pub is_self: bool,
    pub viewer_is_following: bool,
}

#[derive(Template)]
#[template(path = "pages/following.html")]
pub struct FollowingTemplate {
    pub user: User,
    pub users: Vec<User>,
}

#[derive(Template)]
#[template(path = "pages/followers.html")]
pub struct FollowersTemplate {
    pub user: User,
    pub users: Vec<User>,
}

#[derive(Template)]
#[template(path = "pages/likes.html")]
pub struct LikesTemplate {
    pub user: User,
    pub messages: Vec<MessageWithAuthor>,
}

#[derive(Template)]
#[template(path = "pages/profile_edit.html")]
pub struct ProfileEditTemplate {
    pub error: Option<String>,
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
}

// -- Request types --

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub password: String,
}

// -- Handlers --

/// GET /users?q= — username search.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Response> {
    let q = query.q.unwrap_or_default();
    let users = users::search(&state.db, q.trim())?;
    Ok(Html(UserIndexTemplate { query: q, users }).into_response())
}

/// GET /users/{id} — profile page with messages, counts, and follow state.
pub async fn show(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = users::get(&state.db, &id)?.ok_or(AppError::NotFound)?;
    let messages_list = messages::for_user(&state.db, &user.id)?;
    let following_count = users::following(&state.db, &user.id)?.len();
    let followers_count = users::followers(&state.db, &user.id)?.len();
    let likes_count = messages::liked_by(&state.db, &user.id)?.len();

    let (is_self, viewer_is_following) = match &maybe_user.0 {
        Some(viewer) if viewer.id == user.id => (true, false),
        Some(viewer) => (false, users::is_following(&state.db, &viewer.id, &user.id)?),
        None => (false, false),
    };

    Ok(Html(UserDetailTemplate {
        user,
        messages: messages_list,
        following_count,
        followers_count,
        likes_count,
        is_self,
        viewer_is_following,
    })
    .into_response())
}

/// GET /users/{id}/following
pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = users::get(&state.db, &id)?.ok_or(AppError::NotFound)?;
    let users = users::following(&state.db, &user.id)?;
    Ok(Html(FollowingTemplate { user, users }).into_response())
}

/// GET /users/{id}/followers
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = users::get(&state.db, &id)?.ok_or(AppError::NotFound)?;
    let users = users::followers(&state.db, &user.id)?;
    Ok(Html(FollowersTemplate { user, users }).into_response())
}

/// GET /users/{id}/likes
pub async fn likes(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let user = users::get(&state.db, &id)?.ok_or(AppError::NotFound)?;
    let messages = messages::liked_by(&state.db, &user.id)?;
    Ok(Html(LikesTemplate { user, messages }).into_response())
}

/// POST /users/follow/{id}
pub async fn follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    users::get(&state.db, &id)?.ok_or(AppError::NotFound)?;
    users::follow(&state.db, &user.id, &id)?;
    Ok(found(&format!("/users/{}/following", user.id)))
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    users::unfollow(&state.db, &user.id, &id)?;
    Ok(found(&format!("/users/{}/following", user.id)))
}

/// GET /users/profile — edit form pre-filled with the current values.
pub async fn profile_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let user = users::get(&state.db, &user.id)?.ok_or(AppError::NotFound)?;
    Ok(Html(ProfileEditTemplate {
        error: None,
        username: user.username,
        email: user.email,
        image_url: user.image_url,
    })
    .into_response())
}

/// POST /users/profile — requires the current password to confirm the edit.
pub async fn profile_update(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let stored = users::get(&state.db, &user.id)?.ok_or(AppError::NotFound)?;

    let rerender = |error: String| ProfileEditTemplate {
        error: Some(error),
        username: form.username.clone(),
        email: form.email.clone(),
        image_url: form.image_url.clone(),
    };

    if !password::verify(&form.password, &stored.password_hash) {
        return Ok(Html(rerender("Invalid password.".into())).into_response());
    }

    let username = form.username.trim();
    let email = form.email.trim();
    if username.is_empty() || email.is_empty() {
        return Ok(Html(rerender("Username and email are required.".into())).into_response());
    }

    let image_url = form
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match users::update_profile(&state.db, &user.id, username, email, image_url) {
        Ok(()) => Ok(found(&format!("/users/{}", user.id))),
        Err(AppError::Constraint(_)) => {
            Ok(Html(rerender("Username or email already taken.".into())).into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /users/delete — remove the account (messages and edges cascade),
/// clear the session, land on the signup page.
pub async fn delete_account(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    users::delete(&state.db, &user.id)?;

    let mut response = found("/signup");
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        state.config.auth.cookie_name
    );
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| AppError::Internal("invalid cookie name".into()))?,
    );
    Ok(response)
}
