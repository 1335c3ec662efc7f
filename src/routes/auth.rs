use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::session;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::found;
use crate::routes::home::Html;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup_page).post(signup))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

// -- Templates --

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

// -- Request types --

// Fields default to empty so a half-filled form re-renders with an error
// instead of being rejected by the extractor.
#[derive(Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            image_url: None,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(cookie_name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        cookie_name, token, max_age_secs
    )
}

fn clear_session_cookie(cookie_name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", cookie_name)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

/// Log the user in: create a DB session and attach the cookie to a redirect.
fn start_session(state: &AppState, user_id: &str, location: &str) -> AppResult<Response> {
    let token = session::create_session(&state.db, user_id, state.config.auth.session_hours)?;
    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    let mut response = found(location);
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie.parse().map_err(|_| {
            AppError::Internal("session cookie contained invalid characters".into())
        })?,
    );
    Ok(response)
}

// -- Handlers --

/// GET /signup
pub async fn signup_page() -> Html<SignupTemplate> {
    Html(SignupTemplate { error: None })
}

/// POST /signup — create the user, log them in, redirect home.
/// Validation and uniqueness failures re-render the form with a message.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let username = form.username.trim();
    let email = form.email.trim();
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Ok(Html(SignupTemplate {
            error: Some("Username, email, and password are required.".into()),
        })
        .into_response());
    }

    let image_url = form
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match users::signup(&state.db, username, email, &form.password, image_url) {
        Ok(user) => start_session(&state, &user.id, "/"),
        Err(AppError::Constraint(_)) => Ok(Html(SignupTemplate {
            error: Some("Username or email already taken.".into()),
        })
        .into_response()),
        Err(e) => Err(e),
    }
}

/// GET /login
pub async fn login_page() -> Html<LoginTemplate> {
    Html(LoginTemplate { error: None })
}

/// POST /login — a bad username and a bad password get the same message.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    match users::authenticate(&state.db, form.username.trim(), &form.password)? {
        Some(user) => start_session(&state, &user.id, "/"),
        None => Ok(Html(LoginTemplate {
            error: Some("Invalid credentials.".into()),
        })
        .into_response()),
    }
}

/// POST /logout — drop the session row and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> AppResult<Response> {
    if let Some(token) = cookie_value(&headers, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, token)?;
    }

    let mut response = found("/login");
    response.headers_mut().insert(
        header::SET_COOKIE,
        clear_session_cookie(&state.config.auth.cookie_name)
            .parse()
            .map_err(|_| AppError::Internal("invalid cookie name".into()))?,
    );
    Ok(response)
}
