use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use warbler::auth::session;
use warbler::config::Config;
use warbler::db;
use warbler::state::AppState;

/// A router plus its backing state. The TempDir keeps the database file
/// alive for the duration of the test.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _tmp: TempDir,
}

pub fn test_app() -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let pool = db::create_pool(&tmp.path().join("test.db")).unwrap();
    db::run_migrations(&pool).unwrap();

    let state = AppState {
        db: pool,
        config: Config::default(),
    };
    let router = warbler::routes::router().with_state(state.clone());

    TestApp {
        router,
        state,
        _tmp: tmp,
    }
}

/// Log a user in directly, returning a Cookie header value.
pub fn session_cookie_for(app: &TestApp, user_id: &str) -> String {
    let token = session::create_session(&app.state.db, user_id, 1).unwrap();
    format!("{}={}", app.state.config.auth.cookie_name, token)
}

pub async fn get(app: &TestApp, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: &TestApp, uri: &str, body: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.router
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert a 302 and return the Location target.
pub fn redirect_target(response: &Response) -> String {
    assert_eq!(response.status(), StatusCode::FOUND);
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}
