mod common;

use axum::http::StatusCode;

use common::{body_text, get, post_form, redirect_target, session_cookie_for, test_app, TestApp};
use warbler::db::models::{Message, User};
use warbler::db::{messages, users};

fn seed(app: &TestApp) -> (User, Message) {
    let u1 = users::signup(&app.state.db, "u1", "u1@email.com", "password", None).unwrap();
    let m1 = messages::create(&app.state.db, &u1.id, "m1-text").unwrap();
    (u1, m1)
}

fn seed_second_user(app: &TestApp) -> User {
    users::signup(&app.state.db, "u2", "u2@email.com", "password", None).unwrap()
}

#[tokio::test]
async fn add_message_redirects_and_persists() {
    let app = test_app();
    let (u1, _) = seed(&app);
    let cookie = session_cookie_for(&app, &u1.id);

    let response = post_form(&app, "/messages/new", "text=Hello", Some(&cookie)).await;

    assert_eq!(redirect_target(&response), format!("/users/{}", u1.id));
    let owned = messages::for_user(&app.state.db, &u1.id).unwrap();
    assert!(owned.iter().any(|m| m.text == "Hello"));
}

#[tokio::test]
async fn add_message_requires_authentication() {
    let app = test_app();
    seed(&app);

    let response = post_form(&app, "/messages/new", "text=Hello", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(messages::count(&app.state.db).unwrap(), 1);
}

#[tokio::test]
async fn add_message_without_text_rerenders_the_form() {
    let app = test_app();
    let (u1, _) = seed(&app);
    let cookie = session_cookie_for(&app, &u1.id);

    let response = post_form(&app, "/messages/new", "", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Add my message!"));
    assert_eq!(messages::count(&app.state.db).unwrap(), 1);
}

#[tokio::test]
async fn show_message_renders_its_text() {
    let app = test_app();
    let (_, m1) = seed(&app);

    let response = get(&app, &format!("/messages/{}", m1.id), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("m1-text"));
    assert!(html.contains("@u1"));
}

#[tokio::test]
async fn show_unknown_message_is_404() {
    let app = test_app();
    seed(&app);

    let response = get(&app, "/messages/doesnotexist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_can_delete_their_message() {
    let app = test_app();
    let (u1, m1) = seed(&app);
    let cookie = session_cookie_for(&app, &u1.id);

    let response = post_form(
        &app,
        &format!("/messages/{}/delete", m1.id),
        "",
        Some(&cookie),
    )
    .await;

    assert_eq!(redirect_target(&response), format!("/users/{}", u1.id));
    assert_eq!(messages::count(&app.state.db).unwrap(), 0);
}

#[tokio::test]
async fn deleting_someone_elses_message_is_rejected() {
    let app = test_app();
    let (_, m1) = seed(&app);
    let u2 = seed_second_user(&app);
    let cookie = session_cookie_for(&app, &u2.id);

    let response = post_form(
        &app,
        &format!("/messages/{}/delete", m1.id),
        "",
        Some(&cookie),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Unauthorized"));
    assert_eq!(messages::count(&app.state.db).unwrap(), 1);
}

#[tokio::test]
async fn deleting_an_unknown_message_is_404() {
    let app = test_app();
    let (u1, _) = seed(&app);
    let cookie = session_cookie_for(&app, &u1.id);

    let response = post_form(&app, "/messages/doesnotexist/delete", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn liking_a_message_creates_one_like_row() {
    let app = test_app();
    let (u1, m1) = seed(&app);
    let u2 = seed_second_user(&app);
    let cookie = session_cookie_for(&app, &u2.id);

    let response = post_form(
        &app,
        &format!("/messages/{}/like", m1.id),
        "from_url=%2F",
        Some(&cookie),
    )
    .await;

    assert_eq!(redirect_target(&response), "/");
    assert_eq!(messages::like_count(&app.state.db).unwrap(), 1);

    let liked = messages::liked_by(&app.state.db, &u2.id).unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].user_id, u1.id);
}

#[tokio::test]
async fn liking_again_removes_the_like() {
    let app = test_app();
    let (_, m1) = seed(&app);
    let u2 = seed_second_user(&app);
    let cookie = session_cookie_for(&app, &u2.id);
    messages::toggle_like(&app.state.db, &u2.id, &m1.id).unwrap();

    let response = post_form(
        &app,
        &format!("/messages/{}/like", m1.id),
        "from_url=%2F",
        Some(&cookie),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(messages::like_count(&app.state.db).unwrap(), 0);
    assert!(messages::liked_by(&app.state.db, &u2.id).unwrap().is_empty());
}

#[tokio::test]
async fn liking_your_own_message_is_rejected() {
    let app = test_app();
    let (u1, m1) = seed(&app);
    let cookie = session_cookie_for(&app, &u1.id);

    let response = post_form(
        &app,
        &format!("/messages/{}/like", m1.id),
        "from_url=%2F",
        Some(&cookie),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Cannot like your own post"));
    assert_eq!(messages::like_count(&app.state.db).unwrap(), 0);
}

#[tokio::test]
async fn like_redirect_honors_the_originating_page() {
    let app = test_app();
    let (u1, m1) = seed(&app);
    let u2 = seed_second_user(&app);
    let cookie = session_cookie_for(&app, &u2.id);

    let from = format!("/users/{}", u1.id);
    let response = post_form(
        &app,
        &format!("/messages/{}/like", m1.id),
        &format!("from_url={}", from.replace('/', "%2F")),
        Some(&cookie),
    )
    .await;

    assert_eq!(redirect_target(&response), from);
}
