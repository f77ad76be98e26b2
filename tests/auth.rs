mod common;
use axum::http::StatusCode;
use learnhub::model::entity::UserEntity;
use learnhub::web::UserRole;
use learnhub::web::middlewares::AUTH_TOKEN;
use serde_json::json;
use tower_cookies::cookie::SameSite;

use crate::common::{
    Action, Flow, id_of, json_of, seed_user, setup_server, setup_test_db, signin_action,
    signin_admin_action, signup_action,
};

#[tokio::test]
async fn route_signup_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("foobar", "foobaz")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(ent.username(), "foobar");
                    assert_eq!(ent.role(), UserRole::Learner);
                    assert!(!body.contains("password"));
                })
                .with_expect(StatusCode::OK),
        )
        // try to signup twice
        .step(signup_action("foobar", "foobaz").with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("signup_admin", "POST", "/api/auth/signup")
                .with_body(json!({
                    "username": "sneaky",
                    "email": "sneaky@example.com",
                    "password": "sneaky-pass",
                    "role": "admin",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("signup_short_password", "POST", "/api/auth/signup")
                .with_body(json!({
                    "username": "shorty",
                    "email": "shorty@example.com",
                    "password": "abc",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_signin_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("SIGNINTEST", "SIGNINTEST").with_save_cookies(false))
        .step(
            signin_action("SIGNINTEST", "SIGNINTEST")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid JSON format");
                    assert_eq!(ent.username(), "SIGNINTEST");
                }),
        )
        // email works as a login too
        .step(signin_action("signintest@example.com", "SIGNINTEST"))
        .step(
            signin_action("SIGNINTEST", "WRONGPASSWORD")
                .with_save_cookies(false)
                .assert_body(|body| {
                    assert!(body.contains("Authentication error"));
                })
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            signin_action("nonexisting", "nvm")
                .with_expect(StatusCode::UNAUTHORIZED)
                .assert_body(|body| assert!(body.contains("Authentication error"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_me_and_signout_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(Action::new("me_anonymous", "GET", "/api/auth/me").with_expect(StatusCode::UNAUTHORIZED))
        .step(signup_action("alice", "alice-pass"))
        .step(
            Action::new("me", "GET", "/api/auth/me")
                .assert_body(|body| assert_eq!(json_of(body)["username"], "alice")),
        )
        .step(Action::new("signout", "POST", "/api/auth/signout"))
        .step(Action::new("me_after_signout", "GET", "/api/auth/me").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_update_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("taken", "taken-pass").with_save_cookies(false))
        .step(signup_action("bob", "bob-pass").with_save_as("bob"))
        .step(
            Action::new("user_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/auth/{}", id_of(ctx, "bob")))
                .with_body(json!({
                    "username": "bobby",
                    "email": "bobby@example.com",
                    "full_name": "Bob Builder",
                }))
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["username"], "bobby");
                    assert_eq!(v["full_name"], "Bob Builder");
                }),
        )
        .step(
            Action::new("user_update_conflict", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/auth/{}", id_of(ctx, "bob")))
                .with_body(json!({
                    "username": "taken",
                    "email": "bobby@example.com",
                    "full_name": "",
                }))
                .with_expect(StatusCode::CONFLICT),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_delete_test() {
    let pool = setup_test_db().await;
    seed_user(&pool, "admin", "admin-password", UserRole::Admin).await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("victim", "victim-pass").with_save_as("victim"))
        .step(signup_action("intruder", "intruder-pass"))
        .step(
            Action::new("user_delete_foreign", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/auth/{}", id_of(ctx, "victim")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action())
        .step(
            Action::new("user_delete_admin", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/auth/{}", id_of(ctx, "victim"))),
        )
        .step(
            Action::new("user_delete_missing", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/auth/{}", id_of(ctx, "victim")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}
