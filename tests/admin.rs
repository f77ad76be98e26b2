mod common;
use axum::http::StatusCode;
use learnhub::web::UserRole;
use serde_json::json;

use crate::common::{
    Action, Flow, FlowContext, create_course_action, id_of, json_of, seed_user, setup_server,
    setup_test_db, signin_action, signin_admin_action, signup_action,
};

#[tokio::test]
async fn admin_gate_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("users_anonymous", "GET", "/api/admin/users")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(signup_action("student", "student-pass"))
        .step(
            Action::new("users_as_learner", "GET", "/api/admin/users")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("stats_as_learner", "GET", "/api/admin/stats")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("badge_as_learner", "POST", "/api/admin/badges")
                .with_body(json!({ "name": "Cheater", "min_points": 1 }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn admin_users_test() {
    let pool = setup_test_db().await;
    seed_user(&pool, "admin", "admin-password", UserRole::Admin).await;
    let mut server = setup_server(&pool).await;

    let role_path =
        |ctx: &FlowContext| format!("/api/admin/users/{}/role", id_of(ctx, "student"));

    Flow::new()
        .step(signup_action("student", "student-pass").with_save_as("student"))
        .step(signin_admin_action())
        .step(
            Action::new("users_page", "GET", "/api/admin/users")
                .with_param("limit", "1")
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["total"], 2);
                    assert_eq!(v["limit"], 1);
                    assert_eq!(v["items"].as_array().map(Vec::len), Some(1));
                    assert!(v["items"][0].get("password_hash").is_none());
                }),
        )
        .step(
            Action::new("unknown_role", "PUT", "dynamic")
                .with_dyn_path(role_path)
                .with_body(json!({ "role": "wizard" }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("promote", "PUT", "dynamic")
                .with_dyn_path(role_path)
                .with_body(json!({ "role": "instructor" }))
                .assert_body(|body| assert_eq!(json_of(body)["role"], "instructor")),
        )
        .step(signin_action("student", "student-pass"))
        .step(create_course_action("Now teaching", true))
        .step(signin_admin_action())
        .step(
            Action::new("stats", "GET", "/api/admin/stats").assert_body(|body| {
                let v = json_of(body);
                assert_eq!(v["users"], 2);
                assert_eq!(v["admins"], 1);
                assert_eq!(v["instructors"], 1);
                assert_eq!(v["courses"], 1);
            }),
        )
        .step(
            Action::new("courses", "GET", "/api/admin/courses")
                .assert_body(|body| assert_eq!(json_of(body)["total"], 1)),
        )
        .step(
            Action::new("delete_user", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/admin/users/{}", id_of(ctx, "student"))),
        )
        .step(
            Action::new("delete_user_again", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/admin/users/{}", id_of(ctx, "student")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn admin_badges_test() {
    let pool = setup_test_db().await;
    seed_user(&pool, "admin", "admin-password", UserRole::Admin).await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(
            Action::new("seeded_badges", "GET", "/api/admin/badges").assert_body(|body| {
                let v = json_of(body);
                assert_eq!(v.as_array().map(Vec::len), Some(5));
                assert_eq!(v[0]["name"], "Newcomer");
            }),
        )
        .step(
            Action::new("create_badge", "POST", "/api/admin/badges")
                .with_body(json!({ "name": "Legend", "min_points": 5000 }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("badge"),
        )
        .step(
            Action::new("duplicate_name", "POST", "/api/admin/badges")
                .with_body(json!({ "name": "Legend", "min_points": 6000 }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("duplicate_threshold", "POST", "/api/admin/badges")
                .with_body(json!({ "name": "Hero", "min_points": 5000 }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("negative_threshold", "POST", "/api/admin/badges")
                .with_body(json!({ "name": "Debtor", "min_points": -1 }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("update_badge", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/admin/badges/{}", id_of(ctx, "badge")))
                .with_body(json!({ "name": "Legend", "min_points": 4000 }))
                .assert_body(|body| assert_eq!(json_of(body)["min_points"], 4000)),
        )
        .step(
            Action::new("delete_badge", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/admin/badges/{}", id_of(ctx, "badge"))),
        )
        .step(
            Action::new("badges_after_delete", "GET", "/api/admin/badges")
                .assert_body(|body| assert_eq!(json_of(body).as_array().map(Vec::len), Some(5))),
        )
        .run(&mut server, pool)
        .await;
}
