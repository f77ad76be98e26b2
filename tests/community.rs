mod common;
use std::time::Duration;

use axum::http::StatusCode;
use learnhub::{
    model::entity::{CHAT_WRITE_LOCK, ChatMessage},
    web::{AuthenticatedUser, UserRole},
};
use serde_json::json;

use crate::common::{
    Action, Flow, json_of, seed_user, setup_server, setup_test_db, signup_action,
};

#[tokio::test]
async fn community_chat_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("anonymous", "GET", "/api/community/messages")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(signup_action("alice", "alice-pass"))
        .step(
            Action::new("post_first", "POST", "/api/community/messages")
                .with_body(json!({ "content": "  hello there  " }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("first")
                .assert_body(|body| assert_eq!(json_of(body)["content"], "hello there")),
        )
        .step(
            Action::new("post_blank", "POST", "/api/community/messages")
                .with_body(json!({ "content": "   " }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("post_too_long", "POST", "/api/community/messages")
                .with_body(json!({ "content": "x".repeat(1001) }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(signup_action("bob", "bob-pass"))
        .step(
            Action::new("post_second", "POST", "/api/community/messages")
                .with_body(json!({ "content": "hi alice" }))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("recent", "GET", "/api/community/messages").assert_body(|body| {
                let v = json_of(body);
                assert_eq!(v.as_array().map(Vec::len), Some(2));
                assert_eq!(v[0]["content"], "hello there");
                assert_eq!(v[1]["username"], "bob");
            }),
        )
        .step(
            Action::new("after_first", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let id = ctx.get("first")["id"].as_i64().expect("numeric id");
                    format!("/api/community/messages?after_id={}", id)
                })
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v.as_array().map(Vec::len), Some(1));
                    assert_eq!(v[0]["content"], "hi alice");
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_posts_wait_for_in_flight_writer_test() {
    let pool = setup_test_db().await;
    let mm = pool.model_manager();
    let alice_id = seed_user(&pool, "alice", "alice-pass", UserRole::Learner).await;
    let alice = AuthenticatedUser::new(alice_id, UserRole::Learner);

    // Stand in for a writer that has drawn an id but not committed yet.
    let mut writer = mm.begin().await.unwrap();
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(CHAT_WRITE_LOCK)
        .execute(&mut *writer)
        .await
        .unwrap();

    let mut poster = {
        let mm = mm.clone();
        tokio::spawn(async move { ChatMessage::post(&mm, &alice, "queued").await })
    };
    assert!(
        tokio::time::timeout(Duration::from_millis(300), &mut poster)
            .await
            .is_err(),
        "post must not commit while another writer holds the chat lock"
    );

    writer.commit().await.unwrap();
    let posted = poster.await.unwrap().unwrap();

    let visible = ChatMessage::after(&mm, Some(posted.id - 1), 10).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].content, "queued");
}
