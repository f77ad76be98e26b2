mod common;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, FlowContext, create_course_action, enroll_action, id_of, json_of,
    setup_server, setup_test_db, signin_action, signup_action, signup_instructor_action,
};

fn session_body(ctx: &FlowContext, starts_in: Duration, minutes: i32) -> Value {
    json!({
        "course_id": id_of(ctx, "course"),
        "title": "Office hours",
        "starts_at": (Utc::now() + starts_in).to_rfc3339(),
        "duration_minutes": minutes,
        "meeting_url": "https://meet.example.com/office-hours",
    })
}

fn session_path(ctx: &FlowContext) -> String {
    format!("/api/live-classes/{}", id_of(ctx, "session"))
}

fn upcoming_count(body: &str) -> Option<usize> {
    json_of(body).as_array().map(Vec::len)
}

#[tokio::test]
async fn live_class_schedule_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_instructor_action("tutor", "tutor-pass"))
        .step(create_course_action("Live", true).with_save_as("course"))
        .step(
            Action::new("in_the_past", "POST", "/api/live-classes")
                .with_dyn_body(|ctx| session_body(ctx, Duration::hours(-1), 60))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("too_long", "POST", "/api/live-classes")
                .with_dyn_body(|ctx| session_body(ctx, Duration::days(1), 601))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("schedule", "POST", "/api/live-classes")
                .with_dyn_body(|ctx| session_body(ctx, Duration::days(1), 60))
                .with_expect(StatusCode::CREATED)
                .with_save_as("session"),
        )
        .step(
            Action::new("tutor_upcoming", "GET", "/api/live-classes/upcoming")
                .assert_body(|body| assert_eq!(upcoming_count(body), Some(1))),
        )
        .step(signup_action("outsider", "outsider-pass"))
        .step(
            Action::new("outsider_upcoming", "GET", "/api/live-classes/upcoming")
                .assert_body(|body| assert_eq!(upcoming_count(body), Some(0))),
        )
        .step(
            Action::new("outsider_by_course", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/live-classes/course/{}", id_of(ctx, "course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signup_action("student", "student-pass"))
        .step(enroll_action("course"))
        .step(
            Action::new("student_schedule", "POST", "/api/live-classes")
                .with_dyn_body(|ctx| session_body(ctx, Duration::days(1), 45))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("student_upcoming", "GET", "/api/live-classes/upcoming").assert_body(
                |body| {
                    assert_eq!(upcoming_count(body), Some(1));
                    assert_eq!(json_of(body)[0]["title"], "Office hours");
                },
            ),
        )
        .step(
            Action::new("student_by_course", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/live-classes/course/{}", id_of(ctx, "course")))
                .assert_body(|body| assert_eq!(upcoming_count(body), Some(1))),
        )
        .step(
            Action::new("student_reschedule", "PUT", "dynamic")
                .with_dyn_path(session_path)
                .with_dyn_body(|ctx| session_body(ctx, Duration::days(2), 30))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_action("tutor", "tutor-pass"))
        .step(
            Action::new("reschedule", "PUT", "dynamic")
                .with_dyn_path(session_path)
                .with_dyn_body(|ctx| session_body(ctx, Duration::days(2), 30))
                .assert_body(|body| assert_eq!(json_of(body)["duration_minutes"], 30)),
        )
        .step(Action::new("cancel", "DELETE", "dynamic").with_dyn_path(session_path))
        .step(signin_action("student", "student-pass"))
        .step(
            Action::new("upcoming_after_cancel", "GET", "/api/live-classes/upcoming")
                .assert_body(|body| assert_eq!(upcoming_count(body), Some(0))),
        )
        .run(&mut server, pool)
        .await;
}
