mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, FlowContext, create_course_action, enroll_action, id_of, json_of,
    setup_server, setup_test_db, signin_action, signup_action, signup_instructor_action,
};

fn submit_path(ctx: &FlowContext) -> String {
    format!("/api/assignments/{}/submit", id_of(ctx, "assignment"))
}

fn submissions_path(ctx: &FlowContext) -> String {
    format!("/api/assignments/{}/submissions", id_of(ctx, "assignment"))
}

fn grade_path(ctx: &FlowContext) -> String {
    format!("/api/assignments/submissions/{}/grade", id_of(ctx, "submission"))
}

#[tokio::test]
async fn assignment_lifecycle_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_instructor_action("rival", "rival-pass"))
        .step(signup_instructor_action("tutor", "tutor-pass"))
        .step(create_course_action("Graded", true).with_save_as("course"))
        .step(
            Action::new("zero_max_score", "POST", "/api/assignments")
                .with_dyn_body(|ctx| {
                    json!({ "course_id": id_of(ctx, "course"), "title": "Essay", "max_score": 0 })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("create_assignment", "POST", "/api/assignments")
                .with_dyn_body(|ctx| {
                    json!({ "course_id": id_of(ctx, "course"), "title": "Essay", "max_score": 10 })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("assignment"),
        )
        .step(signup_action("student", "student-pass"))
        .step(
            Action::new("submit_not_enrolled", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_body(json!({ "content": "draft" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(enroll_action("course"))
        .step(
            Action::new("list_for_course", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/assignments/course/{}", id_of(ctx, "course")))
                .assert_body(|body| assert_eq!(json_of(body)[0]["title"], "Essay")),
        )
        .step(
            Action::new("submit_blank", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_body(json!({ "content": "   " }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_body(json!({ "content": "first draft" }))
                .with_save_as("submission"),
        )
        .step(
            Action::new("resubmit", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_body(json!({ "content": "final draft" }))
                .assert_body(|body| assert_eq!(json_of(body)["content"], "final draft")),
        )
        .step(
            Action::new("student_cannot_grade", "PUT", "dynamic")
                .with_dyn_path(grade_path)
                .with_body(json!({ "grade": 10 }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_action("rival", "rival-pass"))
        .step(
            Action::new("rival_submissions", "GET", "dynamic")
                .with_dyn_path(submissions_path)
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("rival_grade", "PUT", "dynamic")
                .with_dyn_path(grade_path)
                .with_body(json!({ "grade": 5 }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_action("tutor", "tutor-pass"))
        .step(
            Action::new("submissions", "GET", "dynamic")
                .with_dyn_path(submissions_path)
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v.as_array().map(Vec::len), Some(1));
                    assert_eq!(v[0]["username"], "student");
                    assert_eq!(v[0]["content"], "final draft");
                }),
        )
        .step(
            Action::new("grade_over_max", "PUT", "dynamic")
                .with_dyn_path(grade_path)
                .with_body(json!({ "grade": 11 }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("grade", "PUT", "dynamic")
                .with_dyn_path(grade_path)
                .with_body(json!({ "grade": 8, "feedback": "  Solid work  " }))
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["grade"], 8);
                    assert_eq!(v["feedback"], "Solid work");
                }),
        )
        .step(signin_action("student", "student-pass"))
        .step(
            Action::new("resubmit_after_grading", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_body(json!({ "content": "too late" }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn assignment_owner_only_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_instructor_action("tutor", "tutor-pass"))
        .step(create_course_action("Owned", true).with_save_as("course"))
        .step(
            Action::new("create_assignment", "POST", "/api/assignments")
                .with_dyn_body(|ctx| json!({ "course_id": id_of(ctx, "course"), "title": "Report" }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("assignment")
                .assert_body(|body| assert_eq!(json_of(body)["max_score"], 100)),
        )
        .step(signup_instructor_action("rival", "rival-pass"))
        .step(
            Action::new("rival_create", "POST", "/api/assignments")
                .with_dyn_body(|ctx| json!({ "course_id": id_of(ctx, "course"), "title": "Spam" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("rival_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/assignments/{}", id_of(ctx, "assignment")))
                .with_dyn_body(|ctx| json!({ "course_id": id_of(ctx, "course"), "title": "Mine now" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("rival_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/assignments/{}", id_of(ctx, "assignment")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_action("tutor", "tutor-pass"))
        .step(
            Action::new("update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/assignments/{}", id_of(ctx, "assignment")))
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": id_of(ctx, "course"),
                        "title": "Report v2",
                        "max_score": 20,
                    })
                })
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["title"], "Report v2");
                    assert_eq!(v["max_score"], 20);
                }),
        )
        .step(
            Action::new("delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/assignments/{}", id_of(ctx, "assignment"))),
        )
        .run(&mut server, pool)
        .await;
}
