mod common;
use axum::http::StatusCode;
use learnhub::{
    config::Points,
    model::{
        CrudRepository,
        entity::{Course, CourseCreate, CourseProgress, Enrollment, Lesson, LessonCreate},
    },
    web::{AuthenticatedUser, UserRole},
};
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, FlowContext, complete_lesson_action, create_course_action,
    create_lesson_action, enroll_action, id_of, json_of, seed_user, setup_server,
    setup_test_db, signin_action, signup_action, signup_instructor_action,
};

fn progress_path(ctx: &FlowContext) -> String {
    format!("/api/learner/progress/{}", id_of(ctx, "course"))
}

#[tokio::test]
async fn enrollment_rules_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_instructor_action("tutor", "tutor-pass"))
        .step(create_course_action("Open", true).with_save_as("course"))
        .step(create_course_action("Hidden", false).with_save_as("draft"))
        .step(signup_action("student", "student-pass"))
        .step(
            Action::new("progress_before_enroll", "GET", "dynamic")
                .with_dyn_path(progress_path)
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(enroll_action("course"))
        .step(enroll_action("course").with_expect(StatusCode::BAD_REQUEST))
        .step(enroll_action("draft").with_expect(StatusCode::NOT_FOUND))
        .step(
            Action::new("progress_not_started", "GET", "dynamic")
                .with_dyn_path(progress_path)
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["percentage"], 0);
                    assert_eq!(v["status"], "YET_TO_START");
                }),
        )
        .step(
            Action::new("enrollments", "GET", "/api/learner/enrollments").assert_body(|body| {
                let v = json_of(body);
                assert_eq!(v.as_array().map(Vec::len), Some(1));
                assert_eq!(v[0]["title"], "Open");
                assert_eq!(v[0]["instructor_name"], "tutor Smith");
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn lesson_completion_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_instructor_action("tutor", "tutor-pass"))
        .step(create_course_action("Two lessons", true).with_save_as("course"))
        .step(create_lesson_action("course", "First").with_save_as("first"))
        .step(create_lesson_action("course", "Second").with_save_as("second"))
        .step(signup_action("student", "student-pass"))
        .step(complete_lesson_action("first").with_expect(StatusCode::FORBIDDEN))
        .step(enroll_action("course"))
        .step(complete_lesson_action("first").assert_body(|body| {
            let v = json_of(body);
            assert_eq!(v["newly_completed"], true);
            assert_eq!(v["points_awarded"], 10);
            assert_eq!(v["progress"]["percentage"], 50);
            assert_eq!(v["progress"]["status"], "IN_PROGRESS");
        }))
        .step(complete_lesson_action("first").assert_body(|body| {
            let v = json_of(body);
            assert_eq!(v["newly_completed"], false);
            assert_eq!(v["points_awarded"], 0);
            assert_eq!(v["progress"]["percentage"], 50);
        }))
        .step(
            Action::new("lesson_marked", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/lessons/{}", id_of(ctx, "first")))
                .assert_body(|body| assert_eq!(json_of(body)["completed"], true)),
        )
        .step(complete_lesson_action("second").assert_body(|body| {
            let v = json_of(body);
            assert_eq!(v["points_awarded"], 60);
            assert_eq!(v["progress"]["percentage"], 100);
            assert_eq!(v["progress"]["status"], "COMPLETED");
        }))
        .step(complete_lesson_action("second").assert_body(|body| {
            assert_eq!(json_of(body)["points_awarded"], 0);
        }))
        .step(
            Action::new("points", "GET", "/api/learner/points").assert_body(|body| {
                let v = json_of(body);
                assert_eq!(v["total"], 70);
                assert_eq!(v["badges"]["current"]["name"], "Explorer");
                assert_eq!(v["badges"]["next"]["name"], "Achiever");
            }),
        )
        .step(
            Action::new("points_history", "GET", "/api/learner/points/history").assert_body(
                |body| {
                    let v = json_of(body);
                    assert_eq!(v["total"], 3);
                },
            ),
        )
        .step(
            Action::new("leaderboard", "GET", "/api/learner/leaderboard").assert_body(|body| {
                let v = json_of(body);
                assert_eq!(v[0]["username"], "student");
                assert_eq!(v[0]["points"], 70);
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn progress_never_decreases_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_instructor_action("tutor", "tutor-pass"))
        .step(create_course_action("Growing", true).with_save_as("course"))
        .step(create_lesson_action("course", "First").with_save_as("first"))
        .step(create_lesson_action("course", "Second"))
        .step(signup_action("student", "student-pass"))
        .step(enroll_action("course"))
        .step(complete_lesson_action("first"))
        .step(signin_action("tutor", "tutor-pass"))
        .step(create_lesson_action("course", "Third"))
        .step(create_lesson_action("course", "Fourth"))
        .step(signin_action("student", "student-pass"))
        .step(complete_lesson_action("first").assert_body(|body| {
            assert_eq!(json_of(body)["progress"]["percentage"], 50);
        }))
        .step(
            Action::new("progress", "GET", "dynamic")
                .with_dyn_path(progress_path)
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["percentage"], 50);
                    assert_eq!(v["status"], "IN_PROGRESS");
                }),
        )
        .run(&mut server, pool)
        .await;
}

/// Answers for the stored quiz, picking option `choice[n]` for question `n`.
fn answers(ctx: &FlowContext, choice: &[usize]) -> Value {
    let quiz = ctx.get("quiz");
    let answers: Vec<Value> = choice
        .iter()
        .enumerate()
        .map(|(n, &pick)| {
            let question = &quiz["questions"][n];
            json!({
                "question_id": question["id"],
                "option_id": question["options"][pick]["id"],
            })
        })
        .collect();
    json!({ "answers": answers })
}

#[tokio::test]
async fn quiz_attempt_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let submit_path = |ctx: &FlowContext| format!("/api/quizzes/{}/submit", id_of(ctx, "quiz"));

    Flow::new()
        .step(signup_instructor_action("tutor", "tutor-pass"))
        .step(create_course_action("Quizzed", true).with_save_as("course"))
        .step(
            Action::new("create_quiz", "POST", "/api/quizzes")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": id_of(ctx, "course"),
                        "title": "Basics",
                        "pass_percentage": 50,
                        "questions": [
                            {
                                "question_text": "1 + 1",
                                "options": [
                                    { "option_text": "1" },
                                    { "option_text": "2", "is_correct": true },
                                ],
                            },
                            {
                                "question_text": "2 + 2",
                                "options": [
                                    { "option_text": "4", "is_correct": true },
                                    { "option_text": "5" },
                                ],
                            },
                        ],
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("quiz"),
        )
        .step(signup_action("student", "student-pass"))
        .step(
            Action::new("submit_not_enrolled", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_dyn_body(|ctx| answers(ctx, &[1, 0]))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(enroll_action("course"))
        .step(
            Action::new("quiz_hides_answers", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/quizzes/{}", id_of(ctx, "quiz")))
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["questions"].as_array().map(Vec::len), Some(2));
                    assert!(v["questions"][0]["options"][0].get("is_correct").is_none());
                }),
        )
        .step(
            Action::new("submit_failing", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_dyn_body(|ctx| answers(ctx, &[0, 1]))
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["score"], 0);
                    assert_eq!(v["passed"], false);
                    assert_eq!(v["points_awarded"], 0);
                }),
        )
        .step(
            Action::new("submit_passing", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_dyn_body(|ctx| answers(ctx, &[1, 1]))
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["score"], 1);
                    assert_eq!(v["total"], 2);
                    assert_eq!(v["passed"], true);
                    assert_eq!(v["points_awarded"], 20);
                }),
        )
        .step(
            Action::new("submit_passing_again", "POST", "dynamic")
                .with_dyn_path(submit_path)
                .with_dyn_body(|ctx| answers(ctx, &[1, 0]))
                .assert_body(|body| {
                    let v = json_of(body);
                    assert_eq!(v["score"], 2);
                    assert_eq!(v["points_awarded"], 0);
                }),
        )
        .step(
            Action::new("points", "GET", "/api/learner/points")
                .assert_body(|body| assert_eq!(json_of(body)["total"], 20)),
        )
        .step(
            Action::new("attempts", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/quizzes/{}/attempts", id_of(ctx, "quiz")))
                .assert_body(|body| assert_eq!(json_of(body).as_array().map(Vec::len), Some(3))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_finish_course_test() {
    let pool = setup_test_db().await;
    let mm = pool.model_manager();

    let tutor_id = seed_user(&pool, "tutor", "tutor-pass", UserRole::Instructor).await;
    let student_id = seed_user(&pool, "student", "student-pass", UserRole::Learner).await;
    let tutor = AuthenticatedUser::new(tutor_id, UserRole::Instructor);
    let student = AuthenticatedUser::new(student_id, UserRole::Learner);
    let points = Points::default();

    for round in 0..10 {
        let course = Course::create(
            &mm,
            &tutor,
            CourseCreate {
                title: format!("Parallel {}", round),
                description: String::new(),
                category: None,
                level: None,
                is_published: Some(true),
            },
        )
        .await
        .unwrap();

        let mut lessons = Vec::new();
        for title in ["a", "b"] {
            let lesson = Lesson::create(
                &mm,
                &tutor,
                LessonCreate {
                    course_id: course.id(),
                    title: title.to_string(),
                    content: String::new(),
                    video_url: None,
                    order_index: None,
                },
            )
            .await
            .unwrap();
            lessons.push(lesson.id());
        }
        Enrollment::enroll(&mm, &student, course.id()).await.unwrap();

        let (first, second) = tokio::join!(
            CourseProgress::complete_lesson(&mm, &student, course.id(), lessons[0], points),
            CourseProgress::complete_lesson(&mm, &student, course.id(), lessons[1], points),
        );
        let awarded = first.unwrap().points_awarded + second.unwrap().points_awarded;
        assert_eq!(awarded, 10 + 10 + 50, "round {}", round);

        let progress = CourseProgress::find(&mm, &student, course.id())
            .await
            .unwrap()
            .expect("progress row");
        assert_eq!(progress.percentage(), 100, "round {}", round);
        assert!(progress.is_completed(), "round {}", round);
    }
}
