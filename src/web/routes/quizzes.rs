use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository,
        entity::{
            Lesson, PointsEntry, PointsReason, Quiz, QuizAttempt, QuizAttemptCreate, QuizCreate,
            score_answers,
        },
        progression,
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebResult,
        dto::quizzes::{QuizResultResponse, QuizSubmitBody, QuizView},
        error::ErrorResponse,
        middlewares,
        routes::{
            bad_request, ensure_course_reader, ensure_enrolled, ensure_owner, fetch_err,
            found_or_404, load_course, owns_course,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(quizzes_create_handler))
        .route("/course/{id}", get(quizzes_by_course_handler))
        .route(
            "/{id}",
            get(quizzes_get_handler)
                .put(quizzes_update_handler)
                .delete(quizzes_delete_handler),
        )
        .route("/{id}/submit", post(quizzes_submit_handler))
        .route("/{id}/attempts", get(quizzes_attempts_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// A quiz may only hang off a lesson of its own course.
async fn ensure_lesson_in_course(
    state: &AppState,
    user: &AuthenticatedUser,
    lesson_id: Option<Uuid>,
    course_id: Uuid,
) -> WebResult<()> {
    let Some(lesson_id) = lesson_id else {
        return Ok(());
    };
    let lesson = Lesson::find_by_id(state.pool(), user, lesson_id)
        .await
        .map_err(fetch_err::<Lesson>)?;
    match lesson {
        Some(lesson) if lesson.course_id() == course_id => Ok(()),
        _ => Err(bad_request::<Quiz>("lesson does not belong to this course")),
    }
}

async fn load_quiz(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Quiz> {
    let quiz = Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Quiz>)?;
    found_or_404(quiz)
}

#[utoipa::path(
    post,
    path = "/api/quizzes",
    request_body = QuizCreate,
    description = "Creates a quiz with its questions and options in one go",
    responses(
        (status = 201, description = "Quiz created", body = QuizView),
        (status = 400, description = "Malformed quiz or lesson from another course", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, payload.course_id).await?;
    ensure_owner(state.pool(), user, &course).await?;
    payload.validate().map_err(bad_request::<Quiz>)?;
    ensure_lesson_in_course(&state, user, payload.lesson_id, course.id()).await?;

    let quiz = Quiz::create(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Quiz>)?;
    let questions = quiz
        .questions(state.pool(), user)
        .await
        .map_err(fetch_err::<Quiz>)?;

    Ok((StatusCode::CREATED, Json(QuizView::new(&quiz, questions, true))))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/course/{id}",
    description = "Quizzes attached to a course",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Quizzes", body = Vec<Quiz>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_by_course_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_course_reader(state.pool(), user, &course).await?;

    let quizzes = Quiz::all_by_course(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Quiz>)?;

    Ok((StatusCode::OK, Json(quizzes)))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{id}",
    description = "Quiz with questions. Correct answers are shown to the course owner only",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Quiz found", body = QuizView),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = load_quiz(&state, user, id).await?;
    let course = load_course(state.pool(), user, quiz.course_id()).await?;
    ensure_course_reader(state.pool(), user, &course).await?;

    let questions = quiz
        .questions(state.pool(), user)
        .await
        .map_err(fetch_err::<Quiz>)?;
    let reveal = owns_course(user, &course);

    Ok((StatusCode::OK, Json(QuizView::new(&quiz, questions, reveal))))
}

#[utoipa::path(
    put,
    path = "/api/quizzes/{id}",
    request_body = QuizCreate,
    description = "Replaces the quiz title, threshold and the whole question set",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Quiz updated", body = QuizView),
        (status = 400, description = "Malformed quiz or lesson from another course", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = load_quiz(&state, user, id).await?;
    ensure_owner(state.pool(), user, &quiz).await?;
    payload.validate().map_err(bad_request::<Quiz>)?;
    ensure_lesson_in_course(&state, user, payload.lesson_id, quiz.course_id()).await?;

    let quiz = quiz
        .update(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Quiz>)?;
    let questions = quiz
        .questions(state.pool(), user)
        .await
        .map_err(fetch_err::<Quiz>)?;

    Ok((StatusCode::OK, Json(QuizView::new(&quiz, questions, true))))
}

#[utoipa::path(
    delete,
    path = "/api/quizzes/{id}",
    description = "Deletes a quiz with its questions and attempts",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Quiz deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = load_quiz(&state, user, id).await?;
    ensure_owner(state.pool(), user, &quiz).await?;

    quiz.delete(state.pool(), user)
        .await
        .map_err(fetch_err::<Quiz>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/quizzes/{id}/submit",
    request_body = QuizSubmitBody,
    description = "Scores the answers, records the attempt and awards points on the first pass",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Attempt scored", body = QuizResultResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_submit_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<QuizSubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = load_quiz(&state, user, id).await?;
    ensure_enrolled(state.pool(), user, quiz.course_id()).await?;

    let questions = quiz
        .questions(state.pool(), user)
        .await
        .map_err(fetch_err::<Quiz>)?;

    let score = score_answers(&questions, &payload.selections());
    let total = questions.len() as i32;
    let passed =
        progression::quiz_passed(i64::from(score), i64::from(total), quiz.pass_percentage());

    let mut tx = state.pool().begin().await.map_err(fetch_err::<QuizAttempt>)?;
    let attempt = QuizAttempt::record(
        &mut tx,
        QuizAttemptCreate {
            user_id: user.user_id(),
            quiz_id: quiz.id(),
            score,
            total,
            passed,
        },
    )
    .await
    .map_err(fetch_err::<QuizAttempt>)?;

    let points_awarded = if passed {
        PointsEntry::award(
            &mut tx,
            user.user_id(),
            state.config().points().quiz_passed(),
            PointsReason::QuizPassed,
            quiz.id(),
        )
        .await
        .map_err(fetch_err::<PointsEntry>)?
    } else {
        0
    };

    tx.commit()
        .await
        .map_err(|e| fetch_err::<QuizAttempt>(e.into()))?;

    tracing::debug!(
        "quiz {} attempt by {}: {}/{} passed={}",
        quiz.id(),
        user.user_id(),
        score,
        total,
        passed
    );

    Ok((
        StatusCode::OK,
        Json(QuizResultResponse::new(&attempt, points_awarded)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{id}/attempts",
    description = "The caller's attempts at a quiz, newest first",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Attempts", body = Vec<QuizAttempt>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_attempts_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = load_quiz(&state, user, id).await?;

    let attempts = QuizAttempt::all_for_quiz(state.pool(), user, quiz.id())
        .await
        .map_err(fetch_err::<QuizAttempt>)?;

    Ok((StatusCode::OK, Json(attempts)))
}
