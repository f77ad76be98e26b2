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
        entity::{CourseProgress, Lesson, LessonCreate, LessonWithStatusRow},
    },
    web::{
        AppState, RequestContext, WebResult,
        dto::lessons::{LessonCompletionResponse, LessonResponse},
        error::ErrorResponse,
        middlewares,
        routes::{
            bad_request, ensure_course_reader, ensure_enrolled, ensure_owner, fetch_err, found_as,
            found_or_404, load_course,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(lessons_create_handler))
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route("/{id}/complete", post(lessons_complete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn validate_lesson(data: &LessonCreate) -> WebResult<()> {
    if data.title.trim().is_empty() {
        return Err(bad_request::<Lesson>("lesson title must not be empty"));
    }
    if data.order_index.is_some_and(|i| i < 0) {
        return Err(bad_request::<Lesson>("order_index must not be negative"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/lessons",
    request_body = LessonCreate,
    description = "Adds a lesson to a course. Without `order_index` it goes last",
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, payload.course_id).await?;
    ensure_owner(state.pool(), user, &course).await?;
    validate_lesson(&payload)?;

    let lesson = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Lesson>)?;

    Ok((StatusCode::CREATED, Json(lesson)))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lesson_id}",
    description = "Fetch comprehensive info about lesson including its content",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = LessonWithStatusRow::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Lesson>)?;
    let lesson = found_as::<Lesson, _>(lesson)?;

    let course = load_course(state.pool(), user, lesson.course_id).await?;
    ensure_course_reader(state.pool(), user, &course).await?;

    Ok((StatusCode::OK, Json(LessonResponse::from(lesson))))
}

#[utoipa::path(
    put,
    path = "/api/lessons/{lesson_id}",
    request_body = LessonCreate,
    description = "Updates a lesson. The lesson stays in its course",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to update")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Lesson>)?;
    let lesson = found_or_404(lesson)?;
    ensure_owner(state.pool(), user, &lesson).await?;
    validate_lesson(&payload)?;

    let updated = lesson
        .update(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Lesson>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/lessons/{lesson_id}",
    description = "Deletes a lesson",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to delete")
    ),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Lesson>)?;
    let lesson = found_or_404(lesson)?;
    ensure_owner(state.pool(), user, &lesson).await?;

    lesson
        .delete(state.pool(), user)
        .await
        .map_err(fetch_err::<Lesson>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/lessons/{lesson_id}/complete",
    description = "Mark lesson as done, refresh course progress and award points",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to mark")
    ),
    responses(
        (status = 200, description = "Lesson marked", body = LessonCompletionResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_complete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Lesson>)?;
    let lesson = found_or_404(lesson)?;
    ensure_enrolled(state.pool(), user, lesson.course_id()).await?;

    let completion = CourseProgress::complete_lesson(
        state.pool(),
        user,
        lesson.course_id(),
        lesson.id(),
        state.config().points(),
    )
    .await
    .map_err(fetch_err::<CourseProgress>)?;

    if completion.newly_completed {
        tracing::debug!(
            "lesson {} completed by {}, course at {}%",
            lesson.id(),
            user.user_id(),
            completion.progress.percentage()
        );
    }

    Ok((
        StatusCode::OK,
        Json(LessonCompletionResponse::new(lesson.id(), &completion)),
    ))
}
