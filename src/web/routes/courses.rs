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
            Course, CourseCreate, CourseStudentRow, Enrollment, Lesson, LessonWithStatusRow,
            Review, ReviewCreate, ReviewRow,
        },
    },
    web::{
        AppState, RequestContext, WebResult,
        dto::lessons::LessonResponse,
        error::ErrorResponse,
        middlewares,
        routes::{
            bad_request, ensure_course_reader, ensure_enrolled, ensure_owner, fetch_err,
            load_course,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(courses_create_handler))
        .route("/mine", get(courses_mine_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route("/{id}/lessons", get(courses_lessons_handler))
        .route("/{id}/students", get(courses_students_handler))
        .route(
            "/{id}/reviews",
            get(courses_reviews_handler).post(courses_review_create_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn validate_course(data: &CourseCreate) -> WebResult<()> {
    if data.title.trim().is_empty() {
        return Err(bad_request::<Course>("course title must not be empty"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CourseCreate,
    description = "Creates a course owned by the caller",
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only instructors and admins create courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.teaching_user()?;
    validate_course(&payload)?;

    let course = Course::create(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Course>)?;

    tracing::info!("course {} created by {}", course.id(), user.user_id());
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses/mine",
    description = "Courses taught by the caller",
    responses(
        (status = 200, description = "Courses", body = Vec<Course>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only instructors and admins teach courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_mine_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.teaching_user()?;
    let courses = Course::all_by_instructor(state.pool(), user, user.user_id())
        .await
        .map_err(fetch_err::<Course>)?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    description = "Course as seen by its owner or an enrolled learner",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_course_reader(state.pool(), user, &course).await?;

    Ok((StatusCode::OK, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    request_body = CourseCreate,
    description = "Updates course fields, including publication",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_owner(state.pool(), user, &course).await?;
    validate_course(&payload)?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Course>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    description = "Deletes a course with all of its content",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_owner(state.pool(), user, &course).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(fetch_err::<Course>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/lessons",
    description = "Lessons in order, flagged with the caller's completion",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Lessons", body = Vec<LessonResponse>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_lessons_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_course_reader(state.pool(), user, &course).await?;

    let lessons: Vec<LessonResponse> = LessonWithStatusRow::all_by_course(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Lesson>)?
        .into_iter()
        .map(LessonResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/students",
    description = "Enrolled learners with their progress",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Students", body = Vec<CourseStudentRow>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_students_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_owner(state.pool(), user, &course).await?;

    let students = CourseStudentRow::all_by_course(state.pool(), id)
        .await
        .map_err(fetch_err::<Enrollment>)?;

    Ok((StatusCode::OK, Json(students)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/reviews",
    description = "Reviews of a course, newest first",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Reviews", body = Vec<ReviewRow>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub async fn courses_reviews_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let reviews = ReviewRow::all_by_course(state.pool(), id)
        .await
        .map_err(fetch_err::<Review>)?;

    Ok((StatusCode::OK, Json(reviews)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/reviews",
    request_body = ReviewCreate,
    description = "Reviews a course the caller is enrolled in, once",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 201, description = "Review stored", body = Review),
        (status = 400, description = "Rating outside 1..=5", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course already reviewed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn courses_review_create_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<ReviewCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !payload.is_valid_rating() {
        return Err(bad_request::<Review>("rating must be between 1 and 5"));
    }

    let course = load_course(state.pool(), user, id).await?;
    ensure_enrolled(state.pool(), user, course.id()).await?;

    let review = Review::create(state.pool(), user, course.id(), payload)
        .await
        .map_err(fetch_err::<Review>)?;

    Ok((StatusCode::CREATED, Json(review)))
}
