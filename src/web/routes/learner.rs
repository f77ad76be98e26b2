use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        Page, ResourceTyped,
        entity::{
            Badge, Course, CourseProgress, EnrolledCourseRow, Enrollment, LeaderboardRow,
            PointsEntry,
        },
        progression::{BadgeProgress, BadgeTier},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::{learner::PointsSummaryResponse, lessons::ProgressResponse},
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, ensure_enrolled, fetch_err, load_course},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/enroll/{course_id}", post(learner_enroll_handler))
        .route("/enrollments", get(learner_enrollments_handler))
        .route("/progress/{course_id}", get(learner_progress_handler))
        .route("/points", get(learner_points_handler))
        .route("/points/history", get(learner_points_history_handler))
        .route("/leaderboard", get(learner_leaderboard_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/learner/enroll/{course_id}",
    description = "Enrolls the caller in a published course",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 400, description = "Already enrolled", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course not found or unpublished", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "learner"
)]
pub async fn learner_enroll_handler(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, course_id).await?;
    if !course.is_published() {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }

    let enrollment = Enrollment::enroll(state.pool(), user, course.id())
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::resource_bad_request(
                    Enrollment::get_resource_type(),
                    "already enrolled in this course",
                )
            } else {
                fetch_err::<Enrollment>(e)
            }
        })?;

    tracing::info!("{} enrolled in course {}", user.user_id(), course.id());
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/learner/enrollments",
    description = "Courses the caller is enrolled in, with progress",
    responses(
        (status = 200, description = "Enrollments", body = Vec<EnrolledCourseRow>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "learner"
)]
pub async fn learner_enrollments_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rows = EnrolledCourseRow::all_for(state.pool(), user)
        .await
        .map_err(fetch_err::<Enrollment>)?;

    Ok((StatusCode::OK, Json(rows)))
}

#[utoipa::path(
    get,
    path = "/api/learner/progress/{course_id}",
    description = "The caller's progress in a course",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Progress", body = ProgressResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "learner"
)]
pub async fn learner_progress_handler(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    ensure_enrolled(state.pool(), user, course_id).await?;

    let progress = CourseProgress::find(state.pool(), user, course_id)
        .await
        .map_err(fetch_err::<CourseProgress>)?;
    let response = progress
        .as_ref()
        .map(ProgressResponse::from)
        .unwrap_or_else(|| ProgressResponse::not_started(course_id));

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/learner/points",
    description = "Total points and progress toward the next badge",
    responses(
        (status = 200, description = "Points summary", body = PointsSummaryResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "learner"
)]
pub async fn learner_points_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let total = PointsEntry::total_for(state.pool(), user.user_id())
        .await
        .map_err(fetch_err::<PointsEntry>)?;
    let tiers: Vec<BadgeTier> = Badge::all(state.pool(), user)
        .await
        .map_err(fetch_err::<Badge>)?
        .iter()
        .map(Badge::tier)
        .collect();

    Ok((
        StatusCode::OK,
        Json(PointsSummaryResponse {
            total,
            badges: BadgeProgress::compute(total, &tiers),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/learner/points/history",
    description = "Points log of the caller, newest first",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Points log page", body = Page<PointsEntry>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "learner"
)]
pub async fn learner_points_history_handler(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let items = PointsEntry::history(state.pool(), user.user_id(), page.limit(), page.offset())
        .await
        .map_err(fetch_err::<PointsEntry>)?;
    let total = PointsEntry::count_for(state.pool(), user.user_id())
        .await
        .map_err(fetch_err::<PointsEntry>)?;

    Ok((
        StatusCode::OK,
        Json(Page::new(items, total, page.limit(), page.offset())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/learner/leaderboard",
    description = "Learners with the most points",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Leaderboard", body = Vec<LeaderboardRow>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "learner"
)]
pub async fn learner_leaderboard_handler(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    let rows = LeaderboardRow::top(state.pool(), page.limit())
        .await
        .map_err(fetch_err::<PointsEntry>)?;

    Ok((StatusCode::OK, Json(rows)))
}
