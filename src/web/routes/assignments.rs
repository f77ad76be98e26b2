use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository,
        entity::{Assignment, AssignmentCreate, Submission, SubmissionRow},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebResult,
        dto::assignments::{GradeBody, SubmissionBody},
        error::ErrorResponse,
        middlewares,
        routes::{
            bad_request, ensure_course_reader, ensure_enrolled, ensure_owner, fetch_err,
            found_or_404, load_course,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(assignments_create_handler))
        .route("/course/{id}", get(assignments_by_course_handler))
        .route(
            "/{id}",
            put(assignments_update_handler).delete(assignments_delete_handler),
        )
        .route("/{id}/submit", post(assignments_submit_handler))
        .route("/{id}/submissions", get(assignments_submissions_handler))
        .route("/submissions/{id}/grade", put(assignments_grade_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn validate_assignment(data: &AssignmentCreate) -> WebResult<()> {
    if data.title.trim().is_empty() {
        return Err(bad_request::<Assignment>("assignment title must not be empty"));
    }
    if data.max_score.is_some_and(|s| s <= 0) {
        return Err(bad_request::<Assignment>("max_score must be positive"));
    }
    Ok(())
}

async fn load_assignment(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Assignment> {
    let assignment = Assignment::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Assignment>)?;
    found_or_404(assignment)
}

#[utoipa::path(
    post,
    path = "/api/assignments",
    request_body = AssignmentCreate,
    description = "Creates an assignment in a course",
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assignments"
)]
pub async fn assignments_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<AssignmentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, payload.course_id).await?;
    ensure_owner(state.pool(), user, &course).await?;
    validate_assignment(&payload)?;

    let assignment = Assignment::create(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Assignment>)?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    get,
    path = "/api/assignments/course/{id}",
    description = "Assignments of a course, earliest deadline first",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Assignments", body = Vec<Assignment>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assignments"
)]
pub async fn assignments_by_course_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_course_reader(state.pool(), user, &course).await?;

    let assignments = Assignment::all_by_course(state.pool(), user, id)
        .await
        .map_err(fetch_err::<Assignment>)?;

    Ok((StatusCode::OK, Json(assignments)))
}

#[utoipa::path(
    put,
    path = "/api/assignments/{id}",
    request_body = AssignmentCreate,
    description = "Updates an assignment. It stays in its course",
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Assignment updated", body = Assignment),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assignments"
)]
pub async fn assignments_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<AssignmentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let assignment = load_assignment(&state, user, id).await?;
    ensure_owner(state.pool(), user, &assignment).await?;
    validate_assignment(&payload)?;

    let updated = assignment
        .update(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<Assignment>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/assignments/{id}",
    description = "Deletes an assignment with its submissions",
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Assignment deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assignments"
)]
pub async fn assignments_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let assignment = load_assignment(&state, user, id).await?;
    ensure_owner(state.pool(), user, &assignment).await?;

    assignment
        .delete(state.pool(), user)
        .await
        .map_err(fetch_err::<Assignment>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/assignments/{id}/submit",
    request_body = SubmissionBody,
    description = "Submits work. Resubmitting replaces the previous text until it is graded",
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Submission stored", body = Submission),
        (status = 400, description = "Empty content or already graded", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assignments"
)]
pub async fn assignments_submit_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<SubmissionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let assignment = load_assignment(&state, user, id).await?;
    ensure_enrolled(state.pool(), user, assignment.course_id()).await?;

    let content = payload.content.trim();
    if content.is_empty() {
        return Err(bad_request::<Submission>("submission must not be empty"));
    }

    let submission = Submission::submit(state.pool(), user, assignment.id(), content)
        .await
        .map_err(fetch_err::<Submission>)?
        .ok_or_else(|| bad_request::<Submission>("submission is already graded"))?;

    Ok((StatusCode::OK, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/api/assignments/{id}/submissions",
    description = "Every submission to an assignment",
    params(
        ("id" = Uuid, Path, description = "ID of the assignment")
    ),
    responses(
        (status = 200, description = "Submissions", body = Vec<SubmissionRow>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assignments"
)]
pub async fn assignments_submissions_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let assignment = load_assignment(&state, user, id).await?;
    ensure_owner(state.pool(), user, &assignment).await?;

    let rows = SubmissionRow::all_by_assignment(state.pool(), assignment.id())
        .await
        .map_err(fetch_err::<Submission>)?;

    Ok((StatusCode::OK, Json(rows)))
}

#[utoipa::path(
    put,
    path = "/api/assignments/submissions/{id}/grade",
    request_body = GradeBody,
    description = "Grades a submission within `0..=max_score`",
    params(
        ("id" = Uuid, Path, description = "ID of the submission")
    ),
    responses(
        (status = 200, description = "Submission graded", body = Submission),
        (status = 400, description = "Grade out of range", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assignments"
)]
pub async fn assignments_grade_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<GradeBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let submission = Submission::find_by_id(state.pool(), id)
        .await
        .map_err(fetch_err::<Submission>)?;
    let submission = found_or_404(submission)?;

    let assignment = load_assignment(&state, user, submission.assignment_id()).await?;
    ensure_owner(state.pool(), user, &assignment).await?;
    payload
        .validate(assignment.max_score())
        .map_err(bad_request::<Submission>)?;

    let feedback = payload
        .feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());
    let graded = submission
        .grade_with(state.pool(), user, payload.grade, feedback)
        .await
        .map_err(fetch_err::<Submission>)?;

    Ok((StatusCode::OK, Json(graded)))
}
