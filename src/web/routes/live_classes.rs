use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository,
        entity::{LiveSession, LiveSessionCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{
            bad_request, ensure_course_reader, ensure_owner, fetch_err, found_or_404, load_course,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(live_create_handler))
        .route("/upcoming", get(live_upcoming_handler))
        .route("/course/{id}", get(live_by_course_handler))
        .route("/{id}", put(live_update_handler).delete(live_delete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn load_session(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<LiveSession> {
    let session = LiveSession::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<LiveSession>)?;
    found_or_404(session)
}

#[utoipa::path(
    post,
    path = "/api/live-classes",
    request_body = LiveSessionCreate,
    description = "Schedules a live class for a course",
    responses(
        (status = 201, description = "Session scheduled", body = LiveSession),
        (status = 400, description = "Start in the past or bad duration", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "live-classes"
)]
pub async fn live_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LiveSessionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, payload.course_id).await?;
    ensure_owner(state.pool(), user, &course).await?;
    payload
        .validate(Utc::now())
        .map_err(bad_request::<LiveSession>)?;

    let session = LiveSession::create(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<LiveSession>)?;

    tracing::info!("live class {} scheduled for {}", session.id(), session.starts_at());
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/live-classes/upcoming",
    description = "Sessions that have not ended yet in courses the caller teaches or attends",
    responses(
        (status = 200, description = "Sessions", body = Vec<LiveSession>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "live-classes"
)]
pub async fn live_upcoming_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let sessions = LiveSession::upcoming_for(state.pool(), user)
        .await
        .map_err(fetch_err::<LiveSession>)?;

    Ok((StatusCode::OK, Json(sessions)))
}

#[utoipa::path(
    get,
    path = "/api/live-classes/course/{id}",
    description = "Every session of a course",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Sessions", body = Vec<LiveSession>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "live-classes"
)]
pub async fn live_by_course_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_course_reader(state.pool(), user, &course).await?;

    let sessions = LiveSession::all_by_course(state.pool(), user, id)
        .await
        .map_err(fetch_err::<LiveSession>)?;

    Ok((StatusCode::OK, Json(sessions)))
}

#[utoipa::path(
    put,
    path = "/api/live-classes/{id}",
    request_body = LiveSessionCreate,
    description = "Reschedules a session",
    params(
        ("id" = Uuid, Path, description = "ID of the session")
    ),
    responses(
        (status = 200, description = "Session updated", body = LiveSession),
        (status = 400, description = "Start in the past or bad duration", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "live-classes"
)]
pub async fn live_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LiveSessionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = load_session(&state, user, id).await?;
    ensure_owner(state.pool(), user, &session).await?;
    payload
        .validate(Utc::now())
        .map_err(bad_request::<LiveSession>)?;

    let updated = session
        .update(state.pool(), user, payload)
        .await
        .map_err(fetch_err::<LiveSession>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/live-classes/{id}",
    description = "Cancels a session",
    params(
        ("id" = Uuid, Path, description = "ID of the session")
    ),
    responses(
        (status = 200, description = "Session cancelled"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "live-classes"
)]
pub async fn live_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = load_session(&state, user, id).await?;
    ensure_owner(state.pool(), user, &session).await?;

    session
        .delete(state.pool(), user)
        .await
        .map_err(fetch_err::<LiveSession>)?;

    Ok(StatusCode::OK)
}
