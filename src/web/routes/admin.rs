use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, Page, PaginatableRepository,
        entity::{AdminStats, Badge, BadgeCreate, Course, UserEntity},
    },
    web::{
        AppState, RequestContext, UserRole, WebResult,
        dto::admin::RoleBody,
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, bad_request, fetch_err, found_or_404},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/users", get(admin_users_handler))
        .route("/users/{id}", delete(admin_user_delete_handler))
        .route("/users/{id}/role", put(admin_user_role_handler))
        .route("/courses", get(admin_courses_handler))
        .route("/stats", get(admin_stats_handler))
        .route(
            "/badges",
            get(admin_badges_handler).post(admin_badge_create_handler),
        )
        .route(
            "/badges/{id}",
            put(admin_badge_update_handler).delete(admin_badge_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn validate_badge(data: &BadgeCreate) -> WebResult<()> {
    if data.name.trim().is_empty() {
        return Err(bad_request::<Badge>("badge name must not be empty"));
    }
    if data.min_points < 0 {
        return Err(bad_request::<Badge>("min_points must not be negative"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    description = "Every account, paginated",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Users page", body = Page<UserEntity>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_users_handler(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let users = UserEntity::page(state.pool(), admin, page.limit(), page.offset())
        .await
        .map_err(fetch_err::<UserEntity>)?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    request_body = RoleBody,
    description = "Changes the role of an account",
    params(
        ("id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Role changed", body = UserEntity),
        (status = 400, description = "Unknown role", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_user_role_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<RoleBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let role: UserRole = payload.role.parse().map_err(bad_request::<UserEntity>)?;

    let found = UserEntity::find_by_id(state.pool(), admin, id)
        .await
        .map_err(fetch_err::<UserEntity>)?;
    let found = found_or_404(found)?;

    let updated = found
        .set_role(state.pool(), admin, role)
        .await
        .map_err(fetch_err::<UserEntity>)?;

    tracing::info!("user {} is now {}", updated.username(), role);
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    description = "Deletes an account with everything it owns",
    params(
        ("id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_user_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let found = UserEntity::find_by_id(state.pool(), admin, id)
        .await
        .map_err(fetch_err::<UserEntity>)?;
    let found = found_or_404(found)?;

    found
        .delete(state.pool(), admin)
        .await
        .map_err(fetch_err::<UserEntity>)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/admin/courses",
    description = "Every course, published or not, paginated",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Courses page", body = Page<Course>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_courses_handler(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let courses = Course::page(state.pool(), admin, page.limit(), page.offset())
        .await
        .map_err(fetch_err::<Course>)?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    description = "Platform-wide counters",
    responses(
        (status = 200, description = "Statistics", body = AdminStats),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_stats_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    ctx.admin_user()?;
    let stats = AdminStats::fetch(state.pool())
        .await
        .map_err(fetch_err::<Course>)?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/admin/badges",
    description = "Badge tiers by ascending threshold",
    responses(
        (status = 200, description = "Badges", body = Vec<Badge>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_badges_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let badges = Badge::all(state.pool(), admin)
        .await
        .map_err(fetch_err::<Badge>)?;

    Ok((StatusCode::OK, Json(badges)))
}

#[utoipa::path(
    post,
    path = "/api/admin/badges",
    request_body = BadgeCreate,
    description = "Adds a badge tier",
    responses(
        (status = 201, description = "Badge created", body = Badge),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 409, description = "Name or threshold already used", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_badge_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<BadgeCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_badge(&payload)?;

    let badge = Badge::create(state.pool(), admin, payload)
        .await
        .map_err(fetch_err::<Badge>)?;

    Ok((StatusCode::CREATED, Json(badge)))
}

#[utoipa::path(
    put,
    path = "/api/admin/badges/{id}",
    request_body = BadgeCreate,
    description = "Updates a badge tier",
    params(
        ("id" = Uuid, Path, description = "ID of the badge")
    ),
    responses(
        (status = 200, description = "Badge updated", body = Badge),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Badge not found", body = ErrorResponse),
        (status = 409, description = "Name or threshold already used", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_badge_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<BadgeCreate>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    validate_badge(&payload)?;

    let found = Badge::find_by_id(state.pool(), admin, id)
        .await
        .map_err(fetch_err::<Badge>)?;
    let found = found_or_404(found)?;

    let updated = found
        .update(state.pool(), admin, payload)
        .await
        .map_err(fetch_err::<Badge>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/badges/{id}",
    description = "Removes a badge tier",
    params(
        ("id" = Uuid, Path, description = "ID of the badge")
    ),
    responses(
        (status = 200, description = "Badge deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Badge not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
pub async fn admin_badge_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let found = Badge::find_by_id(state.pool(), admin, id)
        .await
        .map_err(fetch_err::<Badge>)?;
    let found = found_or_404(found)?;

    found
        .delete(state.pool(), admin)
        .await
        .map_err(fetch_err::<Badge>)?;

    Ok(StatusCode::OK)
}
