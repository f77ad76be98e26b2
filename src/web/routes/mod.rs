use crate::{
    model::{
        CrudRepository, DatabaseError, HasOwner, ModelManager, ResourceTyped, check_access,
        entity::{Course, Enrollment},
    },
    web::{AppState, AuthenticatedUser, WebError, WebResult, doc::ApiDoc},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub mod admin;
pub mod assignments;
pub mod auth;
pub mod certificates;
pub mod community;
pub mod courses;
pub mod learner;
pub mod lessons;
pub mod live_classes;
pub mod public;
pub mod quizzes;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page size, 1 to 100 (default 20)
    limit: Option<i64>,
    /// Items to skip (default 0)
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

pub fn build_app(state: AppState) -> Router {
    let config = state.config();

    let mut router = Router::new()
        .nest("/api/auth", auth::routes(state.clone()))
        .nest("/api/public", public::routes(state.clone()))
        .nest("/api/courses", courses::routes(state.clone()))
        .nest("/api/lessons", lessons::routes(state.clone()))
        .nest("/api/quizzes", quizzes::routes(state.clone()))
        .nest("/api/learner", learner::routes(state.clone()))
        .nest("/api/assignments", assignments::routes(state.clone()))
        .nest("/api/live-classes", live_classes::routes(state.clone()))
        .nest("/api/certificates", certificates::routes(state.clone()))
        .nest("/api/community", community::routes(state.clone()))
        .nest("/api/admin", admin::routes(state.clone()));

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi));
    }

    let static_dir = config.app().static_dir();
    let client = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    router
        .fallback_service(client)
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

// Handler helpers

/// Maps a model failure for resource `T`. Usable directly as `map_err(fetch_err::<T>)`.
pub(crate) fn fetch_err<T: ResourceTyped>(e: DatabaseError) -> WebError {
    WebError::from_database(T::get_resource_type(), e)
}

pub(crate) fn found_or_404<T: ResourceTyped>(value: Option<T>) -> WebResult<T> {
    value.ok_or_else(|| WebError::resource_not_found(T::get_resource_type()))
}

/// Like [`found_or_404`] for query rows that report as resource `R`.
pub(crate) fn found_as<R: ResourceTyped, T>(value: Option<T>) -> WebResult<T> {
    value.ok_or_else(|| WebError::resource_not_found(R::get_resource_type()))
}

pub(crate) fn bad_request<T: ResourceTyped>(reason: impl Into<String>) -> WebError {
    WebError::resource_bad_request(T::get_resource_type(), reason)
}

/// Only the owner (or an admin) may touch `resource`.
pub(crate) async fn ensure_owner<T>(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    resource: &T,
) -> WebResult<()>
where
    T: HasOwner<OwnerId = Uuid> + ResourceTyped + Sync,
{
    check_access(mm, user, resource, user.user_id())
        .await
        .map_err(fetch_err::<T>)
}

pub(crate) async fn load_course(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    course_id: Uuid,
) -> WebResult<Course> {
    let course = Course::find_by_id(mm, user, course_id)
        .await
        .map_err(fetch_err::<Course>)?;
    found_or_404(course)
}

/// Course content is visible to its owner, admins and enrolled learners.
pub(crate) async fn ensure_course_reader(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    course: &Course,
) -> WebResult<()> {
    if user.is_admin() || course.instructor_id() == user.user_id() {
        return Ok(());
    }
    ensure_enrolled(mm, user, course.id()).await
}

pub(crate) async fn ensure_enrolled(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    course_id: Uuid,
) -> WebResult<()> {
    let enrolled = Enrollment::exists(mm, user.user_id(), course_id)
        .await
        .map_err(fetch_err::<Enrollment>)?;
    if enrolled {
        Ok(())
    } else {
        Err(WebError::resource_forbidden(Course::get_resource_type()))
    }
}

/// Whether `user` owns the course (admins always do).
pub(crate) fn owns_course(user: &AuthenticatedUser, course: &Course) -> bool {
    user.is_admin() || course.instructor_id() == user.user_id()
}
