use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        Page,
        entity::{
            Certificate, Course, CourseSummaryRow, CertificateVerificationRow, LessonOutlineRow,
            PublicStats, ReviewRow,
        },
    },
    web::{
        AppState, WebResult,
        dto::courses::{CatalogQuery, CourseDetailResponse},
        error::ErrorResponse,
        routes::{PaginationQuery, fetch_err, found_as},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/courses", get(public_courses_handler))
        .route("/courses/{id}", get(public_course_detail_handler))
        .route("/certificates/{code}", get(public_certificate_handler))
        .route("/stats", get(public_stats_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/public/courses",
    description = "Published course catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Catalog page", body = Page<CourseSummaryRow>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "public"
)]
pub async fn public_courses_handler(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> WebResult<impl IntoResponse> {
    let page = PaginationQuery::new(query.limit, query.offset);
    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());

    let items = CourseSummaryRow::fetch_published(state.pool(), category, page.limit(), page.offset())
        .await
        .map_err(fetch_err::<Course>)?;
    let total = CourseSummaryRow::count_published(state.pool(), category)
        .await
        .map_err(fetch_err::<Course>)?;

    Ok((
        StatusCode::OK,
        Json(Page::new(items, total, page.limit(), page.offset())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/public/courses/{id}",
    description = "Published course with its lesson outline and reviews",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseDetailResponse),
        (status = 404, description = "Course not found or unpublished", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "public"
)]
pub async fn public_course_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let course = CourseSummaryRow::find_published(state.pool(), id)
        .await
        .map_err(fetch_err::<Course>)?;
    let course = found_as::<Course, _>(course)?;

    let lessons = LessonOutlineRow::all_by_course(state.pool(), id)
        .await
        .map_err(fetch_err::<Course>)?;
    let reviews = ReviewRow::all_by_course(state.pool(), id)
        .await
        .map_err(fetch_err::<Course>)?;

    Ok((
        StatusCode::OK,
        Json(CourseDetailResponse {
            course,
            lessons,
            reviews,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/public/certificates/{code}",
    description = "Verifies a certificate by its printed identifier",
    params(
        ("code" = String, Path, description = "Certificate identifier, e.g. CERT-20250101-1A2B3C4D")
    ),
    responses(
        (status = 200, description = "Certificate is genuine", body = CertificateVerificationRow),
        (status = 404, description = "No such certificate", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "public"
)]
pub async fn public_certificate_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> WebResult<impl IntoResponse> {
    let code = code.trim().to_uppercase();
    let found = CertificateVerificationRow::find_by_code(state.pool(), &code)
        .await
        .map_err(fetch_err::<Certificate>)?;
    let found = found_as::<Certificate, _>(found)?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/public/stats",
    description = "Platform counters for the landing page",
    responses(
        (status = 200, description = "Counters", body = PublicStats),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "public"
)]
pub async fn public_stats_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let stats = PublicStats::fetch(state.pool())
        .await
        .map_err(fetch_err::<Course>)?;

    Ok((StatusCode::OK, Json(stats)))
}
