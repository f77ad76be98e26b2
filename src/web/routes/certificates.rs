use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{
    certificate::{self, CertificateContent},
    model::{
        CrudRepository, ResourceTyped,
        entity::{Certificate, CertificateCreate, CertificateRow, CourseProgress, UserEntity},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{bad_request, ensure_enrolled, ensure_owner, fetch_err, found_or_404, load_course},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(certificates_list_handler))
        .route("/{id}", post(certificates_generate_handler))
        .route("/{id}/download", get(certificates_download_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/certificates/{id}",
    description = "Issues the certificate for a completed course. Repeating the call returns the same certificate",
    params(
        ("id" = Uuid, Path, description = "ID of the completed course")
    ),
    responses(
        (status = 200, description = "Certificate already issued", body = Certificate),
        (status = 201, description = "Certificate issued", body = Certificate),
        (status = 400, description = "Course not completed yet", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "certificates"
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn certificates_generate_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(state.pool(), user, id).await?;
    ensure_enrolled(state.pool(), user, course.id()).await?;

    let existing = Certificate::find_for(state.pool(), user.user_id(), course.id())
        .await
        .map_err(fetch_err::<Certificate>)?;
    if let Some(found) = existing {
        return Ok((StatusCode::OK, Json(found)));
    }

    let completed = CourseProgress::find(state.pool(), user, course.id())
        .await
        .map_err(fetch_err::<CourseProgress>)?
        .is_some_and(|p| p.is_completed());
    if !completed {
        return Err(bad_request::<Certificate>(
            "course must be completed before a certificate is issued",
        ));
    }

    let learner = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(fetch_err::<UserEntity>)?;
    let learner = found_or_404(learner)?;

    let issued_at = Utc::now();
    let code = certificate::generate_code(issued_at);
    let content = CertificateContent {
        learner_name: learner.display_name(),
        course_title: course.title(),
        issued_at,
        code: &code,
    };

    let config = state.config();
    let template = certificate::load_template(config.app().certificate_template()).await;
    let bytes = certificate::render(&content, template);
    let path = certificate::write_pdf(config.app().certificates_dir(), &code, &bytes)
        .await
        .map_err(WebError::server_certificate_error)?;

    let inserted = Certificate::insert_if_absent(
        state.pool(),
        CertificateCreate {
            user_id: user.user_id(),
            course_id: course.id(),
            certificate_code: code.clone(),
            file_path: path.to_string_lossy().into_owned(),
            issued_at,
        },
    )
    .await
    .map_err(fetch_err::<Certificate>)?;

    match inserted {
        Some(created) => {
            tracing::info!("certificate {} issued to {}", code, user.user_id());
            Ok((StatusCode::CREATED, Json(created)))
        }
        None => {
            // A concurrent request issued it first.
            certificate::discard(&path).await;
            let found = Certificate::find_for(state.pool(), user.user_id(), course.id())
                .await
                .map_err(fetch_err::<Certificate>)?;
            Ok((StatusCode::OK, Json(found_or_404(found)?)))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/certificates",
    description = "Certificates earned by the caller",
    responses(
        (status = 200, description = "Certificates", body = Vec<CertificateRow>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "certificates"
)]
pub async fn certificates_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rows = CertificateRow::all_for(state.pool(), user)
        .await
        .map_err(fetch_err::<Certificate>)?;

    Ok((StatusCode::OK, Json(rows)))
}

#[utoipa::path(
    get,
    path = "/api/certificates/{id}/download",
    description = "PDF file of a certificate",
    params(
        ("id" = Uuid, Path, description = "ID of the certificate")
    ),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Not your certificate", body = ErrorResponse),
        (status = 404, description = "Certificate not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "certificates"
)]
pub async fn certificates_download_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = Certificate::find_by_id(state.pool(), id)
        .await
        .map_err(fetch_err::<Certificate>)?;
    let found = found_or_404(found)?;
    ensure_owner(state.pool(), user, &found).await?;

    let file = tokio::fs::File::open(found.file_path())
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                tracing::warn!("certificate file {} is missing", found.file_path());
                WebError::resource_not_found(Certificate::get_resource_type())
            }
            _ => WebError::server_io_error(e),
        })?;

    let disposition = format!(
        "attachment; filename=\"{}.pdf\"",
        found.certificate_code()
    );
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
