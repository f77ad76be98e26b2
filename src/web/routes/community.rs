use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};

use crate::{
    model::entity::{ChatMessage, MAX_MESSAGE_CHARS, normalize_message},
    web::{
        AppState, RequestContext, WebResult,
        dto::community::{MessageBody, MessagesQuery},
        error::ErrorResponse,
        middlewares,
        routes::{bad_request, fetch_err},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/messages",
            get(community_messages_handler).post(community_post_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/community/messages",
    description = "Chat messages after `after_id`, oldest first. Without `after_id`, the most recent ones",
    params(MessagesQuery),
    responses(
        (status = 200, description = "Messages", body = Vec<ChatMessage>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "community"
)]
pub async fn community_messages_handler(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    let messages = ChatMessage::after(state.pool(), query.after_id, query.limit())
        .await
        .map_err(fetch_err::<ChatMessage>)?;

    Ok((StatusCode::OK, Json(messages)))
}

#[utoipa::path(
    post,
    path = "/api/community/messages",
    request_body = MessageBody,
    description = "Posts a chat message",
    responses(
        (status = 201, description = "Message posted", body = ChatMessage),
        (status = 400, description = "Empty or too long", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "community"
)]
pub async fn community_post_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<MessageBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let content = normalize_message(&payload.content).ok_or_else(|| {
        bad_request::<ChatMessage>(format!(
            "message must be 1 to {} characters",
            MAX_MESSAGE_CHARS
        ))
    })?;

    let message = ChatMessage::post(state.pool(), user, content)
        .await
        .map_err(fetch_err::<ChatMessage>)?;

    Ok((StatusCode::CREATED, Json(message)))
}
