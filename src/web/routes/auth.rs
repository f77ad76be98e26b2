use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    auth::{self, hash_password, verify_password},
    model::{
        CrudRepository,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::auth::{SigninBody, SignupBody, UserUpdateBody},
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
        routes::{bad_request, ensure_owner, fetch_err, found_or_404},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(auth_me_handler))
        .route("/{id}", put(auth_update_handler).delete(auth_delete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(auth_signup_handler))
        .route("/signin", post(auth_signin_handler))
        .route("/signout", post(auth_signout_handler))
        .merge(protected)
        .with_state(state)
}

fn set_session_cookie(cookies: &Cookies, state: &AppState, user_id: Uuid) -> WebResult<()> {
    let token = auth::issue_token(user_id, state.config().app().jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupBody,
    description = "Creates a learner or instructor account and signs it in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid payload or admin role requested", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn auth_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignupBody>,
) -> WebResult<impl IntoResponse> {
    let role = payload
        .requested_role()
        .map_err(WebError::registration_role_refused)?;
    payload.validate().map_err(bad_request::<UserEntity>)?;

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_conflicting(
        state.pool(),
        &admin,
        payload.username.trim(),
        payload.email.trim(),
        None,
    )
    .await
    .map_err(fetch_err::<UserEntity>)?;

    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let data = UserEntityCreateUpdate {
        username: payload.username.trim().to_string(),
        email: payload.email.trim().to_string(),
        full_name: payload.full_name.trim().to_string(),
        password_hash: hash,
        role: role.to_string(),
    };

    let created = UserEntity::create(state.pool(), &admin, data)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                fetch_err::<UserEntity>(e)
            }
        })?;

    tracing::info!("new {} account: {}", role, created.username());
    set_session_cookie(&cookies, &state, created.id())?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    description = "Authorizes user in the system by username or email",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth",
)]
pub async fn auth_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_login(state.pool(), &admin, payload.username.trim())
        .await
        .map_err(fetch_err::<UserEntity>)?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    let is_verified = verify_password(found.hash(), &payload.password)
        .map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    set_session_cookie(&cookies, &state, found.id())?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    description = "Drops the session cookie",
    responses(
        (status = 200, description = "Signed out"),
    ),
    tag = "auth",
)]
pub async fn auth_signout_handler(cookies: Cookies) -> impl IntoResponse {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    description = "Currently signed in user",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    tag = "auth",
    security(
        ("cookie" = [])
    )
)]
pub async fn auth_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let me = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(fetch_err::<UserEntity>)?
        .ok_or_else(WebError::auth_required)?;

    Ok((StatusCode::OK, Json(me)))
}

#[utoipa::path(
    put,
    path = "/api/auth/{id}",
    request_body = UserUpdateBody,
    params(
        ("id" = Uuid, Path, description = "ID of the user to update")
    ),
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't have enough permissions to do this", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth",
    security(
        ("cookie" = [])
    )
)]
pub async fn auth_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<UserEntity>)?;
    let found = found_or_404(found)?;
    ensure_owner(state.pool(), user, &found).await?;

    payload.validate().map_err(bad_request::<UserEntity>)?;

    let conflict = UserEntity::find_conflicting(
        state.pool(),
        user,
        payload.username.trim(),
        payload.email.trim(),
        Some(found.id()),
    )
    .await
    .map_err(fetch_err::<UserEntity>)?;

    if conflict.is_some() {
        return Err(WebError::registration_conflict());
    }

    let data = UserEntityCreateUpdate {
        username: payload.username.trim().to_string(),
        email: payload.email.trim().to_string(),
        full_name: payload.full_name.trim().to_string(),
        password_hash: String::new(), // not in use
        role: found.role().to_string(),
    };

    let updated = found
        .update(state.pool(), user, data)
        .await
        .map_err(fetch_err::<UserEntity>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/auth/{id}",
    description = "Deletes specified user",
    params(
        ("id" = Uuid, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth",
    security(
        ("cookie" = [])
    )
)]
pub async fn auth_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(fetch_err::<UserEntity>)?;
    let found = found_or_404(found)?;
    ensure_owner(state.pool(), user, &found).await?;

    let own_account = found.id() == user.user_id();
    found
        .delete(state.pool(), user)
        .await
        .map_err(fetch_err::<UserEntity>)?;

    if own_account {
        let mut cookie = Cookie::from(AUTH_TOKEN);
        cookie.set_path("/");
        cookies.remove(cookie);
    }

    Ok(StatusCode::OK)
}
