//! Login, registration and token lifecycle

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::json_body;
use crate::{
    error::{ApiError, ApiResult, internal},
    jwt::{TokenPair, TokenType},
    models::{CustomerResponse, UserResponse},
    repositories::is_unique_violation,
    state::AppState,
    validation::{FieldErrors, REQUIRED, RegisterRequest, validate_registration},
};

const DUPLICATE_USERNAME: &str = "Ya existe un usuario con este nombre.";

/// Request for user login
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request carrying a refresh token
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: Option<String>,
}

/// Tokens plus the account they were issued for
#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserResponse,
    pub cliente: CustomerResponse,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(payload)?;
    let (Some(username), Some(password)) =
        (non_blank(payload.username), non_blank(payload.password))
    else {
        return Err(ApiError::BadRequest(
            "Username y password son requeridos".to_string(),
        ));
    };
    // usernames are stored trimmed
    let username = username.trim();

    info!("Login attempt for user: {}", username);

    let user = state
        .user_repository
        .authenticate(username, &password)
        .await
        .map_err(internal("Failed to authenticate user"))?
        .ok_or_else(|| {
            warn!("Failed login for user: {}", username);
            ApiError::InvalidCredentials
        })?;

    let customer = state
        .customer_repository
        .get_or_create(user.id)
        .await
        .map_err(internal("Failed to load customer profile"))?;

    let tokens = state
        .jwt_service
        .issue_pair(&user)
        .map_err(internal("Failed to issue tokens"))?;

    Ok(Json(SessionResponse {
        tokens,
        user: UserResponse::from(&user),
        cliente: CustomerResponse::new(&user, &customer),
    }))
}

/// Account registration endpoint
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let (new_user, telefono) = validate_registration(json_body(payload)?)?;

    let taken = state
        .user_repository
        .username_exists(&new_user.username)
        .await
        .map_err(internal("Failed to check username"))?;
    if taken {
        let mut errors = FieldErrors::default();
        errors.add("username", DUPLICATE_USERNAME);
        return Err(errors.into());
    }

    let (user, customer) = match state
        .user_repository
        .create_with_customer(&new_user, &telefono)
        .await
    {
        Ok(created) => created,
        // lost a race for the same username
        Err(e) if is_unique_violation(&e) => {
            let mut errors = FieldErrors::default();
            errors.add("username", DUPLICATE_USERNAME);
            return Err(errors.into());
        }
        Err(e) => return Err(internal("Failed to register user")(e)),
    };

    info!(user_id = user.id, "Registered user {}", user.username);

    let tokens = state
        .jwt_service
        .issue_pair(&user)
        .map_err(internal("Failed to issue tokens"))?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            tokens,
            user: UserResponse::from(&user),
            cliente: CustomerResponse::new(&user, &customer),
        }),
    ))
}

/// Refresh token endpoint; the presented token is revoked and replaced
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let refresh = non_blank(json_body(payload)?.refresh).ok_or_else(|| {
        let mut errors = FieldErrors::default();
        errors.add("refresh", REQUIRED);
        ApiError::from(errors)
    })?;

    let claims = state
        .jwt_service
        .validate_typed(&refresh, TokenType::Refresh)
        .map_err(|_| ApiError::Unauthorized)?;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(internal("Failed to load user"))?
        .ok_or(ApiError::Unauthorized)?;

    let tokens = state
        .jwt_service
        .rotate_refresh_token(&state.redis_pool, &user, &claims)
        .await
        .map_err(internal("Failed to rotate refresh token"))?
        .ok_or_else(|| {
            warn!(user_id = claims.sub, "Revoked refresh token presented");
            ApiError::Unauthorized
        })?;

    Ok(Json(tokens))
}

/// Logout endpoint
///
/// Revokes the refresh token in the body and, when present, the access
/// token in the `Authorization` header.
pub async fn logout(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let refresh = non_blank(json_body(payload)?.refresh).ok_or(ApiError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_typed(&refresh, TokenType::Refresh)
        .map_err(|_| ApiError::Unauthorized)?;

    state
        .jwt_service
        .blacklist_token(&state.redis_pool, &claims)
        .await
        .map_err(internal("Failed to blacklist refresh token"))?;

    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        if let Ok(access) = state
            .jwt_service
            .validate_typed(bearer.token(), TokenType::Access)
        {
            if access.sub == claims.sub {
                state
                    .jwt_service
                    .blacklist_token(&state.redis_pool, &access)
                    .await
                    .map_err(internal("Failed to blacklist access token"))?;
            }
        }
    }

    info!(user_id = claims.sub, "User logged out");

    Ok(Json(serde_json::json!({ "message": "Sesión cerrada" })))
}
