//! Service request endpoints

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use super::{current_user, json_body};
use crate::{
    error::{ApiError, ApiResult, internal},
    middleware::AuthUser,
    models::{
        ClientInfo, CreateServiceRequest, RequestStatus, ServiceRequest, ServiceRequestResponse,
        User,
    },
    state::AppState,
};

async fn client_info(state: &AppState, user: &User) -> ApiResult<ClientInfo> {
    let customer = state
        .customer_repository
        .find(user.id)
        .await
        .map_err(internal("Failed to load customer profile"))?;

    Ok(ClientInfo {
        nombre: user.display_name(),
        telefono: customer.map(|c| c.telefono).unwrap_or_default(),
        email: user.email.clone(),
    })
}

/// Fetch a request and check the caller owns it
async fn owned_request(state: &AppState, user: &User, id: i64) -> ApiResult<ServiceRequest> {
    let request = state
        .service_request_repository
        .find_by_id(id)
        .await
        .map_err(internal("Failed to load service request"))?
        .ok_or(ApiError::NotFound)?;

    if request.cliente != user.id {
        warn!(user_id = user.id, request_id = id, "Access to another customer's request");
        return Err(ApiError::Forbidden);
    }

    Ok(request)
}

/// Caller's requests, newest first
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &auth).await?;
    let info = client_info(&state, &user).await?;

    let requests = state
        .service_request_repository
        .list_for_customer(user.id)
        .await
        .map_err(internal("Failed to list service requests"))?;

    let body: Vec<ServiceRequestResponse> = requests
        .into_iter()
        .map(|request| ServiceRequestResponse::new(request, info.clone()))
        .collect();

    Ok(Json(body))
}

/// Submit a new request
pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<CreateServiceRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(payload)?;
    let user = current_user(&state, &auth).await?;

    let request = state.booking().create_service_request(&user, payload).await?;
    let info = client_info(&state, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(ServiceRequestResponse::new(request, info)),
    ))
}

/// A single request owned by the caller
pub async fn get_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &auth).await?;
    let request = owned_request(&state, &user, id).await?;
    let info = client_info(&state, &user).await?;

    Ok(Json(ServiceRequestResponse::new(request, info)))
}

/// Cancel a request that has not finished yet
pub async fn cancel_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &auth).await?;
    owned_request(&state, &user, id).await?;

    let request = state
        .service_request_repository
        .update_status(id, RequestStatus::Cancelled)
        .await?;
    info!(numero_orden = %request.numero_orden, "Service request cancelled by customer");

    let info = client_info(&state, &user).await?;
    Ok(Json(ServiceRequestResponse::new(request, info)))
}
