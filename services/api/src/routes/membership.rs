use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::current_user;
use crate::{
    error::{ApiResult, internal},
    middleware::AuthUser,
    models::{CustomerResponse, MembershipResponse, TariffResponse},
    pricing::resolve_tariff,
    state::AppState,
};

/// Caller's active membership, or a marker saying there is none
pub async fn get_membership(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Response> {
    let active = state
        .membership_repository
        .find_active(auth.id)
        .await
        .map_err(internal("Failed to load membership"))?;

    let Some(active) = active else {
        return Ok(Json(json!({
            "message": "No tienes membresía activa",
            "tiene_membresia": false
        }))
        .into_response());
    };

    let user = current_user(&state, &auth).await?;
    let customer = state
        .customer_repository
        .get_or_create(user.id)
        .await
        .map_err(internal("Failed to load customer profile"))?;

    let body = MembershipResponse::new(&active, CustomerResponse::new(&user, &customer));
    Ok(Json(body).into_response())
}

/// Fares that would apply to the caller's next request
pub async fn get_tariffs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let active = state
        .membership_repository
        .find_active(auth.id)
        .await
        .map_err(internal("Failed to load membership"))?;

    let tariff = resolve_tariff(active.as_ref(), &state.config.default_tariff);

    Ok(Json(TariffResponse {
        tariff,
        tipo_membresia: active.as_ref().map(|a| a.membership.tipo.clone()),
        tiene_membresia: active.is_some(),
    }))
}

/// Tiers on offer, cheapest first
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let tiers = state
        .membership_repository
        .list_tiers()
        .await
        .map_err(internal("Failed to list membership tiers"))?;

    Ok(Json(tiers))
}
