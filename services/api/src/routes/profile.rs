use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::info;

use super::{current_user, json_body};
use crate::{
    error::{ApiResult, internal},
    middleware::AuthUser,
    models::{CustomerResponse, UpdateProfileRequest},
    state::AppState,
    validation::{FieldErrors, validate_phone},
};

/// Current customer's profile, created on first access
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &auth).await?;
    let customer = state
        .customer_repository
        .get_or_create(user.id)
        .await
        .map_err(internal("Failed to load customer profile"))?;

    Ok(Json(CustomerResponse::new(&user, &customer)))
}

/// Update the phone number; other profile fields are read-only
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(payload)?;
    let user = current_user(&state, &auth).await?;

    let customer = match payload.telefono {
        Some(telefono) => {
            let telefono = telefono.trim().to_string();
            if let Err(message) = validate_phone(&telefono) {
                let mut errors = FieldErrors::default();
                errors.add("telefono", message);
                return Err(errors.into());
            }

            info!(user_id = user.id, "Updating customer phone");
            state
                .customer_repository
                .update_phone(user.id, &telefono)
                .await
                .map_err(internal("Failed to update customer profile"))?
        }
        None => state
            .customer_repository
            .get_or_create(user.id)
            .await
            .map_err(internal("Failed to load customer profile"))?,
    };

    Ok(Json(CustomerResponse::new(&user, &customer)))
}
