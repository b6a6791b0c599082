//! Error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{repositories::StatusUpdateError, validation::FieldErrors};

/// Error type returned by every handler
#[derive(Error, Debug)]
pub enum ApiError {
    /// Submitted fields failed validation
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Login with a wrong username or password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, expired or revoked token
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource exists but belongs to someone else
    #[error("Forbidden")]
    Forbidden,

    /// Resource does not exist
    #[error("Not found")]
    NotFound,

    /// Request conflicts with the resource's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<StatusUpdateError> for ApiError {
    fn from(err: StatusUpdateError) -> Self {
        match err {
            StatusUpdateError::NotFound => ApiError::NotFound,
            StatusUpdateError::InvalidTransition(e) => ApiError::Conflict(format!(
                "No se puede pasar de {} a {}",
                e.from.label(),
                e.to.label()
            )),
            StatusUpdateError::Conflict => {
                ApiError::Conflict("La solicitud cambió de estado, intenta nuevamente".to_string())
            }
            StatusUpdateError::Database(e) => internal("Failed to update service request")(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Datos inválidos",
                    "fields": fields,
                }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Credenciales inválidas" }),
            ),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "Forbidden" })),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Log an unexpected failure and hide its details from the caller
pub fn internal(context: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
    move |e| {
        tracing::error!("{}: {:#}", context, e);
        ApiError::InternalServerError
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_errors_are_keyed_by_field() {
        let mut errors = FieldErrors::default();
        errors.add("direccion_origen", "Este campo es requerido.");
        errors.add("metodo_pago", "\"bitcoin\" no es una elección válida.");

        let (status, body) = body_json(errors.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["direccion_origen"][0], "Este campo es requerido.");
        assert!(body["fields"]["metodo_pago"].is_array());
    }

    #[tokio::test]
    async fn test_invalid_credentials_message_is_generic() {
        let (status, body) = body_json(ApiError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Credenciales inválidas" }));
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let err = internal("Failed to load")(anyhow::anyhow!("password=secret"));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_status_update_errors() {
        use crate::models::{InvalidTransition, RequestStatus};

        let (status, _) = body_json(StatusUpdateError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let err = StatusUpdateError::InvalidTransition(InvalidTransition {
            from: RequestStatus::Completed,
            to: RequestStatus::Cancelled,
        });
        let (status, body) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "No se puede pasar de Completada a Cancelada");
    }
}
