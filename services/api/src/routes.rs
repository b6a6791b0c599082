//! API service routes

mod auth;
mod membership;
mod profile;
mod requests;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult, internal},
    middleware::{AuthUser, auth_middleware},
    models::User,
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/perfil",
            get(profile::get_profile)
                .put(profile::update_profile)
                .patch(profile::update_profile),
        )
        .route(
            "/solicitudes",
            get(requests::list_requests).post(requests::create_request),
        )
        .route("/solicitudes/:id", get(requests::get_request))
        .route("/solicitudes/:id/cancelar", post(requests::cancel_request))
        .route("/membresia", get(membership::get_membership))
        .route("/membresia/planes", get(membership::list_plans))
        .route("/tarifas", get(membership::get_tariffs))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router that also accepts the trailing-slash paths the mobile app uses
pub fn create_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state))
}

/// Health check endpoint
///
/// Always answers while the process is up; the database status is
/// informational.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match grua_common::database::health_check(&state.db_pool).await {
        Ok(true) => "ok",
        _ => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "service": "grua-api",
        "database": database
    }))
}

/// Unwrap a JSON body, turning syntax and content-type problems into a 400
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

/// Load the account behind an authenticated request
async fn current_user(state: &AppState, auth: &AuthUser) -> ApiResult<User> {
    state
        .user_repository
        .find_by_id(auth.id)
        .await
        .map_err(internal("Failed to load user"))?
        .ok_or_else(|| {
            warn!(user_id = auth.id, username = %auth.username, "Token for a deleted account");
            ApiError::Unauthorized
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use grua_common::cache::{RedisConfig, RedisPool};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use crate::{
        jwt::test_service,
        models::user::sample_user,
        notifications::NotificationHub,
        repositories::test_support::{migrated_pool, unique_username},
        state::tests::test_state,
    };

    async fn call(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (state, _rx) = test_state();
        call(state, request).await
    }

    fn decimal(value: &serde_json::Value) -> Decimal {
        value.to_string().trim_matches('"').parse().unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "unavailable");
    }

    #[tokio::test]
    async fn test_protected_routes_require_a_token() {
        for uri in [
            "/perfil",
            "/solicitudes",
            "/solicitudes/1",
            "/membresia",
            "/membresia/planes",
            "/tarifas/",
        ] {
            let (status, _) = send(Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let request = Request::get("/solicitudes")
            .header(header::AUTHORIZATION, "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let refresh = test_service().generate_refresh_token(&sample_user()).unwrap();
        let request = Request::get("/perfil")
            .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (status, body) = send(post_json("/auth/login/", json!({ "username": "jperez" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username y password son requeridos");

        let (status, _) =
            send(post_json("/auth/login", json!({ "username": "", "password": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request() {
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"username\":"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let (status, body) = send(post_json(
            "/auth/register/",
            json!({ "username": "con espacios", "email": "no-es-correo", "password": "123" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["username"].is_array());
        assert!(body["fields"]["email"].is_array());
        assert!(body["fields"]["password"].is_array());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_tokens() {
        let access = test_service().generate_access_token(&sample_user()).unwrap();
        let (status, _) = send(post_json("/auth/refresh", json!({ "refresh": access }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(post_json("/auth/refresh", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_rejects_invalid_tokens() {
        let (status, _) = send(post_json("/auth/logout", json!({ "refresh": "nope" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL and Redis instances"]
    async fn test_customer_journey() {
        let (template, _) = test_state();
        let (hub, mut rx) = NotificationHub::new(8);
        let state = AppState::new(
            migrated_pool().await,
            RedisPool::new(&RedisConfig::from_env()).unwrap(),
            test_service(),
            hub,
            (*template.config).clone(),
        );

        let username = unique_username("viaje");
        let (status, _) = call(
            state.clone(),
            post_json(
                "/auth/register/",
                json!({
                    "username": username,
                    "email": "viaje@example.com",
                    "password": "Remolque2024",
                    "telefono": "+56 9 8765 4321"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, session) = call(
            state.clone(),
            post_json(
                "/auth/login",
                json!({ "username": format!("  {username} "), "password": "Remolque2024" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["cliente"]["telefono"], "+56 9 8765 4321");
        let access = session["access"].as_str().unwrap().to_string();
        let bearer = format!("Bearer {access}");

        let get = |uri: &str| {
            Request::get(uri)
                .header(header::AUTHORIZATION, &bearer)
                .body(Body::empty())
                .unwrap()
        };

        let (status, body) = call(state.clone(), get("/membresia/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tiene_membresia"], false);

        let (status, body) = call(state.clone(), get("/tarifas")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tiene_membresia"], false);
        assert!(body["tipo_membresia"].is_null());
        assert_eq!(decimal(&body["tarifa_minima"]), Decimal::from(8000));

        let mut create = post_json(
            "/solicitudes/",
            json!({
                "direccion_origen": "Av. Providencia 1234",
                "direccion_destino": "Taller Los Leones",
                "distancia_km": 10,
                "tipo_vehiculo": "auto",
                "marca_vehiculo": "Toyota",
                "modelo_vehiculo": "Yaris",
                "metodo_pago": "efectivo"
            }),
        );
        create
            .headers_mut()
            .insert(header::AUTHORIZATION, bearer.parse().unwrap());
        let (status, body) = call(state.clone(), create).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["estado"], "pendiente");
        assert_eq!(decimal(&body["costo_total"]), Decimal::from(10000));
        assert_eq!(body["cliente_info"]["telefono"], "+56 9 8765 4321");
        assert_eq!(rx.try_recv().unwrap().request.numero_orden, body["numero_orden"]);

        // a refresh token rotates exactly once
        let refresh = json!({ "refresh": session["refresh"] });
        let (status, _) = call(state.clone(), post_json("/auth/refresh", refresh.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(state, post_json("/auth/refresh", refresh)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
