mod auth;
mod branches;
mod chats;
mod messages;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi, transform::TransformOpenApi};
use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::Settings;

fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("Branch Chat API")
        .description("Chats, messages and conversation branches")
}

pub fn create_rest_router(state: AppState) -> Router {
    let mut api = OpenApi::default();

    // Public API routes (no authentication required)
    let api_routes = ApiRouter::new()
        .merge(auth::auth_routes())
        .route("/openapi.json", get(serve_openapi))
        .merge(
            // Protected API routes requiring authentication
            ApiRouter::new()
                .merge(auth::protected_auth_routes())
                .merge(chats::chat_routes())
                .merge(messages::message_routes())
                .merge(branches::branch_routes())
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    api::middleware::auth_middleware,
                )),
        );

    let router = ApiRouter::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .nest(&state.settings.api_prefix, api_routes)
        .finish_api_with(&mut api, api_docs);

    router
        .layer(Extension(Arc::new(api)))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.settings.request_timeout,
        ))
        .layer(cors_layer(&state.settings))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Generated OpenAPI document for every documented route
async fn serve_openapi(Extension(api): Extension<Arc<OpenApi>>) -> Response {
    Json(api.as_ref()).into_response()
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    if settings.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
