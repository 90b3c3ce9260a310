//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers::{automations, emails, events, health};
use crate::api::middleware::{
    admin_auth_middleware, global_error_handler, logging_middleware, request_id_middleware,
};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Request ID middleware (runs first) - generates/propagates request IDs
/// 2. Logging middleware (runs second) - logs requests with request IDs
/// 3. Error handler middleware (runs last) - normalizes error responses
///
/// # Routes
/// - `/health`, `/health/ready`, `/health/live` - Unauthenticated probes
/// - `/api/automations` - Automation CRUD, trigger and processing operations
/// - `/api/emails` - Email template CRUD operations
/// - `/api/events` - Scheduled event inspection and requeue operations
/// - `/swagger-ui` - Interactive API documentation
///
/// All `/api` routes require an admin bearer token.
pub fn create_router(state: AppState) -> Router {
    let protected_api = OpenApiRouter::new()
        .nest("/automations", automations::automation_routes())
        .nest("/emails", emails::email_routes())
        .nest("/events", events::event_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(health::health_routes())
        .nest("/api", protected_api)
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        // Middleware is applied in reverse order - last added runs first
        // So logging runs after request_id has set the ID
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
