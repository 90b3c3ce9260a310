//! Automation event request handlers: inspection and operator recovery.

use crate::api::doc::EVENT_TAG;
use crate::api::dto::{
    EventFilterParams, EventResponse, PagedResponse, PaginationParams, RequeueStaleResponse,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::ValidatedQuery;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates event-related routes.
///
/// Routes:
/// - GET /               - List events, optionally filtered by status
/// - GET /:id            - Get event by ID
/// - POST /:id/requeue   - Requeue one failed event
/// - POST /requeue-stale - Requeue events stuck in the sending state
pub fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_events))
        .routes(routes!(get_event))
        .routes(routes!(requeue_event))
        .routes(routes!(requeue_stale_events))
}

/// GET /api/events - List events
#[utoipa::path(
    get,
    path = "/",
    tag = EVENT_TAG,
    params(EventFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Paginated list of events", body = PagedResponse<EventResponse>)
    ),
    security(("bearerAuth" = []))
)]
async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilterParams>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> AppResult<Json<PagedResponse<EventResponse>>> {
    let params = params.normalize();

    let (events, total) = state
        .services
        .events
        .list_events(filter.status, params.offset(), params.limit())
        .await?;

    let responses: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
    Ok(Json(PagedResponse::new(responses, &params, total as u64)))
}

/// GET /api/events/:id - Get event by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = EVENT_TAG,
    params(
        ("id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found")
    ),
    security(("bearerAuth" = []))
)]
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<EventResponse>> {
    let event = state.services.events.get_event(id).await?;
    Ok(Json(EventResponse::from(event)))
}

/// POST /api/events/:id/requeue - Requeue one event
///
/// Moves a failed event, or one stuck in sending after a crashed pass, back
/// to pending so the next processing pass retries it. Events in any other
/// state are rejected with 409.
#[utoipa::path(
    post,
    path = "/{id}/requeue",
    tag = EVENT_TAG,
    params(
        ("id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event requeued", body = EventResponse),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event is neither failed nor sending")
    ),
    security(("bearerAuth" = []))
)]
async fn requeue_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<EventResponse>> {
    let event = state.services.events.requeue_event(id).await?;
    Ok(Json(EventResponse::from(event)))
}

/// POST /api/events/requeue-stale - Requeue events stuck in sending
///
/// Returns events claimed by a crashed processing pass to the pending
/// state. Only events older than the configured staleness window move.
#[utoipa::path(
    post,
    path = "/requeue-stale",
    tag = EVENT_TAG,
    responses(
        (status = 200, description = "Stale events requeued", body = RequeueStaleResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn requeue_stale_events(
    State(state): State<AppState>,
) -> AppResult<Json<RequeueStaleResponse>> {
    let requeued = state.services.processing.requeue_stale().await?;
    Ok(Json(RequeueStaleResponse { requeued }))
}
