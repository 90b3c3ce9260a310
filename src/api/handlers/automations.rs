//! Automation request handlers: CRUD, trigger intake, and processing.

use crate::api::doc::AUTOMATION_TAG;
use crate::api::dto::{
    AutomationResponse, CreateAutomationRequest, EventResponse, PagedResponse, PaginationParams,
    ProcessResponse, TriggerRequest, TriggerResponse, UpdateAutomationRequest,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates automation-related routes.
///
/// Routes:
/// - GET /              - List automations
/// - POST /             - Create automation
/// - GET /:id           - Get automation by ID
/// - PUT /:id           - Update automation
/// - DELETE /:id        - Delete automation
/// - POST /trigger      - Report a user event and enroll matching automations
/// - POST /process      - Run one processing pass over due events
/// - GET /:id/events    - List events scheduled by one automation
pub fn automation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_automations))
        .routes(routes!(create_automation))
        .routes(routes!(get_automation))
        .routes(routes!(update_automation))
        .routes(routes!(delete_automation))
        .routes(routes!(trigger_automations))
        .routes(routes!(process_due_events))
        .routes(routes!(list_automation_events))
}

// ============================================================================
// CRUD Handlers
// ============================================================================

/// GET /api/automations - List automations with their sequences
#[utoipa::path(
    get,
    path = "/",
    tag = AUTOMATION_TAG,
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated list of automations", body = PagedResponse<AutomationResponse>)
    ),
    security(("bearerAuth" = []))
)]
async fn list_automations(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> AppResult<Json<PagedResponse<AutomationResponse>>> {
    let params = params.normalize();

    let (automations, total) = state
        .services
        .automations
        .list_automations(params.offset(), params.limit())
        .await?;

    let responses: Vec<AutomationResponse> = automations
        .into_iter()
        .map(AutomationResponse::from)
        .collect();
    Ok(Json(PagedResponse::new(responses, &params, total as u64)))
}

/// POST /api/automations - Create a new automation
#[utoipa::path(
    post,
    path = "/",
    tag = AUTOMATION_TAG,
    request_body = CreateAutomationRequest,
    responses(
        (status = 201, description = "Automation created", body = AutomationResponse),
        (status = 400, description = "Invalid request")
    ),
    security(("bearerAuth" = []))
)]
async fn create_automation(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateAutomationRequest>,
) -> AppResult<(StatusCode, Json<AutomationResponse>)> {
    let (new_automation, steps) = payload.into_parts();
    let created = state
        .services
        .automations
        .create_automation(new_automation, steps)
        .await?;
    Ok((StatusCode::CREATED, Json(AutomationResponse::from(created))))
}

/// GET /api/automations/:id - Get automation by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = AUTOMATION_TAG,
    params(
        ("id" = i32, Path, description = "Automation ID")
    ),
    responses(
        (status = 200, description = "Automation found", body = AutomationResponse),
        (status = 404, description = "Automation not found")
    ),
    security(("bearerAuth" = []))
)]
async fn get_automation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AutomationResponse>> {
    let automation = state.services.automations.get_automation(id).await?;
    Ok(Json(AutomationResponse::from(automation)))
}

/// PUT /api/automations/:id - Update automation
#[utoipa::path(
    put,
    path = "/{id}",
    tag = AUTOMATION_TAG,
    params(
        ("id" = i32, Path, description = "Automation ID")
    ),
    request_body = UpdateAutomationRequest,
    responses(
        (status = 200, description = "Automation updated", body = AutomationResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Automation not found")
    ),
    security(("bearerAuth" = []))
)]
async fn update_automation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateAutomationRequest>,
) -> AppResult<Json<AutomationResponse>> {
    let (changes, steps) = payload.into_parts();
    let updated = state
        .services
        .automations
        .update_automation(id, changes, steps)
        .await?;
    Ok(Json(AutomationResponse::from(updated)))
}

/// DELETE /api/automations/:id - Delete automation
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = AUTOMATION_TAG,
    params(
        ("id" = i32, Path, description = "Automation ID")
    ),
    responses(
        (status = 204, description = "Automation deleted"),
        (status = 404, description = "Automation not found")
    ),
    security(("bearerAuth" = []))
)]
async fn delete_automation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.automations.delete_automation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Trigger and Processing Handlers
// ============================================================================

/// POST /api/automations/trigger - Report a user event
///
/// Enrolls the user into every active automation whose trigger type and
/// conditions match. Enrollment is idempotent per (user, automation, email).
#[utoipa::path(
    post,
    path = "/trigger",
    tag = AUTOMATION_TAG,
    request_body = TriggerRequest,
    responses(
        (status = 200, description = "Trigger processed", body = TriggerResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearerAuth" = []))
)]
async fn trigger_automations(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TriggerRequest>,
) -> AppResult<Json<TriggerResponse>> {
    let outcome = state
        .services
        .trigger
        .trigger(
            payload.user_id,
            payload.trigger_type,
            payload.user_data.as_ref(),
        )
        .await?;
    Ok(Json(TriggerResponse::from(outcome)))
}

/// POST /api/automations/process - Run one processing pass
///
/// Claims due pending events and attempts delivery for each. One event's
/// failure never aborts the pass; per-event errors are reported in the body.
#[utoipa::path(
    post,
    path = "/process",
    tag = AUTOMATION_TAG,
    responses(
        (status = 200, description = "Processing pass completed", body = ProcessResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn process_due_events(State(state): State<AppState>) -> AppResult<Json<ProcessResponse>> {
    let outcome = state.services.processing.process_due().await?;
    Ok(Json(ProcessResponse::from(outcome)))
}

/// GET /api/automations/:id/events - List events scheduled by one automation
#[utoipa::path(
    get,
    path = "/{id}/events",
    tag = AUTOMATION_TAG,
    params(
        ("id" = i32, Path, description = "Automation ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Paginated list of events", body = PagedResponse<EventResponse>),
        (status = 404, description = "Automation not found")
    ),
    security(("bearerAuth" = []))
)]
async fn list_automation_events(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> AppResult<Json<PagedResponse<EventResponse>>> {
    let params = params.normalize();

    let (events, total) = state
        .services
        .events
        .list_for_automation(id, params.offset(), params.limit())
        .await?;

    let responses: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
    Ok(Json(PagedResponse::new(responses, &params, total as u64)))
}
