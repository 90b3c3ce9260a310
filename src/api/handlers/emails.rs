//! Email template request handlers.

use crate::api::doc::EMAIL_TAG;
use crate::api::dto::{
    CreateEmailRequest, EmailResponse, PagedResponse, PaginationParams, UpdateEmailRequest,
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

/// Creates email template routes.
///
/// Routes:
/// - GET /        - List email templates
/// - POST /       - Create email template
/// - GET /:id     - Get email template by ID
/// - PUT /:id     - Update email template
/// - DELETE /:id  - Delete email template
pub fn email_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_emails))
        .routes(routes!(create_email))
        .routes(routes!(get_email))
        .routes(routes!(update_email))
        .routes(routes!(delete_email))
}

/// GET /api/emails - List email templates
#[utoipa::path(
    get,
    path = "/",
    tag = EMAIL_TAG,
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated list of email templates", body = PagedResponse<EmailResponse>)
    ),
    security(("bearerAuth" = []))
)]
async fn list_emails(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> AppResult<Json<PagedResponse<EmailResponse>>> {
    let params = params.normalize();

    let (emails, total) = state
        .services
        .emails
        .list_emails(params.offset(), params.limit())
        .await?;

    let responses: Vec<EmailResponse> = emails.into_iter().map(EmailResponse::from).collect();
    Ok(Json(PagedResponse::new(responses, &params, total as u64)))
}

/// POST /api/emails - Create a new email template
#[utoipa::path(
    post,
    path = "/",
    tag = EMAIL_TAG,
    request_body = CreateEmailRequest,
    responses(
        (status = 201, description = "Email template created", body = EmailResponse),
        (status = 400, description = "Invalid request")
    ),
    security(("bearerAuth" = []))
)]
async fn create_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateEmailRequest>,
) -> AppResult<(StatusCode, Json<EmailResponse>)> {
    let email = state
        .services
        .emails
        .create_email(payload.into_new_email())
        .await?;
    Ok((StatusCode::CREATED, Json(EmailResponse::from(email))))
}

/// GET /api/emails/:id - Get email template by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = EMAIL_TAG,
    params(
        ("id" = i32, Path, description = "Email template ID")
    ),
    responses(
        (status = 200, description = "Email template found", body = EmailResponse),
        (status = 404, description = "Email template not found")
    ),
    security(("bearerAuth" = []))
)]
async fn get_email(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<EmailResponse>> {
    let email = state.services.emails.get_email(id).await?;
    Ok(Json(EmailResponse::from(email)))
}

/// PUT /api/emails/:id - Update email template
#[utoipa::path(
    put,
    path = "/{id}",
    tag = EMAIL_TAG,
    params(
        ("id" = i32, Path, description = "Email template ID")
    ),
    request_body = UpdateEmailRequest,
    responses(
        (status = 200, description = "Email template updated", body = EmailResponse),
        (status = 404, description = "Email template not found")
    ),
    security(("bearerAuth" = []))
)]
async fn update_email(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateEmailRequest>,
) -> AppResult<Json<EmailResponse>> {
    let email = state
        .services
        .emails
        .update_email(id, payload.into_update_email())
        .await?;
    Ok(Json(EmailResponse::from(email)))
}

/// DELETE /api/emails/:id - Delete email template
///
/// Templates referenced by an automation sequence cannot be deleted; the
/// request fails with 409 until the referencing sequences are updated.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = EMAIL_TAG,
    params(
        ("id" = i32, Path, description = "Email template ID")
    ),
    responses(
        (status = 204, description = "Email template deleted"),
        (status = 404, description = "Email template not found"),
        (status = 409, description = "Email template still referenced by automations")
    ),
    security(("bearerAuth" = []))
)]
async fn delete_email(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<StatusCode> {
    state.services.emails.delete_email(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
