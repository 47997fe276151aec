// src/handlers/requests.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::request::{RequestedResource, ResourceRequest},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    pub resource_type: RequestedResource,
    /// Item específico; vazio para "qualquer um"
    pub resource_id: Option<Uuid>,
    #[validate(length(max = 1000, message = "O motivo deve ter no máximo 1000 caracteres."))]
    pub reason: Option<String>,
}

// GET /api/requests
#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    responses(
        (status = 200, description = "Admins veem todos; membros, os próprios", body = Vec<ResourceRequest>)
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn list_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<Vec<ResourceRequest>>, ApiError> {
    let requests = app_state
        .request_service
        .list(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

// POST /api/requests
#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = CreateRequestPayload,
    responses(
        (status = 201, description = "Pedido criado", body = ResourceRequest),
        (status = 404, description = "Recurso não encontrado")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .request_service
        .create(&tenant, payload.resource_type, payload.resource_id, payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}

// POST /api/requests/{id}/approve
#[utoipa::path(
    post,
    path = "/api/requests/{id}/approve",
    tag = "Requests",
    responses(
        (status = 200, description = "Aprovado; o recurso passa ao solicitante", body = ResourceRequest),
        (status = 403, description = "Somente admins"),
        (status = 409, description = "O pedido não está mais pendente")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_request(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ResourceRequest>, ApiError> {
    let request = app_state
        .request_service
        .approve(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

// POST /api/requests/{id}/deny
#[utoipa::path(
    post,
    path = "/api/requests/{id}/deny",
    tag = "Requests",
    responses(
        (status = 200, description = "Negado", body = ResourceRequest),
        (status = 403, description = "Somente admins"),
        (status = 409, description = "O pedido não está mais pendente")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn deny_request(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ResourceRequest>, ApiError> {
    let request = app_state
        .request_service
        .deny(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

// POST /api/requests/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/requests/{id}/cancel",
    tag = "Requests",
    responses(
        (status = 200, description = "Cancelado pelo solicitante", body = ResourceRequest),
        (status = 403, description = "Só quem pediu pode cancelar"),
        (status = 409, description = "O pedido não está mais pendente")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_request(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ResourceRequest>, ApiError> {
    let request = app_state
        .request_service
        .cancel(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}
