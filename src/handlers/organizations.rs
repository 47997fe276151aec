// src/handlers/organizations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::{
        organization::{Organization, OrganizationChanges},
        subscription::{CreateAllowance, PlanUsage, ResourceKind},
    },
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrganizationPayload {
    #[validate(length(min = 1, max = 120, message = "O nome deve ter entre 1 e 120 caracteres."))]
    #[schema(example = "Acme Ltda")]
    pub name: String,
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Value>,
}

// Nome exige dono; configurações, admin
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrganizationPayload {
    #[validate(length(min = 1, max = 120, message = "O nome deve ter entre 1 e 120 caracteres."))]
    pub name: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Value>,
}

// POST /api/organizations
#[utoipa::path(
    post,
    path = "/api/organizations",
    tag = "Organizations",
    request_body = CreateOrganizationPayload,
    responses(
        (status = 201, description = "Organização criada no plano free, com o usuário como dono", body = Organization),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateOrganizationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let organization = app_state
        .organization_service
        .create(user.0.id, &payload.name, payload.settings)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(organization)))
}

// GET /api/organization
#[utoipa::path(
    get,
    path = "/api/organization",
    tag = "Organizations",
    responses(
        (status = 200, description = "Organização atual", body = Organization),
        (status = 403, description = "Sem acesso à organização")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn get_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<Organization>, ApiError> {
    let organization = app_state
        .organization_service
        .get(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(organization))
}

// PATCH /api/organization
#[utoipa::path(
    patch,
    path = "/api/organization",
    tag = "Organizations",
    request_body = UpdateOrganizationPayload,
    responses(
        (status = 200, description = "Organização atualizada", body = Organization),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Papel insuficiente")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn update_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<UpdateOrganizationPayload>,
) -> Result<Json<Organization>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let organization = app_state
        .organization_service
        .update(
            &tenant,
            OrganizationChanges {
                name: payload.name,
                settings: payload.settings,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(organization))
}

// DELETE /api/organization
#[utoipa::path(
    delete,
    path = "/api/organization",
    tag = "Organizations",
    responses(
        (status = 204, description = "Organização e todos os seus dados removidos"),
        (status = 403, description = "Somente o dono")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn delete_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<StatusCode, ApiError> {
    app_state
        .organization_service
        .delete(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/organization/subscription
#[utoipa::path(
    get,
    path = "/api/organization/subscription",
    tag = "Organizations",
    responses(
        (status = 200, description = "Plano, status e uso atual frente aos limites", body = PlanUsage)
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn get_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<PlanUsage>, ApiError> {
    let usage = app_state
        .plan_service
        .usage(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(usage))
}

// GET /api/organization/can-create/{resource}
// Só orienta a interface; a trava de verdade acontece na inserção.
#[utoipa::path(
    get,
    path = "/api/organization/can-create/{resource}",
    tag = "Organizations",
    responses(
        (status = 200, description = "Se o plano ainda comporta mais um recurso deste tipo", body = CreateAllowance),
        (status = 400, description = "Tipo de recurso desconhecido")
    ),
    params(
        ("resource" = ResourceKind, Path, description = "asset, license ou member"),
        ("x-organization-id" = Uuid, Header, description = "ID da organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn can_create(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(resource): Path<ResourceKind>,
) -> Result<Json<CreateAllowance>, ApiError> {
    let allowed = app_state
        .plan_service
        .can_create(&tenant, resource)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(CreateAllowance { resource, allowed }))
}
