// src/handlers/licenses.rs

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::assets::AssignPayload,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::{
        import::ImportReport,
        license::{License, LicenseChanges, LicenseStatus, NewLicense, RevealedKey},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicensePayload {
    #[validate(length(min = 1, max = 200, message = "O produto deve ter entre 1 e 200 caracteres."))]
    #[schema(example = "Microsoft 365")]
    pub product: String,
    /// Chave completa; nunca é devolvida nas listagens.
    #[validate(length(min = 1, message = "A chave da licença é obrigatória."))]
    #[schema(example = "ABCD-1234-WXYZ-9999")]
    pub full_key: String,
    pub expires_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLicensePayload {
    #[validate(length(min = 1, max = 200, message = "O produto deve ter entre 1 e 200 caracteres."))]
    pub product: Option<String>,
    #[validate(length(min = 1, message = "A chave da licença não pode ser vazia."))]
    pub full_key: Option<String>,
    pub status: Option<LicenseStatus>,
    pub expires_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

// GET /api/licenses
#[utoipa::path(
    get,
    path = "/api/licenses",
    tag = "Licenses",
    responses(
        (status = 200, description = "Licenças da organização (só a chave mascarada)", body = Vec<License>)
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn list_licenses(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<Vec<License>>, ApiError> {
    let licenses = app_state
        .license_service
        .list(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(licenses))
}

// GET /api/licenses/{id}
#[utoipa::path(
    get,
    path = "/api/licenses/{id}",
    tag = "Licenses",
    responses(
        (status = 200, description = "Licença", body = License),
        (status = 404, description = "Licença não encontrada")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID da licença")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_license(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<License>, ApiError> {
    let license = app_state
        .license_service
        .get(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(license))
}

// POST /api/licenses
#[utoipa::path(
    post,
    path = "/api/licenses",
    tag = "Licenses",
    request_body = CreateLicensePayload,
    responses(
        (status = 201, description = "Licença criada", body = License),
        (status = 402, description = "Limite de licenças do plano atingido"),
        (status = 403, description = "Papel insuficiente")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_license(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateLicensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let license = app_state
        .license_service
        .create(
            &tenant,
            NewLicense {
                product: payload.product,
                full_key: payload.full_key,
                expires_at: payload.expires_at,
                notes: payload.notes,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(license)))
}

// PATCH /api/licenses/{id}
#[utoipa::path(
    patch,
    path = "/api/licenses/{id}",
    tag = "Licenses",
    request_body = UpdateLicensePayload,
    responses(
        (status = 200, description = "Licença atualizada", body = License),
        (status = 404, description = "Licença não encontrada")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID da licença")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_license(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLicensePayload>,
) -> Result<Json<License>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let license = app_state
        .license_service
        .update(
            &tenant,
            id,
            LicenseChanges {
                product: payload.product,
                full_key: payload.full_key,
                status: payload.status,
                expires_at: payload.expires_at,
                notes: payload.notes,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(license))
}

// POST /api/licenses/{id}/assign
#[utoipa::path(
    post,
    path = "/api/licenses/{id}/assign",
    tag = "Licenses",
    request_body = AssignPayload,
    responses(
        (status = 200, description = "Atribuição atualizada", body = License),
        (status = 400, description = "O usuário não é membro da organização"),
        (status = 404, description = "Licença não encontrada")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID da licença")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_license(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignPayload>,
) -> Result<Json<License>, ApiError> {
    let license = app_state
        .license_service
        .assign(&tenant, id, payload.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(license))
}

// POST /api/licenses/{id}/reveal
#[utoipa::path(
    post,
    path = "/api/licenses/{id}/reveal",
    tag = "Licenses",
    responses(
        (status = 200, description = "Chave completa (ação auditada)", body = RevealedKey),
        (status = 403, description = "Somente admins"),
        (status = 404, description = "Licença não encontrada")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID da licença")
    ),
    security(("api_jwt" = []))
)]
pub async fn reveal_license_key(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<RevealedKey>, ApiError> {
    let revealed = app_state
        .license_service
        .reveal(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(revealed))
}

// DELETE /api/licenses/{id}
#[utoipa::path(
    delete,
    path = "/api/licenses/{id}",
    tag = "Licenses",
    responses(
        (status = 204, description = "Licença removida"),
        (status = 404, description = "Licença não encontrada")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID da licença")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_license(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .license_service
        .delete(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/licenses/import
#[utoipa::path(
    post,
    path = "/api/licenses/import",
    tag = "Licenses",
    request_body(content = String, content_type = "text/csv", description = "product,seat_key_full,expires_at,notes"),
    responses(
        (status = 200, description = "Resultado por linha", body = ImportReport),
        (status = 400, description = "Cabeçalho inválido"),
        (status = 402, description = "Importação indisponível no plano atual")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn import_licenses(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError> {
    let report = app_state
        .import_service
        .import_licenses(&tenant, &body)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
