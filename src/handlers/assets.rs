// src/handlers/assets.rs

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
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
    models::{
        asset::{Asset, AssetCategory, AssetChanges, AssetFilter, AssetStatus, NewAsset},
        import::ImportReport,
    },
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetPayload {
    #[validate(length(min = 1, max = 200, message = "O nome deve ter entre 1 e 200 caracteres."))]
    #[schema(example = "Notebook Dell 14")]
    pub name: String,
    pub category: AssetCategory,
    #[validate(length(max = 120))]
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssetPayload {
    #[validate(length(min = 1, max = 200, message = "O nome deve ter entre 1 e 200 caracteres."))]
    pub name: Option<String>,
    pub category: Option<AssetCategory>,
    #[validate(length(max = 120))]
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: Option<AssetStatus>,
}

/// `userId: null` devolve o item.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignPayload {
    pub user_id: Option<Uuid>,
}

// GET /api/assets
#[utoipa::path(
    get,
    path = "/api/assets",
    tag = "Assets",
    responses(
        (status = 200, description = "Ativos da organização", body = Vec<Asset>)
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        AssetFilter
    ),
    security(("api_jwt" = []))
)]
pub async fn list_assets(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<AssetFilter>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    let assets = app_state
        .asset_service
        .list(&tenant, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(assets))
}

// GET /api/assets/{id}
#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    tag = "Assets",
    responses(
        (status = 200, description = "Ativo", body = Asset),
        (status = 404, description = "Ativo não encontrado")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Asset>, ApiError> {
    let asset = app_state
        .asset_service
        .get(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(asset))
}

// POST /api/assets
#[utoipa::path(
    post,
    path = "/api/assets",
    tag = "Assets",
    request_body = CreateAssetPayload,
    responses(
        (status = 201, description = "Ativo criado", body = Asset),
        (status = 402, description = "Limite de ativos do plano atingido"),
        (status = 403, description = "Papel insuficiente"),
        (status = 409, description = "Número de série duplicado")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateAssetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let asset = app_state
        .asset_service
        .create(
            &tenant,
            NewAsset {
                name: payload.name,
                category: payload.category,
                serial_number: payload.serial_number,
                location: payload.location,
                notes: payload.notes,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(asset)))
}

// PATCH /api/assets/{id}
#[utoipa::path(
    patch,
    path = "/api/assets/{id}",
    tag = "Assets",
    request_body = UpdateAssetPayload,
    responses(
        (status = 200, description = "Ativo atualizado", body = Asset),
        (status = 404, description = "Ativo não encontrado")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssetPayload>,
) -> Result<Json<Asset>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let asset = app_state
        .asset_service
        .update(
            &tenant,
            id,
            AssetChanges {
                name: payload.name,
                category: payload.category,
                serial_number: payload.serial_number,
                location: payload.location,
                notes: payload.notes,
                status: payload.status,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(asset))
}

// POST /api/assets/{id}/assign
#[utoipa::path(
    post,
    path = "/api/assets/{id}/assign",
    tag = "Assets",
    request_body = AssignPayload,
    responses(
        (status = 200, description = "Atribuição atualizada", body = Asset),
        (status = 400, description = "O usuário não é membro da organização"),
        (status = 404, description = "Ativo não encontrado")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignPayload>,
) -> Result<Json<Asset>, ApiError> {
    let asset = app_state
        .asset_service
        .assign(&tenant, id, payload.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(asset))
}

// DELETE /api/assets/{id}
#[utoipa::path(
    delete,
    path = "/api/assets/{id}",
    tag = "Assets",
    responses(
        (status = 204, description = "Ativo removido"),
        (status = 404, description = "Ativo não encontrado")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .asset_service
        .delete(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/assets/import
// Corpo: o arquivo CSV cru (text/csv)
#[utoipa::path(
    post,
    path = "/api/assets/import",
    tag = "Assets",
    request_body(content = String, content_type = "text/csv", description = "name,category,serial_number,location,notes"),
    responses(
        (status = 200, description = "Resultado por linha", body = ImportReport),
        (status = 400, description = "Cabeçalho inválido"),
        (status = 402, description = "Importação indisponível no plano atual")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn import_assets(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError> {
    let report = app_state
        .import_service
        .import_assets(&tenant, &body)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
