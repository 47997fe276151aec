// src/handlers/members.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::organization::{MemberRole, MemberView, Membership},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRolePayload {
    pub role: MemberRole,
}

// GET /api/members
#[utoipa::path(
    get,
    path = "/api/members",
    tag = "Members",
    responses(
        (status = 200, description = "Membros da organização", body = Vec<MemberView>)
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let members = app_state
        .member_service
        .list(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(members))
}

// PATCH /api/members/{user_id}
#[utoipa::path(
    patch,
    path = "/api/members/{user_id}",
    tag = "Members",
    request_body = ChangeRolePayload,
    responses(
        (status = 200, description = "Papel alterado", body = Membership),
        (status = 403, description = "Somente o dono altera papéis"),
        (status = 404, description = "Membro não encontrado")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("user_id" = Uuid, Path, description = "ID do usuário membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_role(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangeRolePayload>,
) -> Result<Json<Membership>, ApiError> {
    let membership = app_state
        .member_service
        .change_role(&tenant, user_id, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(membership))
}

// DELETE /api/members/{user_id}
#[utoipa::path(
    delete,
    path = "/api/members/{user_id}",
    tag = "Members",
    responses(
        (status = 204, description = "Membro removido"),
        (status = 403, description = "Papel insuficiente"),
        (status = 404, description = "Membro não encontrado")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("user_id" = Uuid, Path, description = "ID do usuário membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_member(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .member_service
        .remove(&tenant, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/members/me
#[utoipa::path(
    delete,
    path = "/api/members/me",
    tag = "Members",
    responses(
        (status = 204, description = "Saiu da organização"),
        (status = 403, description = "O dono não pode sair da organização")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn leave_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<StatusCode, ApiError> {
    app_state
        .member_service
        .leave(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
