// src/handlers/invites.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::{
        invite::{AcceptOutcome, InviteCreated, InviteView},
        organization::MemberRole,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvitePayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "bruno@acme.com")]
    pub email: String,
    pub role: MemberRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AcceptInvitePayload {
    #[validate(length(min = 1, message = "O token é obrigatório."))]
    pub token: String,
}

// GET /api/invites
#[utoipa::path(
    get,
    path = "/api/invites",
    tag = "Invites",
    responses(
        (status = 200, description = "Convites da organização com o estado de cada um", body = Vec<InviteView>),
        (status = 403, description = "Papel insuficiente")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn list_invites(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<Vec<InviteView>>, ApiError> {
    let invites = app_state
        .invite_service
        .list(&tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invites))
}

// POST /api/invites
#[utoipa::path(
    post,
    path = "/api/invites",
    tag = "Invites",
    request_body = CreateInvitePayload,
    responses(
        (status = 201, description = "Convite criado; o token só é devolvido aqui", body = InviteCreated),
        (status = 402, description = "Limite de membros do plano atingido"),
        (status = 403, description = "Papel insuficiente"),
        (status = 409, description = "Já é membro ou já há convite pendente")
    ),
    params(("x-organization-id" = Uuid, Header, description = "ID da organização")),
    security(("api_jwt" = []))
)]
pub async fn create_invite(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateInvitePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .invite_service
        .create(&tenant, &payload.email, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// DELETE /api/invites/{id}
#[utoipa::path(
    delete,
    path = "/api/invites/{id}",
    tag = "Invites",
    responses(
        (status = 204, description = "Convite revogado"),
        (status = 404, description = "Convite não encontrado ou já aceito")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        ("id" = Uuid, Path, description = "ID do convite")
    ),
    security(("api_jwt" = []))
)]
pub async fn revoke_invite(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .invite_service
        .revoke(&tenant, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/invites/accept
// Fora do tenant_guard: o usuário ainda não é membro.
#[utoipa::path(
    post,
    path = "/api/invites/accept",
    tag = "Invites",
    request_body = AcceptInvitePayload,
    responses(
        (status = 200, description = "Convite aceito", body = AcceptOutcome),
        (status = 402, description = "Limite de membros do plano atingido"),
        (status = 403, description = "O convite é para outro e-mail"),
        (status = 404, description = "Token desconhecido"),
        (status = 409, description = "Convite já utilizado"),
        (status = 410, description = "Convite expirado")
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_invite(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AcceptInvitePayload>,
) -> Result<Json<AcceptOutcome>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .invite_service
        .accept(&user, &payload.token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(outcome))
}
