// src/handlers/audit.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::audit::{AuditFilter, AuditLogEntry},
};

// GET /api/audit
#[utoipa::path(
    get,
    path = "/api/audit",
    tag = "Audit",
    responses(
        (status = 200, description = "Trilha de auditoria, mais recentes primeiro", body = Vec<AuditLogEntry>),
        (status = 402, description = "Log de auditoria indisponível no plano atual"),
        (status = 403, description = "Somente admins")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        AuditFilter
    ),
    security(("api_jwt" = []))
)]
pub async fn list_audit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<AuditFilter>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = app_state
        .audit_service
        .list(&tenant, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}

// GET /api/audit/export
#[utoipa::path(
    get,
    path = "/api/audit/export",
    tag = "Audit",
    responses(
        (status = 200, description = "CSV (RFC 4180) da trilha filtrada", content_type = "text/csv", body = String),
        (status = 402, description = "Log de auditoria indisponível no plano atual"),
        (status = 403, description = "Somente admins")
    ),
    params(
        ("x-organization-id" = Uuid, Header, description = "ID da organização"),
        AuditFilter
    ),
    security(("api_jwt" = []))
)]
pub async fn export_audit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<AuditFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, body) = app_state
        .audit_service
        .export_csv(&tenant, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}
