// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::common::error::AppError;

pub use crate::services::tenancy_service::TenantContext;

// O nome do nosso cabeçalho HTTP customizado
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";

// O tenant_guard coloca o contexto nos extensions; aqui só o lemos.
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or(AppError::AuthorizationDenied)
    }
}

/// Lê e valida o cabeçalho `x-organization-id`.
pub fn organization_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers.get(ORGANIZATION_ID_HEADER).ok_or_else(|| {
        AppError::Validation("O cabeçalho x-organization-id é obrigatório.".into())
    })?;

    let value_str = value.to_str().map_err(|_| {
        AppError::Validation("Cabeçalho x-organization-id contém caracteres inválidos.".into())
    })?;

    Uuid::parse_str(value_str.trim()).map_err(|_| {
        AppError::Validation("Cabeçalho x-organization-id inválido (não é um UUID).".into())
    })
}
