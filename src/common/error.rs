// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::subscription::{Feature, ResourceKind},
};

// Nosso tipo de erro de domínio. Os serviços só conhecem este tipo;
// a tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Autenticação necessária")]
    AuthenticationRequired,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    // Nunca carrega detalhes: "existe mas é proibido" e "não existe" ficam iguais.
    #[error("Acesso negado")]
    AuthorizationDenied,

    #[error("Limite do plano atingido para {resource}")]
    LimitExceeded {
        resource: ResourceKind,
        limit: Option<i64>,
    },

    #[error("Recurso indisponível no plano atual: {0}")]
    FeatureNotAvailable(Feature),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Convite já utilizado")]
    InviteAlreadyUsed,

    #[error("Convite expirado")]
    InviteExpired,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AuthenticationRequired | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AuthorizationDenied => StatusCode::FORBIDDEN,
            AppError::LimitExceeded { .. } | AppError::FeatureNotAvailable(_) => {
                StatusCode::PAYMENT_REQUIRED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InviteAlreadyUsed => StatusCode::CONFLICT,
            AppError::InviteExpired => StatusCode::GONE,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Chave do catálogo de mensagens (ver common::i18n)
    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::Validation(_) => "invalid_input",
            AppError::AuthenticationRequired => "authentication_required",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AuthorizationDenied => "access_denied",
            AppError::LimitExceeded { .. } => "limit_exceeded",
            AppError::FeatureNotAvailable(_) => "feature_not_available",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InviteAlreadyUsed => "invite_already_used",
            AppError::InviteExpired => "invite_expired",
            _ => "internal_error",
        }
    }

    /// Converte o erro de domínio na resposta HTTP, já traduzida.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(serde_json::Value::Object(details))
            }
            AppError::Validation(reason) | AppError::Conflict(reason) => {
                Some(json!({ "reason": reason }))
            }
            AppError::LimitExceeded { resource, limit } => Some(json!({
                "upgrade": true,
                "resource": resource,
                "limit": limit,
            })),
            AppError::FeatureNotAvailable(feature) => Some(json!({
                "upgrade": true,
                "feature": feature,
            })),
            AppError::NotFound(resource) => Some(json!({ "resource": resource })),
            _ => None,
        };

        if status.is_server_error() {
            // O `tracing` loga a mensagem detalhada; o cliente recebe só a genérica.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        ApiError {
            status,
            error: store.message(self.message_key(), &locale.0).to_string(),
            details,
        }
    }
}

// Resposta de erro serializada para o cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado pelos middlewares, que não têm o Locale em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::fallback())
            .into_response()
    }
}
