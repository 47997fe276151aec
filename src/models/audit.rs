// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Tipo do recurso auditado (coluna `resource_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditResource {
    Organization,
    Member,
    Invite,
    Asset,
    License,
    Subscription,
    Request,
}

impl AuditResource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Member => "member",
            Self::Invite => "invite",
            Self::Asset => "asset",
            Self::License => "license",
            Self::Subscription => "subscription",
            Self::Request => "request",
        }
    }
}

// Entrada imutável. Não há caminho de update/delete no código.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub action: String,
    pub by_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub organization_id: Uuid,
    pub resource_type: AuditResource,
    pub resource_id: Option<Uuid>,
    pub action: &'static str,
    pub by_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub metadata: serde_json::Value,
}

impl NewAuditEntry {
    pub fn new(
        organization_id: Uuid,
        resource_type: AuditResource,
        resource_id: Option<Uuid>,
        action: &'static str,
    ) -> Self {
        Self {
            organization_id,
            resource_type,
            resource_id,
            action,
            by_user_id: None,
            to_user_id: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn by(mut self, user_id: Uuid) -> Self {
        self.by_user_id = Some(user_id);
        self
    }

    pub fn to(mut self, user_id: Option<Uuid>) -> Self {
        self.to_user_id = user_id;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditFilter {
    pub resource_type: Option<AuditResource>,
    pub action: Option<String>,
    /// Autor ou alvo da ação
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditFilter {
    pub fn page_size(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn page_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if self
            .resource_type
            .is_some_and(|r| r.as_str() != entry.resource_type)
        {
            return false;
        }
        if self.action.as_deref().is_some_and(|a| a != entry.action) {
            return false;
        }
        if let Some(user_id) = self.user_id {
            if entry.by_user_id != Some(user_id) && entry.to_user_id != Some(user_id) {
                return false;
            }
        }
        if self.from.is_some_and(|from| entry.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| entry.created_at > to) {
            return false;
        }
        true
    }
}
