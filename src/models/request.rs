// src/models/request.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Pedido de um membro por um ativo ou licença
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "requested_resource", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestedResource {
    Asset,
    License,
}

impl RequestedResource {
    /// Nome usado no `NotFound`.
    pub fn label(self) -> &'static str {
        match self {
            RequestedResource::Asset => "Ativo",
            RequestedResource::License => "Licença",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub requested_by: Uuid,
    pub resource_type: RequestedResource,
    pub resource_id: Option<Uuid>,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub requested_by: Uuid,
    pub resource_type: RequestedResource,
    pub resource_id: Option<Uuid>,
    pub reason: Option<String>,
}

/// Decisão sobre um pedido pendente.
#[derive(Debug, Clone, Copy)]
pub struct RequestDecision {
    pub status: RequestStatus,
    pub decided_by: Uuid,
}
