// src/models/billing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Evento do provedor de pagamentos (corpo do webhook).
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingEvent {
    #[schema(example = "started")]
    pub event: String,
    pub supporter_email: String,
    #[schema(example = "Pro")]
    pub tier: Option<String>,
    pub price: Option<f64>,
    pub subscription_id: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    /// false quando o evento não é reconhecido ou não há organização para ele
    pub applied: bool,
    pub organization_id: Option<Uuid>,
}

impl WebhookOutcome {
    pub fn ignored() -> Self {
        Self {
            applied: false,
            organization_id: None,
        }
    }
}
