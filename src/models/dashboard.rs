// src/models/dashboard.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{asset::StatusCount, subscription::PlanUsage};

// Os cards do topo do painel da organização
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub usage: PlanUsage,
    pub assets_by_status: Vec<StatusCount>,
    pub licenses_expiring_soon: i64, // Vencem nos próximos 30 dias
    pub pending_requests: i64,
}
