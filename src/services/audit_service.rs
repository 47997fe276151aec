// src/services/audit_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    common::error::AppError,
    db::repository::{AuditRepository, SubscriptionRepository},
    middleware::tenancy::TenantContext,
    models::{
        audit::{AuditFilter, AuditLogEntry, NewAuditEntry},
        subscription::Feature,
    },
    services::policy::{self, Action},
};

const EXPORT_HEADER: [&str; 7] = [
    "timestamp",
    "resource_type",
    "resource_id",
    "action",
    "by_user_id",
    "to_user_id",
    "metadata",
];

#[derive(Clone)]
pub struct AuditService {
    audit: Arc<dyn AuditRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl AuditService {
    pub fn new(
        audit: Arc<dyn AuditRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            audit,
            subscriptions,
        }
    }

    /// Chamado pelos serviços depois de cada mutação bem-sucedida.
    pub async fn record(&self, entry: NewAuditEntry) -> Result<(), AppError> {
        self.audit.append(entry).await?;
        Ok(())
    }

    // Leitura: admin + recurso audit_log no plano
    async fn ensure_readable(&self, ctx: &TenantContext) -> Result<(), AppError> {
        policy::authorize(ctx, Action::ViewAuditLog)?;
        let subscription = self.subscriptions.get_subscription(ctx).await?;
        if !subscription.has_feature(Feature::AuditLog) {
            return Err(AppError::FeatureNotAvailable(Feature::AuditLog));
        }
        Ok(())
    }

    pub async fn list(&self, ctx: &TenantContext, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, AppError> {
        self.ensure_readable(ctx).await?;
        self.audit.list_entries(ctx, filter).await
    }

    /// Devolve (nome do arquivo, conteúdo CSV). Ignora `limit`/`offset`.
    pub async fn export_csv(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
    ) -> Result<(String, String), AppError> {
        self.ensure_readable(ctx).await?;
        let entries = self.audit.export_entries(ctx, filter).await?;
        let body = entries_to_csv(&entries)?;
        Ok((export_filename(Utc::now()), body))
    }
}

pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("audit-log-{}.csv", now.format("%Y-%m-%d"))
}

/// Aspas conforme RFC 4180 (o `csv::Writer` cuida disso).
pub fn entries_to_csv(entries: &[AuditLogEntry]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADER)
        .map_err(anyhow::Error::from)?;

    let opt = |id: Option<uuid::Uuid>| id.map(|v| v.to_string()).unwrap_or_default();
    for entry in entries {
        writer
            .write_record([
                entry.created_at.to_rfc3339(),
                entry.resource_type.clone(),
                opt(entry.resource_id),
                entry.action.clone(),
                opt(entry.by_user_id),
                opt(entry.to_user_id),
                entry.metadata.to_string(),
            ])
            .map_err(anyhow::Error::from)?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    String::from_utf8(bytes).map_err(|e| AppError::InternalServerError(e.into()))
}
