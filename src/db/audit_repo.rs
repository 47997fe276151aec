// src/db/audit_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::{
        db_utils::{begin_for_organization, begin_scoped},
        error::AppError,
    },
    db::repository::AuditRepository,
    middleware::tenancy::TenantContext,
    models::audit::{AuditFilter, AuditLogEntry, NewAuditEntry},
};

const AUDIT_COLUMNS: &str = "id, organization_id, resource_type, resource_id, action, \
     by_user_id, to_user_id, metadata, created_at";

// Só INSERT e SELECT: a trilha é imutável.
#[derive(Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        let mut tx =
            begin_for_organization(&self.pool, entry.organization_id, entry.by_user_id).await?;
        let row = sqlx::query_as::<_, AuditLogEntry>(&format!(
            r#"
            INSERT INTO audit_logs
                (organization_id, resource_type, resource_id, action, by_user_id, to_user_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {AUDIT_COLUMNS}
            "#
        ))
        .bind(entry.organization_id)
        .bind(entry.resource_type.as_str())
        .bind(entry.resource_id)
        .bind(entry.action)
        .bind(entry.by_user_id)
        .bind(entry.to_user_id)
        .bind(&entry.metadata)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_entries(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        self.select_entries(ctx, filter, Some(filter.page_size()), filter.page_offset())
            .await
    }

    async fn export_entries(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        self.select_entries(ctx, filter, None, 0).await
    }
}

impl PgAuditRepository {
    // LIMIT NULL equivale a LIMIT ALL no Postgres
    async fn select_entries(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let entries = sqlx::query_as::<_, AuditLogEntry>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS} FROM audit_logs
            WHERE organization_id = $1
              AND ($2::text IS NULL OR resource_type = $2)
              AND ($3::text IS NULL OR action = $3)
              AND ($4::uuid IS NULL OR by_user_id = $4 OR to_user_id = $4)
              AND ($5::timestamptz IS NULL OR created_at >= $5)
              AND ($6::timestamptz IS NULL OR created_at <= $6)
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(ctx.organization_id())
        .bind(filter.resource_type.map(|r| r.as_str()))
        .bind(filter.action.as_deref())
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(entries)
    }
}
