// src/db/license_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped, error::AppError},
    db::{repository::LicenseRepository, subscription_repo::admit_locked},
    middleware::tenancy::TenantContext,
    models::{
        asset::Assignment,
        license::{mask_key, License, LicenseChanges, LicenseStatus, NewLicense},
        subscription::ResourceKind,
    },
};

// Nenhuma projeção de licença toca `license_secrets`.
const LICENSE_COLUMNS: &str = "id, organization_id, product, masked_key, status, \
     assignee_user_id, expires_at, notes, created_at, updated_at";

#[derive(Clone)]
pub struct PgLicenseRepository {
    pool: PgPool,
}

impl PgLicenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenseRepository for PgLicenseRepository {
    async fn list_licenses(&self, ctx: &TenantContext) -> Result<Vec<License>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let licenses = sqlx::query_as::<_, License>(&format!(
            "SELECT {LICENSE_COLUMNS} FROM licenses WHERE organization_id = $1 ORDER BY product ASC"
        ))
        .bind(ctx.organization_id())
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(licenses)
    }

    async fn get_license(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<License>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let license = sqlx::query_as::<_, License>(&format!(
            "SELECT {LICENSE_COLUMNS} FROM licenses WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(license)
    }

    async fn create_license(&self, ctx: &TenantContext, input: NewLicense) -> Result<License, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;

        // 1. Limite do plano
        admit_locked(&mut tx, ctx.organization_id(), ResourceKind::License).await?;

        // 2. A linha pública, só com a máscara
        let license = sqlx::query_as::<_, License>(&format!(
            r#"
            INSERT INTO licenses (organization_id, product, masked_key, status, expires_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LICENSE_COLUMNS}
            "#
        ))
        .bind(ctx.organization_id())
        .bind(&input.product)
        .bind(input.masked_key())
        .bind(LicenseStatus::Available)
        .bind(input.expires_at)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        // 3. A chave completa, em tabela separada
        sqlx::query(
            "INSERT INTO license_secrets (license_id, organization_id, full_key) VALUES ($1, $2, $3)",
        )
        .bind(license.id)
        .bind(ctx.organization_id())
        .bind(&input.full_key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(license)
    }

    async fn update_license(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        changes: LicenseChanges,
    ) -> Result<Option<License>, AppError> {
        let masked = changes.full_key.as_deref().map(mask_key);

        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let license = sqlx::query_as::<_, License>(&format!(
            r#"
            UPDATE licenses SET
                product = COALESCE($3, product),
                masked_key = COALESCE($4, masked_key),
                status = COALESCE($5, status),
                expires_at = COALESCE($6, expires_at),
                notes = COALESCE($7, notes),
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {LICENSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .bind(changes.product)
        .bind(masked)
        .bind(changes.status)
        .bind(changes.expires_at)
        .bind(changes.notes)
        .fetch_optional(&mut *tx)
        .await?;

        if let (Some(_), Some(full_key)) = (&license, &changes.full_key) {
            sqlx::query("UPDATE license_secrets SET full_key = $2 WHERE license_id = $1")
                .bind(id)
                .bind(full_key)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(license)
    }

    async fn set_license_assignee(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignment: Assignment,
    ) -> Result<Option<License>, AppError> {
        let status = match assignment.assignee_user_id {
            Some(_) => LicenseStatus::Assigned,
            None => LicenseStatus::Available,
        };

        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let license = sqlx::query_as::<_, License>(&format!(
            r#"
            UPDATE licenses SET assignee_user_id = $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {LICENSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .bind(assignment.assignee_user_id)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(license)
    }

    // license_secrets sai junto (ON DELETE CASCADE)
    async fn delete_license(&self, ctx: &TenantContext, id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let result = sqlx::query("DELETE FROM licenses WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(ctx.organization_id())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_licenses(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM licenses WHERE organization_id = $1")
                .bind(ctx.organization_id())
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;
        Ok(count)
    }

    async fn count_expiring_before(&self, ctx: &TenantContext, date: NaiveDate) -> Result<i64, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM licenses
            WHERE organization_id = $1
              AND expires_at IS NOT NULL
              AND expires_at >= CURRENT_DATE
              AND expires_at <= $2
            "#,
        )
        .bind(ctx.organization_id())
        .bind(date)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(count)
    }

    async fn reveal_full_key(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<String>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let key: Option<String> = sqlx::query_scalar(
            "SELECT full_key FROM license_secrets WHERE license_id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(ctx.organization_id())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(key)
    }
}
