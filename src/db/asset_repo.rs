// src/db/asset_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{begin_scoped, map_unique_violation},
        error::AppError,
    },
    db::{repository::AssetRepository, subscription_repo::admit_locked},
    middleware::tenancy::TenantContext,
    models::{
        asset::{Asset, AssetChanges, AssetFilter, AssetStatus, Assignment, NewAsset, StatusCount},
        subscription::ResourceKind,
    },
};

const ASSET_COLUMNS: &str = "id, organization_id, name, category, serial_number, location, \
     notes, status, assignee_user_id, created_at, updated_at";

const DUPLICATE_SERIAL: &str = "Já existe um ativo com este número de série.";

#[derive(Clone)]
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    // ---
    // Leitura
    // ---
    // O filtro por organization_id é explícito mesmo com RLS ativo.

    async fn list_assets(&self, ctx: &TenantContext, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let assets = sqlx::query_as::<_, Asset>(&format!(
            r#"
            SELECT {ASSET_COLUMNS} FROM assets
            WHERE organization_id = $1
              AND ($2::asset_status IS NULL OR status = $2)
              AND ($3::asset_category IS NULL OR category = $3)
              AND ($4::text IS NULL OR name ILIKE $4 OR serial_number ILIKE $4)
            ORDER BY name ASC
            "#
        ))
        .bind(ctx.organization_id())
        .bind(filter.status)
        .bind(filter.category)
        .bind(search)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(assets)
    }

    async fn get_asset(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<Asset>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(asset)
    }

    async fn count_assets(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets WHERE organization_id = $1")
            .bind(ctx.organization_id())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(count)
    }

    async fn count_assets_by_status(&self, ctx: &TenantContext) -> Result<Vec<StatusCount>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let counts = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count FROM assets
            WHERE organization_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(ctx.organization_id())
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(counts)
    }

    // ---
    // Escrita (transacional)
    // ---

    async fn create_asset(&self, ctx: &TenantContext, input: NewAsset) -> Result<Asset, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;

        // 1. Limite do plano, com a assinatura travada
        admit_locked(&mut tx, ctx.organization_id(), ResourceKind::Asset).await?;

        // 2. Insere
        let asset = sqlx::query_as::<_, Asset>(&format!(
            r#"
            INSERT INTO assets (organization_id, name, category, serial_number, location, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(ctx.organization_id())
        .bind(&input.name)
        .bind(input.category)
        .bind(&input.serial_number)
        .bind(&input.location)
        .bind(&input.notes)
        .bind(AssetStatus::Available)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_SERIAL))?;

        tx.commit().await?;
        Ok(asset)
    }

    async fn update_asset(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        changes: AssetChanges,
    ) -> Result<Option<Asset>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let asset = sqlx::query_as::<_, Asset>(&format!(
            r#"
            UPDATE assets SET
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                serial_number = COALESCE($5, serial_number),
                location = COALESCE($6, location),
                notes = COALESCE($7, notes),
                status = COALESCE($8, status),
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .bind(changes.name)
        .bind(changes.category)
        .bind(changes.serial_number)
        .bind(changes.location)
        .bind(changes.notes)
        .bind(changes.status)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_SERIAL))?;
        tx.commit().await?;
        Ok(asset)
    }

    async fn set_asset_assignee(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignment: Assignment,
    ) -> Result<Option<Asset>, AppError> {
        let status = match assignment.assignee_user_id {
            Some(_) => AssetStatus::Assigned,
            None => AssetStatus::Available,
        };

        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let asset = sqlx::query_as::<_, Asset>(&format!(
            r#"
            UPDATE assets SET assignee_user_id = $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .bind(assignment.assignee_user_id)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(asset)
    }

    async fn delete_asset(&self, ctx: &TenantContext, id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let result = sqlx::query("DELETE FROM assets WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(ctx.organization_id())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
