// src/db/organization_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{begin_for_organization, begin_scoped, map_unique_violation},
        error::AppError,
    },
    db::repository::OrganizationRepository,
    middleware::tenancy::TenantContext,
    models::{
        organization::{
            MemberRole, NewOrganization, Organization, OrganizationChanges, OrganizationWithRole,
        },
        subscription::{Plan, SubscriptionStatus},
    },
};

const ORGANIZATION_COLUMNS: &str = "id, name, slug, settings, created_at, updated_at";

#[derive(Clone)]
pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    /// Cria a organização, o vínculo do dono e a assinatura inicial.
    async fn create_with_owner(
        &self,
        input: NewOrganization,
        owner_id: Uuid,
    ) -> Result<Organization, AppError> {
        let organization_id = Uuid::new_v4();
        let mut tx = begin_for_organization(&self.pool, organization_id, Some(owner_id)).await?;

        // 1. A organização
        let organization = sqlx::query_as::<_, Organization>(&format!(
            r#"
            INSERT INTO organizations (id, name, slug, settings)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.settings)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe uma organização com este slug."))?;

        // 2. O criador é o dono
        sqlx::query("INSERT INTO memberships (organization_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(organization_id)
            .bind(owner_id)
            .bind(MemberRole::Owner)
            .execute(&mut *tx)
            .await?;

        // 3. Toda organização nasce no plano free, ativa
        sqlx::query("INSERT INTO subscriptions (organization_id, plan, status) VALUES ($1, $2, $3)")
            .bind(organization_id)
            .bind(Plan::Free)
            .bind(SubscriptionStatus::Active)
            .execute(&mut *tx)
            .await?;

        // 4. Tudo ou nada
        tx.commit().await?;
        Ok(organization)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM organizations WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get_organization(&self, ctx: &TenantContext) -> Result<Organization, AppError> {
        sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(ctx.organization_id())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Organização"))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrganizationWithRole>, AppError> {
        let rows = sqlx::query_as::<_, OrganizationWithRole>(
            r#"
            SELECT o.id, o.name, o.slug, o.settings, o.created_at, o.updated_at, m.role
            FROM organizations o
            INNER JOIN memberships m ON m.organization_id = o.id
            WHERE m.user_id = $1
            ORDER BY o.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_organization(
        &self,
        ctx: &TenantContext,
        changes: OrganizationChanges,
    ) -> Result<Organization, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let organization = sqlx::query_as::<_, Organization>(&format!(
            r#"
            UPDATE organizations SET
                name = COALESCE($2, name),
                settings = COALESCE($3, settings),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(ctx.organization_id())
        .bind(changes.name)
        .bind(changes.settings)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Organização"))?;
        tx.commit().await?;
        Ok(organization)
    }

    // As tabelas filhas têm ON DELETE CASCADE
    async fn delete_organization(&self, ctx: &TenantContext) -> Result<(), AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(ctx.organization_id())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Organização"));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_first_owned_by(&self, user_id: Uuid) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.slug, o.settings, o.created_at, o.updated_at
            FROM organizations o
            INNER JOIN memberships m ON m.organization_id = o.id
            WHERE m.user_id = $1 AND m.role = 'owner'
            ORDER BY o.created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(organization)
    }
}
