// src/db/membership_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped, error::AppError},
    db::repository::MembershipRepository,
    middleware::tenancy::TenantContext,
    models::organization::{MemberRole, MemberView, Membership},
};

pub(crate) const MEMBERSHIP_COLUMNS: &str = "id, organization_id, user_id, role, created_at";

#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    /// Verifica se um utilizador tem vínculo com a organização.
    /// Esta é a verificação de segurança de autorização mais importante.
    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE organization_id = $1 AND user_id = $2"
        ))
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn list_members(&self, ctx: &TenantContext) -> Result<Vec<MemberView>, AppError> {
        let members = sqlx::query_as::<_, MemberView>(
            r#"
            SELECT u.id AS user_id, u.email, u.full_name, m.role, m.created_at AS joined_at
            FROM memberships m
            INNER JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(ctx.organization_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn count_members(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE organization_id = $1")
                .bind(ctx.organization_id())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn update_role(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Membership>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships SET role = $3
            WHERE organization_id = $1 AND user_id = $2
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(ctx.organization_id())
        .bind(user_id)
        .bind(role)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(membership)
    }

    async fn delete_membership(&self, ctx: &TenantContext, user_id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let result =
            sqlx::query("DELETE FROM memberships WHERE organization_id = $1 AND user_id = $2")
                .bind(ctx.organization_id())
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        // Quem sai da organização devolve o que estava com ele
        for table in ["assets", "licenses"] {
            sqlx::query(&format!(
                r#"
                UPDATE {table}
                SET assignee_user_id = NULL,
                    status = CASE WHEN status = 'assigned' THEN 'available' ELSE status END,
                    updated_at = NOW()
                WHERE organization_id = $1 AND assignee_user_id = $2
                "#
            ))
            .bind(ctx.organization_id())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
