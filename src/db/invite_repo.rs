// src/db/invite_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{begin_for_organization, begin_scoped, map_unique_violation},
        error::AppError,
    },
    db::{
        membership_repo::MEMBERSHIP_COLUMNS, repository::InviteRepository,
        subscription_repo::admit_locked,
    },
    middleware::tenancy::TenantContext,
    models::{
        invite::{AcceptOutcome, Invite, InviteState, NewInvite},
        organization::Membership,
        subscription::ResourceKind,
    },
};

const INVITE_COLUMNS: &str =
    "id, organization_id, email, role, invited_by, token, expires_at, accepted_at, created_at";

#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn create_invite(&self, ctx: &TenantContext, input: NewInvite) -> Result<Invite, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        // O índice parcial (organization_id, email) WHERE accepted_at IS NULL
        // garante um único convite em aberto por e-mail.
        let invite = sqlx::query_as::<_, Invite>(&format!(
            r#"
            INSERT INTO invites (organization_id, email, role, invited_by, token, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(ctx.organization_id())
        .bind(&input.email)
        .bind(input.role)
        .bind(input.invited_by)
        .bind(&input.token)
        .bind(input.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um convite pendente para este e-mail."))?;
        tx.commit().await?;
        Ok(invite)
    }

    async fn list_invites(&self, ctx: &TenantContext) -> Result<Vec<Invite>, AppError> {
        let invites = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE organization_id = $1 ORDER BY created_at DESC"
        ))
        .bind(ctx.organization_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(invites)
    }

    async fn find_unaccepted_for_email(
        &self,
        ctx: &TenantContext,
        email: &str,
    ) -> Result<Option<Invite>, AppError> {
        let invite = sqlx::query_as::<_, Invite>(&format!(
            r#"
            SELECT {INVITE_COLUMNS} FROM invites
            WHERE organization_id = $1 AND email = $2 AND accepted_at IS NULL
            "#
        ))
        .bind(ctx.organization_id())
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invite>, AppError> {
        let invite = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    async fn delete_unaccepted(&self, ctx: &TenantContext, invite_id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let result = sqlx::query(
            "DELETE FROM invites WHERE id = $1 AND organization_id = $2 AND accepted_at IS NULL",
        )
        .bind(invite_id)
        .bind(ctx.organization_id())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn accept(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AcceptOutcome, AppError> {
        let current = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE id = $1"
        ))
        .bind(invite_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Convite"))?;

        let mut tx = begin_for_organization(&self.pool, current.organization_id, Some(user_id)).await?;

        // 1. Consome o token. Só um aceite concorrente consegue esta linha.
        let consumed = sqlx::query_as::<_, Invite>(&format!(
            r#"
            UPDATE invites SET accepted_at = $2
            WHERE id = $1 AND accepted_at IS NULL AND expires_at > $2
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(invite_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invite) = consumed else {
            return Err(match current.state(now) {
                InviteState::Expired => AppError::InviteExpired,
                _ => AppError::InviteAlreadyUsed,
            });
        };

        // 2. Já é membro? O convite fica consumido e o papel atual é mantido.
        let existing = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS} FROM memberships
            WHERE organization_id = $1 AND user_id = $2
            FOR UPDATE
            "#
        ))
        .bind(invite.organization_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(membership) = existing {
            tx.commit().await?;
            return Ok(AcceptOutcome {
                membership,
                already_member: true,
            });
        }

        // 3. Teto de membros, com a assinatura travada
        admit_locked(&mut tx, invite.organization_id, ResourceKind::Member).await?;

        // 4. O vínculo
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            INSERT INTO memberships (organization_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(invite.organization_id)
        .bind(user_id)
        .bind(invite.role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AcceptOutcome {
            membership,
            already_member: false,
        })
    }
}
