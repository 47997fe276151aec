// src/services/invite_service.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::RngCore;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::{InviteRepository, MembershipRepository, UserRepository},
    middleware::tenancy::TenantContext,
    models::{
        audit::{AuditResource, NewAuditEntry},
        auth::{normalize_email, User},
        invite::{AcceptOutcome, InviteCreated, InviteState, InviteView, NewInvite},
        organization::MemberRole,
        subscription::ResourceKind,
    },
    services::{
        audit_service::AuditService,
        plan_service::PlanService,
        policy::{self, Action},
    },
};

const TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct InviteService {
    invites: Arc<dyn InviteRepository>,
    memberships: Arc<dyn MembershipRepository>,
    users: Arc<dyn UserRepository>,
    plan: PlanService,
    audit: AuditService,
    ttl: Duration,
}

impl InviteService {
    pub fn new(
        invites: Arc<dyn InviteRepository>,
        memberships: Arc<dyn MembershipRepository>,
        users: Arc<dyn UserRepository>,
        plan: PlanService,
        audit: AuditService,
        ttl: Duration,
    ) -> Self {
        Self {
            invites,
            memberships,
            users,
            plan,
            audit,
            ttl,
        }
    }

    pub async fn create(
        &self,
        ctx: &TenantContext,
        email: &str,
        role: MemberRole,
    ) -> Result<InviteCreated, AppError> {
        policy::authorize(ctx, Action::InviteMembers)?;

        // 1. Convite nunca cria dono
        if role == MemberRole::Owner {
            return Err(AppError::Validation(
                "O papel do convite deve ser admin ou member.".into(),
            ));
        }
        let email = normalize_email(email);

        // 2. Já é membro?
        if let Some(user) = self.users.find_by_email(&email).await? {
            if self
                .memberships
                .find_membership(ctx.organization_id(), user.id)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict("Este usuário já é membro.".into()));
            }
        }

        // 3. Um convite em aberto por e-mail; o expirado dá lugar ao novo
        let now = Utc::now();
        if let Some(existing) = self.invites.find_unaccepted_for_email(ctx, &email).await? {
            if existing.state(now) == InviteState::Pending {
                return Err(AppError::Conflict(
                    "Já existe um convite pendente para este e-mail.".into(),
                ));
            }
            self.invites.delete_unaccepted(ctx, existing.id).await?;
        }

        // 4. Aviso antecipado de teto; a trava real está no aceite
        self.plan.admit(ctx, ResourceKind::Member).await?;

        let token = generate_token();
        let invite = self
            .invites
            .create_invite(
                ctx,
                NewInvite {
                    email,
                    role,
                    invited_by: ctx.user_id(),
                    token: token.clone(),
                    expires_at: now + self.ttl,
                },
            )
            .await?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Invite,
                    Some(invite.id),
                    "member.invited",
                )
                .by(ctx.user_id())
                .with_metadata(json!({ "email": invite.email, "role": invite.role })),
            )
            .await?;

        Ok(InviteCreated { invite, token })
    }

    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<InviteView>, AppError> {
        policy::authorize(ctx, Action::ManageInvites)?;
        let now = Utc::now();
        Ok(self
            .invites
            .list_invites(ctx)
            .await?
            .into_iter()
            .map(|invite| InviteView {
                state: invite.state(now),
                invite,
            })
            .collect())
    }

    pub async fn revoke(&self, ctx: &TenantContext, invite_id: Uuid) -> Result<(), AppError> {
        policy::authorize(ctx, Action::ManageInvites)?;
        if !self.invites.delete_unaccepted(ctx, invite_id).await? {
            return Err(AppError::NotFound("Convite"));
        }
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Invite,
                    Some(invite_id),
                    "invite.revoked",
                )
                .by(ctx.user_id()),
            )
            .await
    }

    /// O token é a credencial; o e-mail do usuário logado precisa bater.
    pub async fn accept(&self, user: &User, token: &str) -> Result<AcceptOutcome, AppError> {
        let invite = self
            .invites
            .find_by_token(token.trim())
            .await?
            .ok_or(AppError::NotFound("Convite"))?;

        let now = Utc::now();
        invite.check_acceptance(&user.email, now)?;

        let outcome = self.invites.accept(invite.id, user.id, now).await?;

        tracing::info!(
            organization_id = %invite.organization_id,
            user_id = %user.id,
            already_member = outcome.already_member,
            "Convite aceito"
        );

        self.audit
            .record(
                NewAuditEntry::new(
                    invite.organization_id,
                    AuditResource::Invite,
                    Some(invite.id),
                    "invite.accepted",
                )
                .by(user.id)
                .to(Some(user.id))
                .with_metadata(json!({
                    "role": outcome.membership.role,
                    "alreadyMember": outcome.already_member,
                })),
            )
            .await?;

        Ok(outcome)
    }
}

/// 32 bytes aleatórios, em hexadecimal.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
