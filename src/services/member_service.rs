// src/services/member_service.rs

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::MembershipRepository,
    middleware::tenancy::TenantContext,
    models::{
        audit::{AuditResource, NewAuditEntry},
        organization::{MemberRole, MemberView, Membership},
    },
    services::{audit_service::AuditService, policy},
};

#[derive(Clone)]
pub struct MemberService {
    memberships: Arc<dyn MembershipRepository>,
    audit: AuditService,
}

impl MemberService {
    pub fn new(memberships: Arc<dyn MembershipRepository>, audit: AuditService) -> Self {
        Self { memberships, audit }
    }

    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<MemberView>, AppError> {
        self.memberships.list_members(ctx).await
    }

    async fn target(&self, ctx: &TenantContext, user_id: Uuid) -> Result<Membership, AppError> {
        self.memberships
            .find_membership(ctx.organization_id(), user_id)
            .await?
            .ok_or(AppError::NotFound("Membro"))
    }

    pub async fn change_role(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Membership, AppError> {
        // Quem não é dono recebe 403 antes de descobrir se o alvo existe
        policy::authorize(ctx, policy::Action::ChangeMemberRole)?;
        let target = self.target(ctx, user_id).await?;
        policy::check_role_change(ctx, user_id, target.role)?;

        let updated = self
            .memberships
            .update_role(ctx, user_id, role)
            .await?
            .ok_or(AppError::NotFound("Membro"))?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Member,
                    Some(updated.id),
                    "member.role_changed",
                )
                .by(ctx.user_id())
                .to(Some(user_id))
                .with_metadata(json!({ "from": target.role, "to": role })),
            )
            .await?;

        Ok(updated)
    }

    /// Remoção de outro membro ou saída voluntária (alvo == ator).
    pub async fn remove(&self, ctx: &TenantContext, user_id: Uuid) -> Result<(), AppError> {
        let leaving = user_id == ctx.user_id();
        if !leaving {
            policy::authorize(ctx, policy::Action::RemoveMember)?;
        }
        let target = self.target(ctx, user_id).await?;
        policy::check_removal(ctx, user_id, target.role)?;

        if !self.memberships.delete_membership(ctx, user_id).await? {
            return Err(AppError::NotFound("Membro"));
        }

        let action = if leaving { "member.left" } else { "member.removed" };
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Member,
                    Some(target.id),
                    action,
                )
                .by(ctx.user_id())
                .to(Some(user_id))
                .with_metadata(json!({ "role": target.role })),
            )
            .await?;

        Ok(())
    }

    pub async fn leave(&self, ctx: &TenantContext) -> Result<(), AppError> {
        self.remove(ctx, ctx.user_id()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            asset::{AssetCategory, AssetStatus, NewAsset},
            license::{LicenseStatus, NewLicense},
        },
        services::test_support::Fixture,
    };

    #[tokio::test]
    async fn owner_promotes_a_member() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;

        let updated = fx
            .state
            .member_service
            .change_role(&owner, bob.user_id(), MemberRole::Admin)
            .await
            .unwrap();
        assert_eq!(updated.role, MemberRole::Admin);
        assert!(fx
            .store
            .audit_actions(org.id)
            .await
            .contains(&"member.role_changed".to_string()));
    }

    #[tokio::test]
    async fn admins_cannot_change_roles_and_owners_cannot_be_demoted() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let admin = fx.member(org.id, "admin@acme.com", MemberRole::Admin).await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let svc = &fx.state.member_service;

        assert!(matches!(
            svc.change_role(&admin, bob.user_id(), MemberRole::Admin).await,
            Err(AppError::AuthorizationDenied)
        ));
        assert!(matches!(
            svc.change_role(&owner, owner.user_id(), MemberRole::Member).await,
            Err(AppError::AuthorizationDenied)
        ));
    }

    #[tokio::test]
    async fn admin_removes_members_but_never_owners() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let admin = fx.member(org.id, "admin@acme.com", MemberRole::Admin).await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let svc = &fx.state.member_service;

        assert!(matches!(
            svc.remove(&admin, owner.user_id()).await,
            Err(AppError::AuthorizationDenied)
        ));
        svc.remove(&admin, bob.user_id()).await.unwrap();
        assert!(!fx
            .state
            .tenancy_service
            .is_member(bob.user_id(), org.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn members_leave_but_owners_stay() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let svc = &fx.state.member_service;

        svc.leave(&bob).await.unwrap();
        assert!(matches!(svc.leave(&owner).await, Err(AppError::AuthorizationDenied)));
        assert!(fx
            .store
            .audit_actions(org.id)
            .await
            .contains(&"member.left".to_string()));
    }

    #[tokio::test]
    async fn plain_members_cannot_remove_others() {
        let fx = Fixture::new();
        let (org, _owner) = fx.organization("Acme").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let carol = fx.member(org.id, "carol@acme.com", MemberRole::Member).await;
        assert!(matches!(
            fx.state.member_service.remove(&bob, carol.user_id()).await,
            Err(AppError::AuthorizationDenied)
        ));
    }

    #[tokio::test]
    async fn removed_members_hand_back_what_they_held() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;

        let laptop = fx
            .state
            .asset_service
            .create(
                &owner,
                NewAsset {
                    name: "Notebook".into(),
                    category: AssetCategory::Laptop,
                    serial_number: None,
                    location: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        fx.state
            .asset_service
            .assign(&owner, laptop.id, Some(bob.user_id()))
            .await
            .unwrap();
        let office = fx
            .state
            .license_service
            .create(
                &owner,
                NewLicense {
                    product: "Office".into(),
                    full_key: "AAAA-BBBB-CCCC-DDDD".into(),
                    expires_at: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        fx.state
            .license_service
            .assign(&owner, office.id, Some(bob.user_id()))
            .await
            .unwrap();

        fx.state
            .member_service
            .remove(&owner, bob.user_id())
            .await
            .unwrap();

        let laptop = fx.state.asset_service.get(&owner, laptop.id).await.unwrap();
        assert_eq!(laptop.assignee_user_id, None);
        assert_eq!(laptop.status, AssetStatus::Available);
        let office = fx.state.license_service.get(&owner, office.id).await.unwrap();
        assert_eq!(office.assignee_user_id, None);
        assert_eq!(office.status, LicenseStatus::Available);
    }
}
