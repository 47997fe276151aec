// src/services/policy.rs

//! Tabela de papéis mínimos por ação.
//!
//! Toda mutação privilegiada chama `authorize` com o `TenantContext` já
//! verificado; as duas regras que dependem do alvo (troca de papel e
//! remoção de membro) têm funções próprias.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    middleware::tenancy::TenantContext,
    models::organization::MemberRole,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageAssets,
    ManageLicenses,
    RevealLicenseKey,
    ImportData,
    InviteMembers,
    ManageInvites,
    ChangeMemberRole,
    RemoveMember,
    RenameOrganization,
    UpdateOrganizationSettings,
    DeleteOrganization,
    DecideRequests,
    ViewAuditLog,
}

impl Action {
    pub fn minimum_role(self) -> MemberRole {
        match self {
            Action::ChangeMemberRole | Action::RenameOrganization | Action::DeleteOrganization => {
                MemberRole::Owner
            }
            Action::ManageAssets
            | Action::ManageLicenses
            | Action::RevealLicenseKey
            | Action::ImportData
            | Action::InviteMembers
            | Action::ManageInvites
            | Action::RemoveMember
            | Action::UpdateOrganizationSettings
            | Action::DecideRequests
            | Action::ViewAuditLog => MemberRole::Admin,
        }
    }
}

pub fn authorize(ctx: &TenantContext, action: Action) -> Result<(), AppError> {
    if ctx.role().at_least(action.minimum_role()) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %ctx.user_id(),
            organization_id = %ctx.organization_id(),
            ?action,
            "Ação negada pelo papel"
        );
        Err(AppError::AuthorizationDenied)
    }
}

/// Só o dono troca papéis, nunca o próprio, e um dono não é rebaixado por aqui.
pub fn check_role_change(
    ctx: &TenantContext,
    target_user_id: Uuid,
    target_current_role: MemberRole,
) -> Result<(), AppError> {
    authorize(ctx, Action::ChangeMemberRole)?;
    if target_user_id == ctx.user_id() || target_current_role == MemberRole::Owner {
        return Err(AppError::AuthorizationDenied);
    }
    Ok(())
}

/// Sair da organização é permitido a quem não é dono; remover outro exige
/// admin e o alvo não pode ser dono.
pub fn check_removal(
    ctx: &TenantContext,
    target_user_id: Uuid,
    target_role: MemberRole,
) -> Result<(), AppError> {
    if target_user_id == ctx.user_id() {
        return match ctx.role() {
            MemberRole::Owner => Err(AppError::AuthorizationDenied),
            _ => Ok(()),
        };
    }
    authorize(ctx, Action::RemoveMember)?;
    if target_role == MemberRole::Owner {
        return Err(AppError::AuthorizationDenied);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: MemberRole) -> TenantContext {
        TenantContext::for_tests(Uuid::new_v4(), Uuid::new_v4(), role)
    }

    #[test]
    fn members_cannot_mutate_inventory() {
        let member = ctx(MemberRole::Member);
        for action in [
            Action::ManageAssets,
            Action::ManageLicenses,
            Action::RevealLicenseKey,
            Action::InviteMembers,
        ] {
            assert!(matches!(
                authorize(&member, action),
                Err(AppError::AuthorizationDenied)
            ));
        }
        assert!(authorize(&ctx(MemberRole::Admin), Action::ManageAssets).is_ok());
    }

    #[test]
    fn owner_only_actions() {
        let admin = ctx(MemberRole::Admin);
        let owner = ctx(MemberRole::Owner);
        assert!(authorize(&admin, Action::RenameOrganization).is_err());
        assert!(authorize(&admin, Action::DeleteOrganization).is_err());
        assert!(authorize(&admin, Action::UpdateOrganizationSettings).is_ok());
        assert!(authorize(&owner, Action::RenameOrganization).is_ok());
        assert!(authorize(&owner, Action::DeleteOrganization).is_ok());
    }

    #[test]
    fn role_changes_are_owner_only_and_never_on_self_or_owners() {
        let owner = ctx(MemberRole::Owner);
        let other = Uuid::new_v4();
        assert!(check_role_change(&owner, other, MemberRole::Member).is_ok());
        assert!(check_role_change(&owner, owner.user_id(), MemberRole::Owner).is_err());
        assert!(check_role_change(&owner, other, MemberRole::Owner).is_err());
        assert!(check_role_change(&ctx(MemberRole::Admin), other, MemberRole::Member).is_err());
    }

    #[test]
    fn removal_rules() {
        let admin = ctx(MemberRole::Admin);
        let owner = ctx(MemberRole::Owner);
        let member = ctx(MemberRole::Member);
        let other = Uuid::new_v4();

        // Sair
        assert!(check_removal(&member, member.user_id(), MemberRole::Member).is_ok());
        assert!(check_removal(&admin, admin.user_id(), MemberRole::Admin).is_ok());
        assert!(check_removal(&owner, owner.user_id(), MemberRole::Owner).is_err());

        // Remover outro
        assert!(check_removal(&admin, other, MemberRole::Member).is_ok());
        assert!(check_removal(&admin, other, MemberRole::Owner).is_err());
        assert!(check_removal(&owner, other, MemberRole::Owner).is_err());
        assert!(check_removal(&member, other, MemberRole::Member).is_err());
    }
}
