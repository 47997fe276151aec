// src/services/organization_service.rs

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::OrganizationRepository,
    middleware::tenancy::TenantContext,
    models::{
        audit::{AuditResource, NewAuditEntry},
        organization::{
            slugify, NewOrganization, Organization, OrganizationChanges, OrganizationWithRole,
        },
    },
    services::{
        audit_service::AuditService,
        policy::{self, Action},
    },
};

// Tentativas com sufixo numérico antes de cair no sufixo aleatório
const SLUG_ATTEMPTS: u32 = 20;

#[derive(Clone)]
pub struct OrganizationService {
    organizations: Arc<dyn OrganizationRepository>,
    audit: AuditService,
}

impl OrganizationService {
    pub fn new(organizations: Arc<dyn OrganizationRepository>, audit: AuditService) -> Self {
        Self {
            organizations,
            audit,
        }
    }

    /// Cria a organização com o usuário como dono, no plano free.
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        settings: Option<serde_json::Value>,
    ) -> Result<Organization, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("O nome da organização é obrigatório.".into()));
        }
        let settings = ensure_object(settings.unwrap_or_else(|| json!({})))?;

        let slug = self.available_slug(name).await?;
        let organization = self
            .organizations
            .create_with_owner(
                NewOrganization {
                    name: name.to_string(),
                    slug,
                    settings,
                },
                owner_id,
            )
            .await?;

        tracing::info!(organization_id = %organization.id, %owner_id, "Organização criada");

        self.audit
            .record(
                NewAuditEntry::new(
                    organization.id,
                    AuditResource::Organization,
                    Some(organization.id),
                    "organization.created",
                )
                .by(owner_id)
                .with_metadata(json!({ "name": organization.name, "slug": organization.slug })),
            )
            .await?;

        Ok(organization)
    }

    async fn available_slug(&self, name: &str) -> Result<String, AppError> {
        let base = slugify(name);
        if !self.organizations.slug_exists(&base).await? {
            return Ok(base);
        }
        for n in 2..=SLUG_ATTEMPTS {
            let candidate = format!("{base}-{n}");
            if !self.organizations.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        let suffix = Uuid::new_v4().simple().to_string();
        Ok(format!("{base}-{}", &suffix[..8]))
    }

    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<OrganizationWithRole>, AppError> {
        self.organizations.list_for_user(user_id).await
    }

    pub async fn get(&self, ctx: &TenantContext) -> Result<Organization, AppError> {
        self.organizations.get_organization(ctx).await
    }

    /// Nome exige dono; configurações exigem admin.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        changes: OrganizationChanges,
    ) -> Result<Organization, AppError> {
        if changes.name.is_some() {
            policy::authorize(ctx, Action::RenameOrganization)?;
        }
        if changes.settings.is_some() {
            policy::authorize(ctx, Action::UpdateOrganizationSettings)?;
        }
        if changes.name.is_none() && changes.settings.is_none() {
            return Err(AppError::Validation("Nada para atualizar.".into()));
        }

        let name = match changes.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::Validation(
                    "O nome da organização é obrigatório.".into(),
                ))
            }
            other => other.map(|n| n.trim().to_string()),
        };
        let settings = changes.settings.map(ensure_object).transpose()?;
        let metadata = json!({
            "name": name.is_some(),
            "settings": settings.is_some(),
        });

        let organization = self
            .organizations
            .update_organization(ctx, OrganizationChanges { name, settings })
            .await?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Organization,
                    Some(ctx.organization_id()),
                    "organization.updated",
                )
                .by(ctx.user_id())
                .with_metadata(json!({ "changed": metadata })),
            )
            .await?;

        Ok(organization)
    }

    // A trilha de auditoria vai junto no cascade; fica o log.
    pub async fn delete(&self, ctx: &TenantContext) -> Result<(), AppError> {
        policy::authorize(ctx, Action::DeleteOrganization)?;
        self.organizations.delete_organization(ctx).await?;
        tracing::info!(
            organization_id = %ctx.organization_id(),
            user_id = %ctx.user_id(),
            "Organização excluída"
        );
        Ok(())
    }
}

fn ensure_object(value: serde_json::Value) -> Result<serde_json::Value, AppError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(AppError::Validation(
            "As configurações devem ser um objeto JSON.".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organization::MemberRole;
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn creator_becomes_owner_on_the_free_plan() {
        let fx = Fixture::new();
        let ana = fx.user("ana@acme.com").await;
        let org = fx
            .state
            .organization_service
            .create(ana.id, "Acme Corp", None)
            .await
            .unwrap();
        assert_eq!(org.slug, "acme-corp");

        let ctx = fx.state.tenancy_service.resolve(ana.id, org.id).await.unwrap();
        assert_eq!(ctx.role(), MemberRole::Owner);

        let sub = fx.state.plan_service.subscription(&ctx).await.unwrap();
        assert_eq!(sub.plan, crate::models::subscription::Plan::Free);
        assert!(sub.is_active());
        assert_eq!(fx.store.audit_actions(org.id).await, vec!["organization.created"]);
    }

    #[tokio::test]
    async fn slug_collisions_get_a_suffix() {
        let fx = Fixture::new();
        let ana = fx.user("ana@acme.com").await;
        let svc = &fx.state.organization_service;
        let first = svc.create(ana.id, "Acme", None).await.unwrap();
        let second = svc.create(ana.id, "ACME", None).await.unwrap();
        assert_eq!(first.slug, "acme");
        assert_eq!(second.slug, "acme-2");
    }

    #[tokio::test]
    async fn rename_is_owner_only_but_admins_edit_settings() {
        let fx = Fixture::new();
        let (org, _owner) = fx.organization("Acme").await;
        let admin = fx.member(org.id, "admin@acme.com", MemberRole::Admin).await;
        let svc = &fx.state.organization_service;

        let rename = OrganizationChanges {
            name: Some("Nova".into()),
            settings: None,
        };
        assert!(matches!(
            svc.update(&admin, rename).await,
            Err(AppError::AuthorizationDenied)
        ));

        let settings = OrganizationChanges {
            name: None,
            settings: Some(json!({ "timezone": "America/Sao_Paulo" })),
        };
        let updated = svc.update(&admin, settings).await.unwrap();
        assert_eq!(updated.settings["timezone"], "America/Sao_Paulo");
        assert_eq!(updated.name, "Acme");
    }

    #[tokio::test]
    async fn settings_must_be_an_object() {
        let fx = Fixture::new();
        let (_org, owner) = fx.organization("Acme").await;
        let changes = OrganizationChanges {
            name: None,
            settings: Some(json!([1, 2, 3])),
        };
        assert!(matches!(
            fx.state.organization_service.update(&owner, changes).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_the_owner_deletes() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let admin = fx.member(org.id, "admin@acme.com", MemberRole::Admin).await;
        let svc = &fx.state.organization_service;

        assert!(matches!(svc.delete(&admin).await, Err(AppError::AuthorizationDenied)));
        svc.delete(&owner).await.unwrap();
        assert!(!fx
            .state
            .tenancy_service
            .is_member(owner.user_id(), org.id)
            .await
            .unwrap());
    }
}
