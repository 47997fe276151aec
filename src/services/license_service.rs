// src/services/license_service.rs

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::LicenseRepository,
    middleware::tenancy::TenantContext,
    models::{
        asset::Assignment,
        audit::{AuditResource, NewAuditEntry},
        license::{License, LicenseChanges, NewLicense, RevealedKey},
    },
    services::{
        asset_service::{ensure_member, trimmed},
        audit_service::AuditService,
        policy::{self, Action},
        tenancy_service::TenancyService,
    },
};

#[derive(Clone)]
pub struct LicenseService {
    licenses: Arc<dyn LicenseRepository>,
    tenancy: TenancyService,
    audit: AuditService,
}

impl LicenseService {
    pub fn new(
        licenses: Arc<dyn LicenseRepository>,
        tenancy: TenancyService,
        audit: AuditService,
    ) -> Self {
        Self {
            licenses,
            tenancy,
            audit,
        }
    }

    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<License>, AppError> {
        self.licenses.list_licenses(ctx).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> Result<License, AppError> {
        self.licenses
            .get_license(ctx, id)
            .await?
            .ok_or(AppError::NotFound("Licença"))
    }

    pub async fn create(&self, ctx: &TenantContext, input: NewLicense) -> Result<License, AppError> {
        policy::authorize(ctx, Action::ManageLicenses)?;
        let product = input.product.trim();
        let full_key = input.full_key.trim();
        if product.is_empty() || full_key.is_empty() {
            return Err(AppError::Validation(
                "Produto e chave da licença são obrigatórios.".into(),
            ));
        }
        let input = NewLicense {
            product: product.to_string(),
            full_key: full_key.to_string(),
            expires_at: input.expires_at,
            notes: trimmed(input.notes),
        };

        let license = self.licenses.create_license(ctx, input).await?;

        // Só a máscara entra na trilha
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::License,
                    Some(license.id),
                    "license.created",
                )
                .by(ctx.user_id())
                .with_metadata(json!({ "product": license.product, "maskedKey": license.masked_key })),
            )
            .await?;

        Ok(license)
    }

    pub async fn update(&self, ctx: &TenantContext, id: Uuid, changes: LicenseChanges) -> Result<License, AppError> {
        policy::authorize(ctx, Action::ManageLicenses)?;
        let key_rotated = changes.full_key.is_some();
        let changes = LicenseChanges {
            product: trimmed(changes.product),
            full_key: trimmed(changes.full_key),
            notes: trimmed(changes.notes),
            ..changes
        };

        let license = self
            .licenses
            .update_license(ctx, id, changes)
            .await?
            .ok_or(AppError::NotFound("Licença"))?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::License,
                    Some(license.id),
                    "license.updated",
                )
                .by(ctx.user_id())
                .with_metadata(json!({ "status": license.status, "keyRotated": key_rotated })),
            )
            .await?;

        Ok(license)
    }

    pub async fn assign(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignee_user_id: Option<Uuid>,
    ) -> Result<License, AppError> {
        policy::authorize(ctx, Action::ManageLicenses)?;
        ensure_member(&self.tenancy, ctx, assignee_user_id).await?;

        let license = self
            .licenses
            .set_license_assignee(ctx, id, Assignment { assignee_user_id })
            .await?
            .ok_or(AppError::NotFound("Licença"))?;

        let action = match assignee_user_id {
            Some(_) => "license.assigned",
            None => "license.unassigned",
        };
        self.audit
            .record(
                NewAuditEntry::new(ctx.organization_id(), AuditResource::License, Some(license.id), action)
                    .by(ctx.user_id())
                    .to(assignee_user_id),
            )
            .await?;

        Ok(license)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> Result<(), AppError> {
        policy::authorize(ctx, Action::ManageLicenses)?;
        if !self.licenses.delete_license(ctx, id).await? {
            return Err(AppError::NotFound("Licença"));
        }
        self.audit
            .record(
                NewAuditEntry::new(ctx.organization_id(), AuditResource::License, Some(id), "license.deleted")
                    .by(ctx.user_id()),
            )
            .await
    }

    /// Único caminho que devolve a chave completa. Sempre auditado.
    pub async fn reveal(&self, ctx: &TenantContext, id: Uuid) -> Result<RevealedKey, AppError> {
        policy::authorize(ctx, Action::RevealLicenseKey)?;

        let full_key = self
            .licenses
            .reveal_full_key(ctx, id)
            .await?
            .ok_or(AppError::NotFound("Licença"))?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::License,
                    Some(id),
                    "license.key_revealed",
                )
                .by(ctx.user_id()),
            )
            .await?;

        tracing::info!(
            license_id = %id,
            user_id = %ctx.user_id(),
            organization_id = %ctx.organization_id(),
            "Chave de licença revelada"
        );

        Ok(RevealedKey {
            license_id: id,
            full_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        license::LicenseStatus,
        organization::MemberRole,
        subscription::ResourceKind,
    };
    use crate::services::test_support::Fixture;

    fn office(key: &str) -> NewLicense {
        NewLicense {
            product: "Office 365".into(),
            full_key: key.into(),
            expires_at: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn listings_only_expose_the_mask() {
        let fx = Fixture::new();
        let (_org, owner) = fx.organization("Acme").await;
        let svc = &fx.state.license_service;

        let license = svc.create(&owner, office("ABCD-1234-WXYZ-9999")).await.unwrap();
        assert_eq!(license.masked_key, "****-****-****-9999");

        let listed = svc.list(&owner).await.unwrap();
        let json = serde_json::to_string(&listed).unwrap();
        assert!(!json.contains("ABCD-1234-WXYZ"));
    }

    #[tokio::test]
    async fn only_admins_reveal_and_each_reveal_is_audited() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let svc = &fx.state.license_service;
        let license = svc.create(&owner, office("ABCD-1234-WXYZ-9999")).await.unwrap();

        match svc.reveal(&bob, license.id).await {
            Err(AppError::AuthorizationDenied) => {}
            other => panic!("esperado AuthorizationDenied, veio {other:?}"),
        }

        let revealed = svc.reveal(&owner, license.id).await.unwrap();
        assert_eq!(revealed.full_key, "ABCD-1234-WXYZ-9999");

        let reveals = fx
            .store
            .audit_actions(org.id)
            .await
            .into_iter()
            .filter(|a| a == "license.key_revealed")
            .count();
        assert_eq!(reveals, 1);
    }

    #[tokio::test]
    async fn cross_tenant_reveal_is_not_found() {
        let fx = Fixture::new();
        let (_a, owner_a) = fx.organization("Acme").await;
        let (_b, owner_b) = fx.organization("Globex").await;
        let svc = &fx.state.license_service;
        let license = svc.create(&owner_a, office("ABCD-1234-WXYZ-9999")).await.unwrap();

        assert!(matches!(
            svc.reveal(&owner_b, license.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rotating_the_key_re_derives_the_mask() {
        let fx = Fixture::new();
        let (_org, owner) = fx.organization("Acme").await;
        let svc = &fx.state.license_service;
        let license = svc.create(&owner, office("ABCD-1234-WXYZ-9999")).await.unwrap();

        let updated = svc
            .update(
                &owner,
                license.id,
                LicenseChanges {
                    full_key: Some("NEW-KEY-0001".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.masked_key, "****-****-****-0001");
        assert_eq!(
            svc.reveal(&owner, license.id).await.unwrap().full_key,
            "NEW-KEY-0001"
        );
    }

    #[tokio::test]
    async fn free_plan_stops_at_five_licenses() {
        let fx = Fixture::new();
        let (_org, owner) = fx.organization("Acme").await;
        let svc = &fx.state.license_service;
        for i in 0..5 {
            svc.create(&owner, office(&format!("KEY-{i:04}"))).await.unwrap();
        }
        assert!(matches!(
            svc.create(&owner, office("KEY-9999")).await,
            Err(AppError::LimitExceeded { resource: ResourceKind::License, .. })
        ));
    }

    #[tokio::test]
    async fn assignment_flips_the_status() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let svc = &fx.state.license_service;
        let license = svc.create(&owner, office("ABCD-1234")).await.unwrap();

        let assigned = svc.assign(&owner, license.id, Some(bob.user_id())).await.unwrap();
        assert_eq!(assigned.status, LicenseStatus::Assigned);
        let returned = svc.assign(&owner, license.id, None).await.unwrap();
        assert_eq!(returned.status, LicenseStatus::Available);
    }
}
