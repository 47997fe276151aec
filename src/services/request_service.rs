// src/services/request_service.rs

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::{AssetRepository, LicenseRepository, RequestRepository},
    middleware::tenancy::TenantContext,
    models::{
        audit::{AuditResource, NewAuditEntry},
        request::{NewRequest, RequestDecision, RequestStatus, RequestedResource, ResourceRequest},
    },
    services::{
        audit_service::AuditService,
        policy::{self, Action},
        tenancy_service::TenancyService,
    },
};

#[derive(Clone)]
pub struct RequestService {
    requests: Arc<dyn RequestRepository>,
    assets: Arc<dyn AssetRepository>,
    licenses: Arc<dyn LicenseRepository>,
    tenancy: TenancyService,
    audit: AuditService,
}

impl RequestService {
    pub fn new(
        requests: Arc<dyn RequestRepository>,
        assets: Arc<dyn AssetRepository>,
        licenses: Arc<dyn LicenseRepository>,
        tenancy: TenancyService,
        audit: AuditService,
    ) -> Self {
        Self {
            requests,
            assets,
            licenses,
            tenancy,
            audit,
        }
    }

    async fn ensure_resource_exists(
        &self,
        ctx: &TenantContext,
        kind: RequestedResource,
        id: Uuid,
    ) -> Result<(), AppError> {
        let exists = match kind {
            RequestedResource::Asset => self.assets.get_asset(ctx, id).await?.is_some(),
            RequestedResource::License => self.licenses.get_license(ctx, id).await?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(kind.label()))
        }
    }

    pub async fn create(
        &self,
        ctx: &TenantContext,
        resource_type: RequestedResource,
        resource_id: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<ResourceRequest, AppError> {
        if let Some(id) = resource_id {
            self.ensure_resource_exists(ctx, resource_type, id).await?;
        }

        let request = self
            .requests
            .create_request(
                ctx,
                NewRequest {
                    requested_by: ctx.user_id(),
                    resource_type,
                    resource_id,
                    reason: reason
                        .map(|r| r.trim().to_string())
                        .filter(|r| !r.is_empty()),
                },
            )
            .await?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Request,
                    Some(request.id),
                    "request.created",
                )
                .by(ctx.user_id())
                .with_metadata(json!({
                    "resourceType": request.resource_type,
                    "resourceId": request.resource_id,
                })),
            )
            .await?;

        Ok(request)
    }

    /// Admins veem tudo; membros, só os próprios pedidos.
    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<ResourceRequest>, AppError> {
        let scope = if ctx.is_admin() {
            None
        } else {
            Some(ctx.user_id())
        };
        self.requests.list_requests(ctx, scope).await
    }

    async fn pending(&self, ctx: &TenantContext, id: Uuid) -> Result<ResourceRequest, AppError> {
        let request = self
            .requests
            .get_request(ctx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;
        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict("O pedido não está mais pendente.".into()));
        }
        Ok(request)
    }

    async fn decide(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<ResourceRequest, AppError> {
        self.requests
            .decide_request(
                ctx,
                id,
                RequestDecision {
                    status,
                    decided_by: ctx.user_id(),
                },
            )
            .await?
            // Outro admin decidiu antes
            .ok_or_else(|| AppError::Conflict("O pedido não está mais pendente.".into()))
    }

    async fn record(&self, ctx: &TenantContext, request: &ResourceRequest, action: &'static str) -> Result<(), AppError> {
        self.audit
            .record(
                NewAuditEntry::new(ctx.organization_id(), AuditResource::Request, Some(request.id), action)
                    .by(ctx.user_id())
                    .to(Some(request.requested_by)),
            )
            .await
    }

    /// Aprovar um pedido com recurso atribui o recurso ao solicitante.
    pub async fn approve(&self, ctx: &TenantContext, id: Uuid) -> Result<ResourceRequest, AppError> {
        policy::authorize(ctx, Action::DecideRequests)?;
        let request = self.pending(ctx, id).await?;

        if let Some(resource_id) = request.resource_id {
            self.ensure_resource_exists(ctx, request.resource_type, resource_id)
                .await?;
            if !self
                .tenancy
                .is_member(request.requested_by, ctx.organization_id())
                .await?
            {
                return Err(AppError::Validation(
                    "O solicitante não é mais membro da organização.".into(),
                ));
            }
        }

        // Decisão e atribuição numa só transação
        let decided = self
            .requests
            .approve_request(ctx, id, ctx.user_id())
            .await?
            .ok_or_else(|| AppError::Conflict("O pedido não está mais pendente.".into()))?;

        self.record(ctx, &decided, "request.approved").await?;
        Ok(decided)
    }

    pub async fn deny(&self, ctx: &TenantContext, id: Uuid) -> Result<ResourceRequest, AppError> {
        policy::authorize(ctx, Action::DecideRequests)?;
        self.pending(ctx, id).await?;
        let decided = self.decide(ctx, id, RequestStatus::Denied).await?;
        self.record(ctx, &decided, "request.denied").await?;
        Ok(decided)
    }

    /// Só o próprio solicitante cancela.
    pub async fn cancel(&self, ctx: &TenantContext, id: Uuid) -> Result<ResourceRequest, AppError> {
        let request = self.pending(ctx, id).await?;
        if request.requested_by != ctx.user_id() {
            return Err(AppError::AuthorizationDenied);
        }
        let decided = self.decide(ctx, id, RequestStatus::Cancelled).await?;
        self.record(ctx, &decided, "request.cancelled").await?;
        Ok(decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        asset::{AssetCategory, AssetStatus, NewAsset},
        organization::MemberRole,
    };
    use crate::services::test_support::Fixture;

    async fn seeded() -> (Fixture, TenantContext, TenantContext, Uuid) {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let asset = fx
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
        (fx, owner, bob, asset.id)
    }

    #[tokio::test]
    async fn approval_assigns_the_resource_to_the_requester() {
        let (fx, owner, bob, asset_id) = seeded().await;
        let svc = &fx.state.request_service;

        let request = svc
            .create(&bob, RequestedResource::Asset, Some(asset_id), Some("Preciso".into()))
            .await
            .unwrap();
        let approved = svc.approve(&owner, request.id).await.unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.decided_by, Some(owner.user_id()));

        let asset = fx.state.asset_service.get(&owner, asset_id).await.unwrap();
        assert_eq!(asset.assignee_user_id, Some(bob.user_id()));
        assert_eq!(asset.status, AssetStatus::Assigned);
    }

    #[tokio::test]
    async fn approval_is_rolled_back_when_the_resource_is_gone() {
        let (fx, owner, bob, asset_id) = seeded().await;
        let request = fx
            .state
            .request_service
            .create(&bob, RequestedResource::Asset, Some(asset_id), None)
            .await
            .unwrap();
        fx.state.asset_service.delete(&owner, asset_id).await.unwrap();

        // O repositório decide e atribui de uma vez; sem o ativo, nada muda
        assert!(matches!(
            fx.state
                .repos
                .requests
                .approve_request(&owner, request.id, owner.user_id())
                .await,
            Err(AppError::NotFound("Ativo"))
        ));
        let still = fx
            .state
            .repos
            .requests
            .get_request(&owner, request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(still.status, RequestStatus::Pending);
        assert_eq!(still.decided_by, None);
    }

    #[tokio::test]
    async fn members_see_only_their_own_requests() {
        let (fx, owner, bob, asset_id) = seeded().await;
        let svc = &fx.state.request_service;
        svc.create(&bob, RequestedResource::Asset, Some(asset_id), None)
            .await
            .unwrap();
        svc.create(&owner, RequestedResource::License, None, None)
            .await
            .unwrap();

        assert_eq!(svc.list(&bob).await.unwrap().len(), 1);
        assert_eq!(svc.list(&owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn decisions_are_admin_only_and_single_shot() {
        let (fx, owner, bob, asset_id) = seeded().await;
        let svc = &fx.state.request_service;
        let request = svc
            .create(&bob, RequestedResource::Asset, Some(asset_id), None)
            .await
            .unwrap();

        assert!(matches!(
            svc.approve(&bob, request.id).await,
            Err(AppError::AuthorizationDenied)
        ));
        svc.deny(&owner, request.id).await.unwrap();
        assert!(matches!(
            svc.approve(&owner, request.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn only_the_requester_cancels() {
        let (fx, owner, bob, asset_id) = seeded().await;
        let svc = &fx.state.request_service;
        let request = svc
            .create(&bob, RequestedResource::Asset, Some(asset_id), None)
            .await
            .unwrap();

        assert!(matches!(
            svc.cancel(&owner, request.id).await,
            Err(AppError::AuthorizationDenied)
        ));
        let cancelled = svc.cancel(&bob, request.id).await.unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
    }

    #[tokio::test]
    async fn requests_must_reference_resources_of_the_same_tenant() {
        let (fx, _owner, bob, _asset_id) = seeded().await;
        let (_other, outsider) = fx.organization("Globex").await;
        let foreign = fx
            .state
            .asset_service
            .create(
                &outsider,
                NewAsset {
                    name: "Servidor".into(),
                    category: AssetCategory::Network,
                    serial_number: None,
                    location: None,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            fx.state
                .request_service
                .create(&bob, RequestedResource::Asset, Some(foreign.id), None)
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}
