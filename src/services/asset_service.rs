// src/services/asset_service.rs

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::AssetRepository,
    middleware::tenancy::TenantContext,
    models::{
        asset::{Asset, AssetChanges, AssetFilter, Assignment, NewAsset},
        audit::{AuditResource, NewAuditEntry},
    },
    services::{
        audit_service::AuditService,
        policy::{self, Action},
        tenancy_service::TenancyService,
    },
};

#[derive(Clone)]
pub struct AssetService {
    assets: Arc<dyn AssetRepository>,
    tenancy: TenancyService,
    audit: AuditService,
}

impl AssetService {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        tenancy: TenancyService,
        audit: AuditService,
    ) -> Self {
        Self {
            assets,
            tenancy,
            audit,
        }
    }

    // ---
    // Leitura (qualquer membro)
    // ---

    pub async fn list(&self, ctx: &TenantContext, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        self.assets.list_assets(ctx, filter).await
    }

    /// Id de outra organização é simplesmente "não encontrado".
    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> Result<Asset, AppError> {
        self.assets
            .get_asset(ctx, id)
            .await?
            .ok_or(AppError::NotFound("Ativo"))
    }

    // ---
    // Escrita (admin)
    // ---

    pub async fn create(&self, ctx: &TenantContext, input: NewAsset) -> Result<Asset, AppError> {
        policy::authorize(ctx, Action::ManageAssets)?;
        let input = NewAsset {
            name: required(&input.name)?,
            serial_number: trimmed(input.serial_number),
            location: trimmed(input.location),
            notes: trimmed(input.notes),
            ..input
        };

        // O limite do plano é aplicado dentro do repositório, na mesma transação
        let asset = self.assets.create_asset(ctx, input).await?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Asset,
                    Some(asset.id),
                    "asset.created",
                )
                .by(ctx.user_id())
                .with_metadata(json!({ "name": asset.name, "category": asset.category })),
            )
            .await?;

        Ok(asset)
    }

    pub async fn update(&self, ctx: &TenantContext, id: Uuid, changes: AssetChanges) -> Result<Asset, AppError> {
        policy::authorize(ctx, Action::ManageAssets)?;
        let changes = AssetChanges {
            name: changes.name.as_deref().map(required).transpose()?,
            serial_number: trimmed(changes.serial_number),
            location: trimmed(changes.location),
            notes: trimmed(changes.notes),
            ..changes
        };

        let asset = self
            .assets
            .update_asset(ctx, id, changes)
            .await?
            .ok_or(AppError::NotFound("Ativo"))?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.organization_id(),
                    AuditResource::Asset,
                    Some(asset.id),
                    "asset.updated",
                )
                .by(ctx.user_id())
                .with_metadata(json!({ "name": asset.name, "status": asset.status })),
            )
            .await?;

        Ok(asset)
    }

    /// Atribui a um membro da organização ou devolve (`None`).
    pub async fn assign(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignee_user_id: Option<Uuid>,
    ) -> Result<Asset, AppError> {
        policy::authorize(ctx, Action::ManageAssets)?;
        ensure_member(&self.tenancy, ctx, assignee_user_id).await?;

        let asset = self
            .assets
            .set_asset_assignee(ctx, id, Assignment { assignee_user_id })
            .await?
            .ok_or(AppError::NotFound("Ativo"))?;

        let action = match assignee_user_id {
            Some(_) => "asset.assigned",
            None => "asset.unassigned",
        };
        self.audit
            .record(
                NewAuditEntry::new(ctx.organization_id(), AuditResource::Asset, Some(asset.id), action)
                    .by(ctx.user_id())
                    .to(assignee_user_id),
            )
            .await?;

        Ok(asset)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> Result<(), AppError> {
        policy::authorize(ctx, Action::ManageAssets)?;
        if !self.assets.delete_asset(ctx, id).await? {
            return Err(AppError::NotFound("Ativo"));
        }
        self.audit
            .record(
                NewAuditEntry::new(ctx.organization_id(), AuditResource::Asset, Some(id), "asset.deleted")
                    .by(ctx.user_id()),
            )
            .await
    }
}

/// O responsável precisa pertencer à mesma organização.
pub(crate) async fn ensure_member(
    tenancy: &TenancyService,
    ctx: &TenantContext,
    user_id: Option<Uuid>,
) -> Result<(), AppError> {
    let Some(user_id) = user_id else {
        return Ok(());
    };
    if tenancy.is_member(user_id, ctx.organization_id()).await? {
        Ok(())
    } else {
        Err(AppError::Validation(
            "O responsável precisa ser membro da organização.".into(),
        ))
    }
}

pub(crate) fn required(value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::Validation("O nome é obrigatório.".into()))
    } else {
        Ok(value.to_string())
    }
}

/// Campo opcional: espaços em volta saem, vazio vira `None`.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
