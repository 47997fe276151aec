// src/services/plan_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::repository::{
        AssetRepository, LicenseRepository, MembershipRepository, SubscriptionRepository,
    },
    middleware::tenancy::TenantContext,
    models::subscription::{Feature, PlanUsage, ResourceKind, Subscription, UsageMeter},
};

/// Consultas de plano para a interface. A trava de verdade está nos
/// repositórios (`admit_locked`), no momento da inserção.
#[derive(Clone)]
pub struct PlanService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    assets: Arc<dyn AssetRepository>,
    licenses: Arc<dyn LicenseRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl PlanService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        assets: Arc<dyn AssetRepository>,
        licenses: Arc<dyn LicenseRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self {
            subscriptions,
            assets,
            licenses,
            memberships,
        }
    }

    pub async fn subscription(&self, ctx: &TenantContext) -> Result<Subscription, AppError> {
        self.subscriptions.get_subscription(ctx).await
    }

    async fn current_count(&self, ctx: &TenantContext, kind: ResourceKind) -> Result<i64, AppError> {
        match kind {
            ResourceKind::Asset => self.assets.count_assets(ctx).await,
            ResourceKind::License => self.licenses.count_licenses(ctx).await,
            ResourceKind::Member => self.memberships.count_members(ctx).await,
        }
    }

    pub async fn can_create(&self, ctx: &TenantContext, kind: ResourceKind) -> Result<bool, AppError> {
        let subscription = self.subscription(ctx).await?;
        let count = self.current_count(ctx, kind).await?;
        Ok(subscription.can_create(kind, count))
    }

    /// Verificação antecipada com o erro de upgrade já montado.
    pub async fn admit(&self, ctx: &TenantContext, kind: ResourceKind) -> Result<(), AppError> {
        let subscription = self.subscription(ctx).await?;
        let count = self.current_count(ctx, kind).await?;
        subscription.admit(kind, count)
    }

    pub async fn has_feature(&self, ctx: &TenantContext, feature: Feature) -> Result<bool, AppError> {
        Ok(self.subscription(ctx).await?.has_feature(feature))
    }

    pub async fn require_feature(&self, ctx: &TenantContext, feature: Feature) -> Result<(), AppError> {
        if self.has_feature(ctx, feature).await? {
            Ok(())
        } else {
            Err(AppError::FeatureNotAvailable(feature))
        }
    }

    pub async fn usage(&self, ctx: &TenantContext) -> Result<PlanUsage, AppError> {
        let subscription = self.subscription(ctx).await?;
        let limits = subscription.plan.limits();

        let meter = |kind: ResourceKind, used: i64| UsageMeter {
            used,
            limit: limits.limit_for(kind),
        };

        Ok(PlanUsage {
            plan: subscription.plan,
            status: subscription.status,
            limits,
            assets: meter(ResourceKind::Asset, self.assets.count_assets(ctx).await?),
            licenses: meter(ResourceKind::License, self.licenses.count_licenses(ctx).await?),
            members: meter(ResourceKind::Member, self.memberships.count_members(ctx).await?),
            current_period_end: subscription.current_period_end,
        })
    }
}
