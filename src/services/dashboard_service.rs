// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{Days, Utc};

use crate::{
    common::error::AppError,
    db::repository::{AssetRepository, LicenseRepository, RequestRepository},
    middleware::tenancy::TenantContext,
    models::dashboard::DashboardSummary,
    services::plan_service::PlanService,
};

const EXPIRING_WINDOW_DAYS: u64 = 30;

#[derive(Clone)]
pub struct DashboardService {
    plan: PlanService,
    assets: Arc<dyn AssetRepository>,
    licenses: Arc<dyn LicenseRepository>,
    requests: Arc<dyn RequestRepository>,
}

impl DashboardService {
    pub fn new(
        plan: PlanService,
        assets: Arc<dyn AssetRepository>,
        licenses: Arc<dyn LicenseRepository>,
        requests: Arc<dyn RequestRepository>,
    ) -> Self {
        Self {
            plan,
            assets,
            licenses,
            requests,
        }
    }

    pub async fn summary(&self, ctx: &TenantContext) -> Result<DashboardSummary, AppError> {
        let today = Utc::now().date_naive();
        let horizon = today
            .checked_add_days(Days::new(EXPIRING_WINDOW_DAYS))
            .unwrap_or(today);

        let usage = self.plan.usage(ctx).await?;
        let assets_by_status = self.assets.count_assets_by_status(ctx).await?;
        let licenses_expiring_soon = self.licenses.count_expiring_before(ctx, horizon).await?;
        let pending_requests = self.requests.count_pending_requests(ctx).await?;

        Ok(DashboardSummary {
            usage,
            assets_by_status,
            licenses_expiring_soon,
            pending_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Utc};

    use crate::models::{
        asset::{AssetCategory, AssetStatus, NewAsset},
        license::NewLicense,
        organization::MemberRole,
        request::RequestedResource,
        subscription::Plan,
    };
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn summary_counts_only_the_callers_tenant() {
        let fx = Fixture::new();
        let (org, owner) = fx.organization("Acme").await;
        let (_other, outsider) = fx.organization("Globex").await;
        let bob = fx.member(org.id, "bob@acme.com", MemberRole::Member).await;
        let today = Utc::now().date_naive();

        for (ctx, name) in [(&owner, "Notebook"), (&owner, "Monitor"), (&outsider, "Servidor")] {
            fx.state
                .asset_service
                .create(
                    ctx,
                    NewAsset {
                        name: name.into(),
                        category: AssetCategory::Other,
                        serial_number: None,
                        location: None,
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        for (product, days) in [("Office", 10), ("Antivírus", 90)] {
            fx.state
                .license_service
                .create(
                    &owner,
                    NewLicense {
                        product: product.into(),
                        full_key: format!("{product}-KEY-0001"),
                        expires_at: today.checked_add_days(Days::new(days)),
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        fx.state
            .request_service
            .create(&bob, RequestedResource::License, None, None)
            .await
            .unwrap();

        let summary = fx.state.dashboard_service.summary(&owner).await.unwrap();
        assert_eq!(summary.usage.plan, Plan::Free);
        assert_eq!(summary.usage.assets.used, 2);
        assert_eq!(summary.usage.assets.limit, Some(10));
        assert_eq!(summary.usage.members.used, 2);
        assert_eq!(summary.licenses_expiring_soon, 1);
        assert_eq!(summary.pending_requests, 1);

        let available = summary
            .assets_by_status
            .iter()
            .find(|c| c.status == AssetStatus::Available)
            .map(|c| c.count);
        assert_eq!(available, Some(2));
    }
}
