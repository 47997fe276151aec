// src/models/subscription.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "plan_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
}

/// Tipos de recurso contados pelo limite do plano.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Asset,
    License,
    Member,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asset => write!(f, "asset"),
            Self::License => write!(f, "license"),
            Self::Member => write!(f, "member"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    BulkImport,
    AuditLog,
    PrioritySupport,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BulkImport => write!(f, "bulk_import"),
            Self::AuditLog => write!(f, "audit_log"),
            Self::PrioritySupport => write!(f, "priority_support"),
        }
    }
}

/// Tetos de um plano. `None` significa ilimitado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_assets: Option<i64>,
    pub max_licenses: Option<i64>,
    pub max_members: Option<i64>,
    pub bulk_import: bool,
    pub audit_log: bool,
    pub priority_support: bool,
}

impl PlanLimits {
    pub fn limit_for(&self, kind: ResourceKind) -> Option<i64> {
        match kind {
            ResourceKind::Asset => self.max_assets,
            ResourceKind::License => self.max_licenses,
            ResourceKind::Member => self.max_members,
        }
    }

    pub fn includes(&self, feature: Feature) -> bool {
        match feature {
            Feature::BulkImport => self.bulk_import,
            Feature::AuditLog => self.audit_log,
            Feature::PrioritySupport => self.priority_support,
        }
    }
}

impl Plan {
    pub fn limits(self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                max_assets: Some(10),
                max_licenses: Some(5),
                max_members: Some(3),
                bulk_import: false,
                audit_log: false,
                priority_support: false,
            },
            Plan::Pro => PlanLimits {
                max_assets: Some(100),
                max_licenses: Some(50),
                max_members: Some(15),
                bulk_import: true,
                audit_log: true,
                priority_support: false,
            },
            Plan::Enterprise => PlanLimits {
                max_assets: None,
                max_licenses: None,
                max_members: None,
                bulk_import: true,
                audit_log: true,
                priority_support: true,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub external_supporter_email: Option<String>,
    pub external_subscription_id: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Assinatura criada junto com a organização.
    pub fn starter(organization_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            external_supporter_email: None,
            external_subscription_id: None,
            current_period_start: None,
            current_period_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// `status == active AND current_count < limit(plan, kind)`
    pub fn can_create(&self, kind: ResourceKind, current_count: i64) -> bool {
        self.is_active()
            && self
                .plan
                .limits()
                .limit_for(kind)
                .is_none_or(|limit| current_count < limit)
    }

    /// Mesma regra de `can_create`, no formato usado pelos caminhos de escrita.
    /// Assinatura suspensa (canceled / past_due) tem teto efetivo zero.
    pub fn admit(&self, kind: ResourceKind, current_count: i64) -> Result<(), AppError> {
        if self.can_create(kind, current_count) {
            return Ok(());
        }
        let limit = if self.is_active() {
            self.plan.limits().limit_for(kind)
        } else {
            Some(0)
        };
        Err(AppError::LimitExceeded {
            resource: kind,
            limit,
        })
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.is_active() && self.plan.limits().includes(feature)
    }
}

/// Mudança de assinatura vinda do provedor de pagamentos.
#[derive(Debug, Clone)]
pub struct BillingUpdate {
    pub plan: Option<Plan>,
    pub status: SubscriptionStatus,
    pub supporter_email: String,
    pub external_subscription_id: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

// Resposta da consulta antecipada "posso criar mais um?"
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllowance {
    pub resource: ResourceKind,
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageMeter {
    pub used: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanUsage {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub limits: PlanLimits,
    pub assets: UsageMeter,
    pub licenses: UsageMeter,
    pub members: UsageMeter,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(plan: Plan, status: SubscriptionStatus) -> Subscription {
        let mut sub = Subscription::starter(Uuid::new_v4());
        sub.plan = plan;
        sub.status = status;
        sub
    }

    #[test]
    fn free_plan_allows_the_tenth_asset_but_not_the_eleventh() {
        let sub = subscription(Plan::Free, SubscriptionStatus::Active);
        assert!(sub.can_create(ResourceKind::Asset, 9));
        assert!(!sub.can_create(ResourceKind::Asset, 10));

        match sub.admit(ResourceKind::Asset, 10) {
            Err(AppError::LimitExceeded { resource, limit }) => {
                assert_eq!(resource, ResourceKind::Asset);
                assert_eq!(limit, Some(10));
            }
            other => panic!("esperado LimitExceeded, veio {other:?}"),
        }
    }

    #[test]
    fn free_plan_ceilings_match_the_catalog() {
        let limits = Plan::Free.limits();
        assert_eq!(limits.max_assets, Some(10));
        assert_eq!(limits.max_licenses, Some(5));
        assert_eq!(limits.max_members, Some(3));
        assert!(!limits.bulk_import && !limits.audit_log && !limits.priority_support);
    }

    #[test]
    fn enterprise_is_never_limited() {
        let sub = subscription(Plan::Enterprise, SubscriptionStatus::Active);
        for kind in [ResourceKind::Asset, ResourceKind::License, ResourceKind::Member] {
            assert!(sub.can_create(kind, 1_000_000));
            assert!(sub.admit(kind, i64::MAX - 1).is_ok());
        }
    }

    #[test]
    fn suspended_subscriptions_block_creates_and_features() {
        for status in [SubscriptionStatus::PastDue, SubscriptionStatus::Canceled] {
            let sub = subscription(Plan::Enterprise, status);
            assert!(!sub.can_create(ResourceKind::Asset, 0));
            assert!(!sub.has_feature(Feature::AuditLog));
            assert!(matches!(
                sub.admit(ResourceKind::License, 0),
                Err(AppError::LimitExceeded { limit: Some(0), .. })
            ));
        }
    }

    #[test]
    fn pro_features() {
        let sub = subscription(Plan::Pro, SubscriptionStatus::Active);
        assert!(sub.has_feature(Feature::BulkImport));
        assert!(sub.has_feature(Feature::AuditLog));
        assert!(!sub.has_feature(Feature::PrioritySupport));
        assert!(sub.can_create(ResourceKind::Member, 14));
        assert!(!sub.can_create(ResourceKind::Member, 15));
    }
}
