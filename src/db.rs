// src/db.rs

use std::sync::Arc;

use sqlx::PgPool;

pub mod repository;

pub mod asset_repo;
pub mod audit_repo;
pub mod invite_repo;
pub mod license_repo;
pub mod membership_repo;
pub mod organization_repo;
pub mod request_repo;
pub mod subscription_repo;
pub mod user_repo;

#[cfg(test)]
pub mod memory;

pub use asset_repo::PgAssetRepository;
pub use audit_repo::PgAuditRepository;
pub use invite_repo::PgInviteRepository;
pub use license_repo::PgLicenseRepository;
pub use membership_repo::PgMembershipRepository;
pub use organization_repo::PgOrganizationRepository;
pub use request_repo::PgRequestRepository;
pub use subscription_repo::PgSubscriptionRepository;
pub use user_repo::PgUserRepository;

use repository::{
    AssetRepository, AuditRepository, InviteRepository, LicenseRepository, MembershipRepository,
    OrganizationRepository, RequestRepository, SubscriptionRepository, UserRepository,
};

/// Todos os repositórios, prontos para serem entregues aos serviços.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub invites: Arc<dyn InviteRepository>,
    pub assets: Arc<dyn AssetRepository>,
    pub licenses: Arc<dyn LicenseRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub requests: Arc<dyn RequestRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            organizations: Arc::new(PgOrganizationRepository::new(pool.clone())),
            memberships: Arc::new(PgMembershipRepository::new(pool.clone())),
            invites: Arc::new(PgInviteRepository::new(pool.clone())),
            assets: Arc::new(PgAssetRepository::new(pool.clone())),
            licenses: Arc::new(PgLicenseRepository::new(pool.clone())),
            subscriptions: Arc::new(PgSubscriptionRepository::new(pool.clone())),
            audit: Arc::new(PgAuditRepository::new(pool.clone())),
            requests: Arc::new(PgRequestRepository::new(pool)),
        }
    }

    #[cfg(test)]
    pub fn in_memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            organizations: store.clone(),
            memberships: store.clone(),
            invites: store.clone(),
            assets: store.clone(),
            licenses: store.clone(),
            subscriptions: store.clone(),
            audit: store.clone(),
            requests: store,
        }
    }
}
