// src/services/test_support.rs

//! Cenários montados sobre o `MemoryStore`, compartilhados pelos testes.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::{AppState, Config},
    db::{memory::MemoryStore, Repositories},
    middleware::tenancy::TenantContext,
    models::{
        auth::User,
        organization::{MemberRole, Organization},
    },
};

pub struct Fixture {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl Fixture {
    pub const WEBHOOK_SECRET: &'static str = "segredo-do-webhook";

    pub fn new() -> Self {
        let store = MemoryStore::new();
        let mut state = AppState::new(
            &Config::for_tests(Self::WEBHOOK_SECRET),
            Repositories::in_memory(store.clone()),
        );
        state.auth_service = state.auth_service.with_hash_cost(4 /* bcrypt minimum cost; bcrypt::MIN_COST is private */);
        Self { state, store }
    }

    /// Usuário sem senha utilizável; para login use `auth_service.register_user`.
    pub async fn user(&self, email: &str) -> User {
        self.state
            .repos
            .users
            .create_user(email, "sem-senha", None)
            .await
            .unwrap()
    }

    pub async fn user_by_id(&self, id: Uuid) -> User {
        self.state.repos.users.find_by_id(id).await.unwrap().unwrap()
    }

    /// Organização recém-criada e o contexto do seu dono.
    pub async fn organization(&self, name: &str) -> (Organization, TenantContext) {
        let owner = self
            .user(&format!("dono-{}@exemplo.com", Uuid::new_v4().simple()))
            .await;
        let organization = self
            .state
            .organization_service
            .create(owner.id, name, None)
            .await
            .unwrap();
        let ctx = self
            .state
            .tenancy_service
            .resolve(owner.id, organization.id)
            .await
            .unwrap();
        (organization, ctx)
    }

    pub async fn member(&self, organization_id: Uuid, email: &str, role: MemberRole) -> TenantContext {
        let user = self.user(email).await;
        self.store.add_member(organization_id, user.id, role).await;
        self.state
            .tenancy_service
            .resolve(user.id, organization_id)
            .await
            .unwrap()
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.state.auth_service.create_token(user_id).unwrap()
    }
}
