// src/services/tenancy_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::MembershipRepository,
    models::organization::{MemberRole, Membership},
};

/// Escopo de tenant já verificado.
///
/// Os campos são privados e o único construtor é `TenancyService::resolve`,
/// que parte de uma linha de `memberships` lida do banco. Todo repositório
/// que recebe um `TenantContext` recebe um escopo cujo usuário pertence à
/// organização.
#[derive(Debug, Clone)]
pub struct TenantContext {
    organization_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
}

impl TenantContext {
    fn from_membership(membership: &Membership) -> Self {
        Self {
            organization_id: membership.organization_id,
            user_id: membership.user_id,
            role: membership.role,
        }
    }

    /// Atalho dos testes de unidade, que não passam pelo guardião.
    #[cfg(test)]
    pub(crate) fn for_tests(organization_id: Uuid, user_id: Uuid, role: MemberRole) -> Self {
        Self {
            organization_id,
            user_id,
            role,
        }
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn role(&self) -> MemberRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// O guardião de tenancy: toda rota de tenant passa por `resolve`.
#[derive(Clone)]
pub struct TenancyService {
    memberships: Arc<dyn MembershipRepository>,
}

impl TenancyService {
    pub fn new(memberships: Arc<dyn MembershipRepository>) -> Self {
        Self { memberships }
    }

    pub async fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .memberships
            .find_membership(organization_id, user_id)
            .await?
            .is_some())
    }

    /// Papel exato. As rotas usam o papel já resolvido no `TenantContext`.
    #[cfg(test)]
    pub async fn has_role(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        role: MemberRole,
    ) -> Result<bool, AppError> {
        Ok(self
            .memberships
            .find_membership(organization_id, user_id)
            .await?
            .is_some_and(|m| m.role == role))
    }

    #[cfg(test)]
    pub async fn is_admin(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .memberships
            .find_membership(organization_id, user_id)
            .await?
            .is_some_and(|m| m.role.is_admin()))
    }

    /// Mesmo erro para organização inexistente e para não-membro.
    pub async fn resolve(&self, user_id: Uuid, organization_id: Uuid) -> Result<TenantContext, AppError> {
        match self
            .memberships
            .find_membership(organization_id, user_id)
            .await?
        {
            Some(membership) => Ok(TenantContext::from_membership(&membership)),
            None => {
                tracing::warn!(
                    %user_id,
                    %organization_id,
                    "Acesso negado: usuário não pertence à organização"
                );
                Err(AppError::AuthorizationDenied)
            }
        }
    }
}
