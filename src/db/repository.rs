//! Contratos de acesso a dados.
//!
//! Toda operação sobre tabelas de tenant recebe um `TenantContext`, que só
//! existe depois da verificação de associação. As poucas operações sem
//! escopo (login, aceite de convite por token, webhook de cobrança) estão
//! marcadas como caminhos de sistema.
//!
//! Inserções de ativos, licenças e membros aplicam o limite do plano na
//! mesma transação da escrita (`Subscription::admit`); não há inserção sem
//! essa verificação.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    middleware::tenancy::TenantContext,
    models::{
        asset::{Asset, AssetChanges, AssetFilter, Assignment, NewAsset, StatusCount},
        audit::{AuditFilter, AuditLogEntry, NewAuditEntry},
        auth::User,
        invite::{AcceptOutcome, Invite, NewInvite},
        license::{License, LicenseChanges, NewLicense},
        organization::{
            MemberRole, MemberView, Membership, NewOrganization, Organization,
            OrganizationChanges, OrganizationWithRole,
        },
        request::{NewRequest, RequestDecision, ResourceRequest},
        subscription::{BillingUpdate, Subscription},
    },
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<User, AppError>;
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Organização + associação do dono + assinatura free/active, tudo ou nada.
    async fn create_with_owner(
        &self,
        input: NewOrganization,
        owner_id: Uuid,
    ) -> Result<Organization, AppError>;
    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError>;
    async fn get_organization(&self, ctx: &TenantContext) -> Result<Organization, AppError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrganizationWithRole>, AppError>;
    async fn update_organization(
        &self,
        ctx: &TenantContext,
        changes: OrganizationChanges,
    ) -> Result<Organization, AppError>;
    async fn delete_organization(&self, ctx: &TenantContext) -> Result<(), AppError>;
    /// Caminho de sistema (webhook): a organização mais antiga da qual o usuário é dono.
    async fn find_first_owned_by(&self, user_id: Uuid) -> Result<Option<Organization>, AppError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// A consulta do próprio guardião de tenancy.
    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, AppError>;
    async fn list_members(&self, ctx: &TenantContext) -> Result<Vec<MemberView>, AppError>;
    async fn count_members(&self, ctx: &TenantContext) -> Result<i64, AppError>;
    async fn update_role(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Membership>, AppError>;
    async fn delete_membership(&self, ctx: &TenantContext, user_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create_invite(&self, ctx: &TenantContext, input: NewInvite) -> Result<Invite, AppError>;
    async fn list_invites(&self, ctx: &TenantContext) -> Result<Vec<Invite>, AppError>;
    /// Convite ainda não aceito (pendente ou expirado) para o e-mail.
    async fn find_unaccepted_for_email(
        &self,
        ctx: &TenantContext,
        email: &str,
    ) -> Result<Option<Invite>, AppError>;
    /// Caminho de sistema: o token é a credencial.
    async fn find_by_token(&self, token: &str) -> Result<Option<Invite>, AppError>;
    async fn delete_unaccepted(&self, ctx: &TenantContext, invite_id: Uuid) -> Result<bool, AppError>;
    /// Marca o convite como aceito e cria a associação, numa única transação.
    /// Usuário que já é membro: o convite é consumido e nada mais muda.
    async fn accept(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AcceptOutcome, AppError>;
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn list_assets(&self, ctx: &TenantContext, filter: &AssetFilter) -> Result<Vec<Asset>, AppError>;
    async fn get_asset(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<Asset>, AppError>;
    async fn create_asset(&self, ctx: &TenantContext, input: NewAsset) -> Result<Asset, AppError>;
    async fn update_asset(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        changes: AssetChanges,
    ) -> Result<Option<Asset>, AppError>;
    async fn set_asset_assignee(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignment: Assignment,
    ) -> Result<Option<Asset>, AppError>;
    async fn delete_asset(&self, ctx: &TenantContext, id: Uuid) -> Result<bool, AppError>;
    async fn count_assets(&self, ctx: &TenantContext) -> Result<i64, AppError>;
    async fn count_assets_by_status(&self, ctx: &TenantContext) -> Result<Vec<StatusCount>, AppError>;
}

#[async_trait]
pub trait LicenseRepository: Send + Sync {
    async fn list_licenses(&self, ctx: &TenantContext) -> Result<Vec<License>, AppError>;
    async fn get_license(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<License>, AppError>;
    async fn create_license(&self, ctx: &TenantContext, input: NewLicense) -> Result<License, AppError>;
    async fn update_license(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        changes: LicenseChanges,
    ) -> Result<Option<License>, AppError>;
    async fn set_license_assignee(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignment: Assignment,
    ) -> Result<Option<License>, AppError>;
    async fn delete_license(&self, ctx: &TenantContext, id: Uuid) -> Result<bool, AppError>;
    async fn count_licenses(&self, ctx: &TenantContext) -> Result<i64, AppError>;
    async fn count_expiring_before(&self, ctx: &TenantContext, date: NaiveDate) -> Result<i64, AppError>;
    /// O único acesso à chave completa.
    async fn reveal_full_key(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<String>, AppError>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn get_subscription(&self, ctx: &TenantContext) -> Result<Subscription, AppError>;
    /// Caminho de sistema (webhook).
    async fn apply_billing_update(
        &self,
        organization_id: Uuid,
        update: BillingUpdate,
    ) -> Result<Subscription, AppError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AppError>;
    async fn list_entries(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditLogEntry>, AppError>;
    /// Mesmos filtros, sem paginação (exportação completa).
    async fn export_entries(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditLogEntry>, AppError>;
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn create_request(&self, ctx: &TenantContext, input: NewRequest) -> Result<ResourceRequest, AppError>;
    /// `requested_by = None` lista todos os pedidos da organização.
    async fn list_requests(
        &self,
        ctx: &TenantContext,
        requested_by: Option<Uuid>,
    ) -> Result<Vec<ResourceRequest>, AppError>;
    async fn get_request(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<ResourceRequest>, AppError>;
    /// Só altera pedidos ainda pendentes.
    async fn decide_request(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        decision: RequestDecision,
    ) -> Result<Option<ResourceRequest>, AppError>;
    /// Aprova e atribui o recurso ao solicitante na mesma transação.
    /// `NotFound` se o recurso sumiu; nada é gravado nesse caso.
    async fn approve_request(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        decided_by: Uuid,
    ) -> Result<Option<ResourceRequest>, AppError>;
    async fn count_pending_requests(&self, ctx: &TenantContext) -> Result<i64, AppError>;
}
