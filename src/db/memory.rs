// src/db/memory.rs

//! Implementação em memória de todos os repositórios, usada nos testes.
//!
//! Um único `Mutex` cobre todas as tabelas, então "contar e inserir" é
//! atômico aqui do mesmo jeito que o `SELECT ... FOR UPDATE` é no Postgres.
//! As mesmas regras de unicidade são aplicadas.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::{
        AssetRepository, AuditRepository, InviteRepository, LicenseRepository,
        MembershipRepository, OrganizationRepository, RequestRepository, SubscriptionRepository,
        UserRepository,
    },
    middleware::tenancy::TenantContext,
    models::{
        asset::{Asset, AssetChanges, AssetFilter, AssetStatus, Assignment, NewAsset, StatusCount},
        audit::{AuditFilter, AuditLogEntry, NewAuditEntry},
        auth::User,
        invite::{AcceptOutcome, Invite, InviteState, NewInvite},
        license::{mask_key, License, LicenseChanges, LicenseStatus, NewLicense},
        organization::{
            MemberRole, MemberView, Membership, NewOrganization, Organization,
            OrganizationChanges, OrganizationWithRole,
        },
        request::{NewRequest, RequestDecision, RequestStatus, RequestedResource, ResourceRequest},
        subscription::{BillingUpdate, Plan, ResourceKind, Subscription, SubscriptionStatus},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    organizations: Vec<Organization>,
    memberships: Vec<Membership>,
    invites: Vec<Invite>,
    assets: Vec<Asset>,
    licenses: Vec<License>,
    secrets: HashMap<Uuid, String>,
    subscriptions: Vec<Subscription>,
    audit: Vec<AuditLogEntry>,
    requests: Vec<ResourceRequest>,
}

impl Tables {
    fn count(&self, organization_id: Uuid, kind: ResourceKind) -> i64 {
        let n = match kind {
            ResourceKind::Asset => self
                .assets
                .iter()
                .filter(|a| a.organization_id == organization_id)
                .count(),
            ResourceKind::License => self
                .licenses
                .iter()
                .filter(|l| l.organization_id == organization_id)
                .count(),
            ResourceKind::Member => self
                .memberships
                .iter()
                .filter(|m| m.organization_id == organization_id)
                .count(),
        };
        n as i64
    }

    fn admit(&self, organization_id: Uuid, kind: ResourceKind) -> Result<(), AppError> {
        let subscription = self
            .subscriptions
            .iter()
            .find(|s| s.organization_id == organization_id)
            .ok_or(AppError::NotFound("Assinatura"))?;
        subscription.admit(kind, self.count(organization_id, kind))
    }

    fn serial_taken(&self, organization_id: Uuid, serial: Option<&str>, except: Option<Uuid>) -> bool {
        let Some(serial) = serial else {
            return false;
        };
        self.assets.iter().any(|a| {
            a.organization_id == organization_id
                && Some(a.id) != except
                && a.serial_number.as_deref() == Some(serial)
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Atalho de teste para simular o webhook de cobrança.
    pub async fn set_subscription(&self, organization_id: Uuid, plan: Plan, status: SubscriptionStatus) {
        let mut tables = self.tables.lock().await;
        if let Some(sub) = tables
            .subscriptions
            .iter_mut()
            .find(|s| s.organization_id == organization_id)
        {
            sub.plan = plan;
            sub.status = status;
        }
    }

    pub async fn audit_actions(&self, organization_id: Uuid) -> Vec<String> {
        let tables = self.tables.lock().await;
        tables
            .audit
            .iter()
            .filter(|e| e.organization_id == organization_id)
            .map(|e| e.action.clone())
            .collect()
    }

    /// Vínculo direto, sem passar pelo teto do plano (montagem de cenário).
    pub async fn add_member(&self, organization_id: Uuid, user_id: Uuid, role: MemberRole) -> Membership {
        let membership = Membership::new(organization_id, user_id, role);
        self.tables.lock().await.memberships.push(membership.clone());
        membership
    }

    /// Força a expiração de um convite.
    pub async fn expire_invite(&self, invite_id: Uuid) {
        let mut tables = self.tables.lock().await;
        if let Some(invite) = tables.invites.iter_mut().find(|i| i.id == invite_id) {
            invite.expires_at = Utc::now() - chrono::Duration::hours(1);
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict("Este e-mail já está cadastrado.".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            full_name: full_name.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn create_with_owner(
        &self,
        input: NewOrganization,
        owner_id: Uuid,
    ) -> Result<Organization, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.organizations.iter().any(|o| o.slug == input.slug) {
            return Err(AppError::Conflict("Já existe uma organização com este slug.".into()));
        }
        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            settings: input.settings,
            created_at: now,
            updated_at: now,
        };
        tables
            .memberships
            .push(Membership::new(organization.id, owner_id, MemberRole::Owner));
        tables.subscriptions.push(Subscription::starter(organization.id));
        tables.organizations.push(organization.clone());
        Ok(organization)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.organizations.iter().any(|o| o.slug == slug))
    }

    async fn get_organization(&self, ctx: &TenantContext) -> Result<Organization, AppError> {
        let tables = self.tables.lock().await;
        tables
            .organizations
            .iter()
            .find(|o| o.id == ctx.organization_id())
            .cloned()
            .ok_or(AppError::NotFound("Organização"))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrganizationWithRole>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<OrganizationWithRole> = tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                tables
                    .organizations
                    .iter()
                    .find(|o| o.id == m.organization_id)
                    .map(|o| OrganizationWithRole {
                        organization: o.clone(),
                        role: m.role,
                    })
            })
            .collect();
        rows.sort_by(|a, b| a.organization.name.cmp(&b.organization.name));
        Ok(rows)
    }

    async fn update_organization(
        &self,
        ctx: &TenantContext,
        changes: OrganizationChanges,
    ) -> Result<Organization, AppError> {
        let mut tables = self.tables.lock().await;
        let organization = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == ctx.organization_id())
            .ok_or(AppError::NotFound("Organização"))?;
        if let Some(name) = changes.name {
            organization.name = name;
        }
        if let Some(settings) = changes.settings {
            organization.settings = settings;
        }
        organization.updated_at = Utc::now();
        Ok(organization.clone())
    }

    async fn delete_organization(&self, ctx: &TenantContext) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let id = ctx.organization_id();
        let before = tables.organizations.len();
        tables.organizations.retain(|o| o.id != id);
        if tables.organizations.len() == before {
            return Err(AppError::NotFound("Organização"));
        }
        // ON DELETE CASCADE
        tables.memberships.retain(|m| m.organization_id != id);
        tables.invites.retain(|i| i.organization_id != id);
        tables.assets.retain(|a| a.organization_id != id);
        let removed: Vec<Uuid> = tables
            .licenses
            .iter()
            .filter(|l| l.organization_id == id)
            .map(|l| l.id)
            .collect();
        tables.licenses.retain(|l| l.organization_id != id);
        for license_id in removed {
            tables.secrets.remove(&license_id);
        }
        tables.subscriptions.retain(|s| s.organization_id != id);
        tables.audit.retain(|e| e.organization_id != id);
        tables.requests.retain(|r| r.organization_id != id);
        Ok(())
    }

    async fn find_first_owned_by(&self, user_id: Uuid) -> Result<Option<Organization>, AppError> {
        let tables = self.tables.lock().await;
        let first = tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.role == MemberRole::Owner)
            .filter_map(|m| tables.organizations.iter().find(|o| o.id == m.organization_id))
            .min_by_key(|o| o.created_at)
            .cloned();
        Ok(first)
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, ctx: &TenantContext) -> Result<Vec<MemberView>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.organization_id == ctx.organization_id())
            .filter_map(|m| {
                tables.users.iter().find(|u| u.id == m.user_id).map(|u| MemberView {
                    user_id: u.id,
                    email: u.email.clone(),
                    full_name: u.full_name.clone(),
                    role: m.role,
                    joined_at: m.created_at,
                })
            })
            .collect())
    }

    async fn count_members(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.count(ctx.organization_id(), ResourceKind::Member))
    }

    async fn update_role(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Membership>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter_mut()
            .find(|m| m.organization_id == ctx.organization_id() && m.user_id == user_id)
            .map(|m| {
                m.role = role;
                m.clone()
            }))
    }

    async fn delete_membership(&self, ctx: &TenantContext, user_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let organization_id = ctx.organization_id();
        let before = tables.memberships.len();
        tables
            .memberships
            .retain(|m| !(m.organization_id == organization_id && m.user_id == user_id));
        if tables.memberships.len() == before {
            return Ok(false);
        }

        let now = Utc::now();
        for asset in tables.assets.iter_mut().filter(|a| {
            a.organization_id == organization_id && a.assignee_user_id == Some(user_id)
        }) {
            asset.assignee_user_id = None;
            if asset.status == AssetStatus::Assigned {
                asset.status = AssetStatus::Available;
            }
            asset.updated_at = now;
        }
        for license in tables.licenses.iter_mut().filter(|l| {
            l.organization_id == organization_id && l.assignee_user_id == Some(user_id)
        }) {
            license.assignee_user_id = None;
            if license.status == LicenseStatus::Assigned {
                license.status = LicenseStatus::Available;
            }
            license.updated_at = now;
        }
        Ok(true)
    }
}

#[async_trait]
impl InviteRepository for MemoryStore {
    async fn create_invite(&self, ctx: &TenantContext, input: NewInvite) -> Result<Invite, AppError> {
        let mut tables = self.tables.lock().await;
        let organization_id = ctx.organization_id();
        if tables.invites.iter().any(|i| {
            i.organization_id == organization_id && i.email == input.email && i.accepted_at.is_none()
        }) {
            return Err(AppError::Conflict(
                "Já existe um convite pendente para este e-mail.".into(),
            ));
        }
        let invite = Invite {
            id: Uuid::new_v4(),
            organization_id,
            email: input.email,
            role: input.role,
            invited_by: input.invited_by,
            token: input.token,
            expires_at: input.expires_at,
            accepted_at: None,
            created_at: Utc::now(),
        };
        tables.invites.push(invite.clone());
        Ok(invite)
    }

    async fn list_invites(&self, ctx: &TenantContext) -> Result<Vec<Invite>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .invites
            .iter()
            .filter(|i| i.organization_id == ctx.organization_id())
            .cloned()
            .collect())
    }

    async fn find_unaccepted_for_email(
        &self,
        ctx: &TenantContext,
        email: &str,
    ) -> Result<Option<Invite>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .invites
            .iter()
            .find(|i| {
                i.organization_id == ctx.organization_id()
                    && i.email == email
                    && i.accepted_at.is_none()
            })
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invite>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.invites.iter().find(|i| i.token == token).cloned())
    }

    async fn delete_unaccepted(&self, ctx: &TenantContext, invite_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.invites.len();
        tables.invites.retain(|i| {
            !(i.id == invite_id
                && i.organization_id == ctx.organization_id()
                && i.accepted_at.is_none())
        });
        Ok(tables.invites.len() < before)
    }

    async fn accept(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AcceptOutcome, AppError> {
        let mut tables = self.tables.lock().await;
        let invite = tables
            .invites
            .iter()
            .find(|i| i.id == invite_id)
            .cloned()
            .ok_or(AppError::NotFound("Convite"))?;

        match invite.state(now) {
            InviteState::Accepted => return Err(AppError::InviteAlreadyUsed),
            InviteState::Expired => return Err(AppError::InviteExpired),
            InviteState::Pending => {}
        }

        let existing = tables
            .memberships
            .iter()
            .find(|m| m.organization_id == invite.organization_id && m.user_id == user_id)
            .cloned();

        let outcome = match existing {
            Some(membership) => AcceptOutcome {
                membership,
                already_member: true,
            },
            None => {
                // Falha aqui não consome o convite (rollback)
                tables.admit(invite.organization_id, ResourceKind::Member)?;
                let membership = Membership::new(invite.organization_id, user_id, invite.role);
                tables.memberships.push(membership.clone());
                AcceptOutcome {
                    membership,
                    already_member: false,
                }
            }
        };

        if let Some(stored) = tables.invites.iter_mut().find(|i| i.id == invite_id) {
            stored.accepted_at = Some(now);
        }
        Ok(outcome)
    }
}

#[async_trait]
impl AssetRepository for MemoryStore {
    async fn list_assets(&self, ctx: &TenantContext, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        let tables = self.tables.lock().await;
        let mut assets: Vec<Asset> = tables
            .assets
            .iter()
            .filter(|a| a.organization_id == ctx.organization_id() && filter.matches(a))
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(assets)
    }

    async fn get_asset(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<Asset>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .assets
            .iter()
            .find(|a| a.id == id && a.organization_id == ctx.organization_id())
            .cloned())
    }

    async fn create_asset(&self, ctx: &TenantContext, input: NewAsset) -> Result<Asset, AppError> {
        let mut tables = self.tables.lock().await;
        let organization_id = ctx.organization_id();
        tables.admit(organization_id, ResourceKind::Asset)?;
        if tables.serial_taken(organization_id, input.serial_number.as_deref(), None) {
            return Err(AppError::Conflict(
                "Já existe um ativo com este número de série.".into(),
            ));
        }
        let now = Utc::now();
        let asset = Asset {
            id: Uuid::new_v4(),
            organization_id,
            name: input.name,
            category: input.category,
            serial_number: input.serial_number,
            location: input.location,
            notes: input.notes,
            status: AssetStatus::Available,
            assignee_user_id: None,
            created_at: now,
            updated_at: now,
        };
        tables.assets.push(asset.clone());
        Ok(asset)
    }

    async fn update_asset(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        changes: AssetChanges,
    ) -> Result<Option<Asset>, AppError> {
        let mut tables = self.tables.lock().await;
        let organization_id = ctx.organization_id();
        if tables.serial_taken(organization_id, changes.serial_number.as_deref(), Some(id)) {
            return Err(AppError::Conflict(
                "Já existe um ativo com este número de série.".into(),
            ));
        }
        let Some(asset) = tables
            .assets
            .iter_mut()
            .find(|a| a.id == id && a.organization_id == organization_id)
        else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            asset.name = name;
        }
        if let Some(category) = changes.category {
            asset.category = category;
        }
        if changes.serial_number.is_some() {
            asset.serial_number = changes.serial_number;
        }
        if changes.location.is_some() {
            asset.location = changes.location;
        }
        if changes.notes.is_some() {
            asset.notes = changes.notes;
        }
        if let Some(status) = changes.status {
            asset.status = status;
        }
        asset.updated_at = Utc::now();
        Ok(Some(asset.clone()))
    }

    async fn set_asset_assignee(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignment: Assignment,
    ) -> Result<Option<Asset>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .assets
            .iter_mut()
            .find(|a| a.id == id && a.organization_id == ctx.organization_id())
            .map(|asset| {
                asset.assignee_user_id = assignment.assignee_user_id;
                asset.status = match assignment.assignee_user_id {
                    Some(_) => AssetStatus::Assigned,
                    None => AssetStatus::Available,
                };
                asset.updated_at = Utc::now();
                asset.clone()
            }))
    }

    async fn delete_asset(&self, ctx: &TenantContext, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.assets.len();
        tables
            .assets
            .retain(|a| !(a.id == id && a.organization_id == ctx.organization_id()));
        Ok(tables.assets.len() < before)
    }

    async fn count_assets(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.count(ctx.organization_id(), ResourceKind::Asset))
    }

    async fn count_assets_by_status(&self, ctx: &TenantContext) -> Result<Vec<StatusCount>, AppError> {
        let tables = self.tables.lock().await;
        let mut counts: HashMap<AssetStatus, i64> = HashMap::new();
        for asset in tables
            .assets
            .iter()
            .filter(|a| a.organization_id == ctx.organization_id())
        {
            *counts.entry(asset.status).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }
}

#[async_trait]
impl LicenseRepository for MemoryStore {
    async fn list_licenses(&self, ctx: &TenantContext) -> Result<Vec<License>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .licenses
            .iter()
            .filter(|l| l.organization_id == ctx.organization_id())
            .cloned()
            .collect())
    }

    async fn get_license(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<License>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .licenses
            .iter()
            .find(|l| l.id == id && l.organization_id == ctx.organization_id())
            .cloned())
    }

    async fn create_license(&self, ctx: &TenantContext, input: NewLicense) -> Result<License, AppError> {
        let mut tables = self.tables.lock().await;
        let organization_id = ctx.organization_id();
        tables.admit(organization_id, ResourceKind::License)?;
        let now = Utc::now();
        let license = License {
            id: Uuid::new_v4(),
            organization_id,
            product: input.product.clone(),
            masked_key: input.masked_key(),
            status: LicenseStatus::Available,
            assignee_user_id: None,
            expires_at: input.expires_at,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        tables.secrets.insert(license.id, input.full_key);
        tables.licenses.push(license.clone());
        Ok(license)
    }

    async fn update_license(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        changes: LicenseChanges,
    ) -> Result<Option<License>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(license) = tables
            .licenses
            .iter_mut()
            .find(|l| l.id == id && l.organization_id == ctx.organization_id())
        else {
            return Ok(None);
        };
        if let Some(product) = changes.product {
            license.product = product;
        }
        if let Some(full_key) = changes.full_key.as_deref() {
            license.masked_key = mask_key(full_key);
        }
        if let Some(status) = changes.status {
            license.status = status;
        }
        if changes.expires_at.is_some() {
            license.expires_at = changes.expires_at;
        }
        if changes.notes.is_some() {
            license.notes = changes.notes;
        }
        license.updated_at = Utc::now();
        let updated = license.clone();
        if let Some(full_key) = changes.full_key {
            tables.secrets.insert(id, full_key);
        }
        Ok(Some(updated))
    }

    async fn set_license_assignee(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        assignment: Assignment,
    ) -> Result<Option<License>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .licenses
            .iter_mut()
            .find(|l| l.id == id && l.organization_id == ctx.organization_id())
            .map(|license| {
                license.assignee_user_id = assignment.assignee_user_id;
                license.status = match assignment.assignee_user_id {
                    Some(_) => LicenseStatus::Assigned,
                    None => LicenseStatus::Available,
                };
                license.updated_at = Utc::now();
                license.clone()
            }))
    }

    async fn delete_license(&self, ctx: &TenantContext, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.licenses.len();
        tables
            .licenses
            .retain(|l| !(l.id == id && l.organization_id == ctx.organization_id()));
        let removed = tables.licenses.len() < before;
        if removed {
            tables.secrets.remove(&id);
        }
        Ok(removed)
    }

    async fn count_licenses(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.count(ctx.organization_id(), ResourceKind::License))
    }

    async fn count_expiring_before(&self, ctx: &TenantContext, date: NaiveDate) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        let today = Utc::now().date_naive();
        Ok(tables
            .licenses
            .iter()
            .filter(|l| l.organization_id == ctx.organization_id())
            .filter(|l| l.expires_at.is_some_and(|d| d >= today && d <= date))
            .count() as i64)
    }

    async fn reveal_full_key(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<String>, AppError> {
        let tables = self.tables.lock().await;
        let owned = tables
            .licenses
            .iter()
            .any(|l| l.id == id && l.organization_id == ctx.organization_id());
        Ok(owned.then(|| tables.secrets.get(&id).cloned()).flatten())
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn get_subscription(&self, ctx: &TenantContext) -> Result<Subscription, AppError> {
        let tables = self.tables.lock().await;
        tables
            .subscriptions
            .iter()
            .find(|s| s.organization_id == ctx.organization_id())
            .cloned()
            .ok_or(AppError::NotFound("Assinatura"))
    }

    async fn apply_billing_update(
        &self,
        organization_id: Uuid,
        update: BillingUpdate,
    ) -> Result<Subscription, AppError> {
        let mut tables = self.tables.lock().await;
        let sub = tables
            .subscriptions
            .iter_mut()
            .find(|s| s.organization_id == organization_id)
            .ok_or(AppError::NotFound("Assinatura"))?;
        if let Some(plan) = update.plan {
            sub.plan = plan;
        }
        sub.status = update.status;
        sub.external_supporter_email = Some(update.supporter_email);
        if update.external_subscription_id.is_some() {
            sub.external_subscription_id = update.external_subscription_id;
        }
        if update.current_period_start.is_some() {
            sub.current_period_start = update.current_period_start;
        }
        if update.current_period_end.is_some() {
            sub.current_period_end = update.current_period_end;
        }
        sub.updated_at = Utc::now();
        Ok(sub.clone())
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        let mut tables = self.tables.lock().await;
        let row = AuditLogEntry {
            id: Uuid::new_v4(),
            organization_id: entry.organization_id,
            resource_type: entry.resource_type.as_str().to_string(),
            resource_id: entry.resource_id,
            action: entry.action.to_string(),
            by_user_id: entry.by_user_id,
            to_user_id: entry.to_user_id,
            metadata: entry.metadata,
            created_at: Utc::now(),
        };
        tables.audit.push(row.clone());
        Ok(row)
    }

    async fn list_entries(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .audit
            .iter()
            .rev()
            .filter(|e| e.organization_id == ctx.organization_id() && filter.matches(e))
            .skip(filter.page_offset() as usize)
            .take(filter.page_size() as usize)
            .cloned()
            .collect())
    }

    async fn export_entries(
        &self,
        ctx: &TenantContext,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .audit
            .iter()
            .rev()
            .filter(|e| e.organization_id == ctx.organization_id() && filter.matches(e))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn create_request(&self, ctx: &TenantContext, input: NewRequest) -> Result<ResourceRequest, AppError> {
        let mut tables = self.tables.lock().await;
        let request = ResourceRequest {
            id: Uuid::new_v4(),
            organization_id: ctx.organization_id(),
            requested_by: input.requested_by,
            resource_type: input.resource_type,
            resource_id: input.resource_id,
            reason: input.reason,
            status: RequestStatus::Pending,
            decided_by: None,
            decided_at: None,
            created_at: Utc::now(),
        };
        tables.requests.push(request.clone());
        Ok(request)
    }

    async fn list_requests(
        &self,
        ctx: &TenantContext,
        requested_by: Option<Uuid>,
    ) -> Result<Vec<ResourceRequest>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter()
            .filter(|r| r.organization_id == ctx.organization_id())
            .filter(|r| requested_by.is_none_or(|uid| r.requested_by == uid))
            .cloned()
            .collect())
    }

    async fn get_request(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<ResourceRequest>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter()
            .find(|r| r.id == id && r.organization_id == ctx.organization_id())
            .cloned())
    }

    async fn decide_request(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        decision: RequestDecision,
    ) -> Result<Option<ResourceRequest>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter_mut()
            .find(|r| {
                r.id == id
                    && r.organization_id == ctx.organization_id()
                    && r.status == RequestStatus::Pending
            })
            .map(|r| {
                r.status = decision.status;
                r.decided_by = Some(decision.decided_by);
                r.decided_at = Some(Utc::now());
                r.clone()
            }))
    }

    async fn approve_request(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        decided_by: Uuid,
    ) -> Result<Option<ResourceRequest>, AppError> {
        let mut tables = self.tables.lock().await;
        let organization_id = ctx.organization_id();
        let Some(index) = tables.requests.iter().position(|r| {
            r.id == id && r.organization_id == organization_id && r.status == RequestStatus::Pending
        }) else {
            return Ok(None);
        };

        let request = tables.requests[index].clone();
        let now = Utc::now();
        if let Some(resource_id) = request.resource_id {
            let assigned = match request.resource_type {
                RequestedResource::Asset => tables
                    .assets
                    .iter_mut()
                    .find(|a| a.id == resource_id && a.organization_id == organization_id)
                    .map(|a| {
                        a.assignee_user_id = Some(request.requested_by);
                        a.status = AssetStatus::Assigned;
                        a.updated_at = now;
                    })
                    .is_some(),
                RequestedResource::License => tables
                    .licenses
                    .iter_mut()
                    .find(|l| l.id == resource_id && l.organization_id == organization_id)
                    .map(|l| {
                        l.assignee_user_id = Some(request.requested_by);
                        l.status = LicenseStatus::Assigned;
                        l.updated_at = now;
                    })
                    .is_some(),
            };
            if !assigned {
                return Err(AppError::NotFound(request.resource_type.label()));
            }
        }

        let decided = &mut tables.requests[index];
        decided.status = RequestStatus::Approved;
        decided.decided_by = Some(decided_by);
        decided.decided_at = Some(now);
        Ok(Some(decided.clone()))
    }

    async fn count_pending_requests(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter()
            .filter(|r| r.organization_id == ctx.organization_id() && r.status == RequestStatus::Pending)
            .count() as i64)
    }
}
