// src/config.rs

use std::{env, sync::Arc};

use anyhow::Context;
use chrono::Duration;

use crate::{
    common::i18n::I18nStore,
    db::Repositories,
    services::{
        asset_service::AssetService, audit_service::AuditService, auth::AuthService,
        dashboard_service::DashboardService, import_service::ImportService,
        invite_service::InviteService, license_service::LicenseService,
        member_service::MemberService, organization_service::OrganizationService,
        plan_service::PlanService, request_service::RequestService,
        tenancy_service::TenancyService, webhook_service::WebhookService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub billing_webhook_secret: Option<String>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub invite_ttl: Duration,
    pub token_ttl: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        // Sem segredo, o webhook de cobrança recusa tudo
        let billing_webhook_secret = env::var("BILLING_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if billing_webhook_secret.is_none() {
            tracing::warn!("BILLING_WEBHOOK_SECRET não definido: webhook de cobrança desativado");
        }

        Ok(Self {
            database_url,
            jwt_secret,
            billing_webhook_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            invite_ttl: ttl_from("INVITE_TTL_DAYS", parse_var("INVITE_TTL_DAYS", 7)?, Duration::try_days)?,
            token_ttl: ttl_from("TOKEN_TTL_HOURS", parse_var("TOKEN_TTL_HOURS", 168)?, Duration::try_hours)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests(billing_webhook_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: "segredo-de-teste".to_string(),
            billing_webhook_secret: Some(billing_webhook_secret.to_string()),
            bind_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            invite_ttl: Duration::days(7),
            token_ttl: Duration::hours(1),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Prazo positivo e representável; fora disso a inicialização falha.
fn ttl_from(name: &str, amount: i64, unit: fn(i64) -> Option<Duration>) -> anyhow::Result<Duration> {
    if amount <= 0 {
        anyhow::bail!("{name} deve ser positivo: {amount}");
    }
    unit(amount).with_context(|| format!("{name} fora do intervalo suportado: {amount}"))
}

#[derive(Clone)]
pub struct AppState {
    #[cfg(test)]
    pub repos: Repositories,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub tenancy_service: TenancyService,
    pub audit_service: AuditService,
    pub plan_service: PlanService,
    pub organization_service: OrganizationService,
    pub member_service: MemberService,
    pub invite_service: InviteService,
    pub asset_service: AssetService,
    pub license_service: LicenseService,
    pub import_service: ImportService,
    pub request_service: RequestService,
    pub webhook_service: WebhookService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    /// Monta o gráfico de dependências sobre um conjunto de repositórios.
    pub fn new(config: &Config, repos: Repositories) -> Self {
        let auth_service = AuthService::new(
            repos.users.clone(),
            config.jwt_secret.clone(),
            config.token_ttl,
        );
        let tenancy_service = TenancyService::new(repos.memberships.clone());
        let audit_service = AuditService::new(repos.audit.clone(), repos.subscriptions.clone());
        let plan_service = PlanService::new(
            repos.subscriptions.clone(),
            repos.assets.clone(),
            repos.licenses.clone(),
            repos.memberships.clone(),
        );
        let organization_service =
            OrganizationService::new(repos.organizations.clone(), audit_service.clone());
        let member_service = MemberService::new(repos.memberships.clone(), audit_service.clone());
        let invite_service = InviteService::new(
            repos.invites.clone(),
            repos.memberships.clone(),
            repos.users.clone(),
            plan_service.clone(),
            audit_service.clone(),
            config.invite_ttl,
        );
        let asset_service = AssetService::new(
            repos.assets.clone(),
            tenancy_service.clone(),
            audit_service.clone(),
        );
        let license_service = LicenseService::new(
            repos.licenses.clone(),
            tenancy_service.clone(),
            audit_service.clone(),
        );
        let import_service = ImportService::new(
            asset_service.clone(),
            license_service.clone(),
            plan_service.clone(),
        );
        let request_service = RequestService::new(
            repos.requests.clone(),
            repos.assets.clone(),
            repos.licenses.clone(),
            tenancy_service.clone(),
            audit_service.clone(),
        );
        let webhook_service = WebhookService::new(
            config.billing_webhook_secret.clone(),
            repos.users.clone(),
            repos.organizations.clone(),
            repos.subscriptions.clone(),
            audit_service.clone(),
        );
        let dashboard_service = DashboardService::new(
            plan_service.clone(),
            repos.assets.clone(),
            repos.licenses.clone(),
            repos.requests.clone(),
        );

        Self {
            #[cfg(test)]
            repos,
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            tenancy_service,
            audit_service,
            plan_service,
            organization_service,
            member_service,
            invite_service,
            asset_service,
            license_service,
            import_service,
            request_service,
            webhook_service,
            dashboard_service,
        }
    }
}
