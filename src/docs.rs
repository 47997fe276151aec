// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_organizations,

        // --- Organizations ---
        handlers::organizations::create_organization,
        handlers::organizations::get_organization,
        handlers::organizations::update_organization,
        handlers::organizations::delete_organization,
        handlers::organizations::get_subscription,
        handlers::organizations::can_create,

        // --- Members ---
        handlers::members::list_members,
        handlers::members::change_role,
        handlers::members::remove_member,
        handlers::members::leave_organization,

        // --- Invites ---
        handlers::invites::list_invites,
        handlers::invites::create_invite,
        handlers::invites::revoke_invite,
        handlers::invites::accept_invite,

        // --- Assets ---
        handlers::assets::list_assets,
        handlers::assets::get_asset,
        handlers::assets::create_asset,
        handlers::assets::update_asset,
        handlers::assets::assign_asset,
        handlers::assets::delete_asset,
        handlers::assets::import_assets,

        // --- Licenses ---
        handlers::licenses::list_licenses,
        handlers::licenses::get_license,
        handlers::licenses::create_license,
        handlers::licenses::update_license,
        handlers::licenses::assign_license,
        handlers::licenses::reveal_license_key,
        handlers::licenses::delete_license,
        handlers::licenses::import_licenses,

        // --- Audit ---
        handlers::audit::list_audit,
        handlers::audit::export_audit,

        // --- Requests ---
        handlers::requests::list_requests,
        handlers::requests::create_request,
        handlers::requests::approve_request,
        handlers::requests::deny_request,
        handlers::requests::cancel_request,

        // --- Billing ---
        handlers::billing::billing_webhook,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Organizations ---
            models::organization::MemberRole,
            models::organization::Organization,
            models::organization::Membership,
            models::organization::OrganizationWithRole,
            models::organization::MemberView,
            handlers::organizations::CreateOrganizationPayload,
            handlers::organizations::UpdateOrganizationPayload,
            handlers::members::ChangeRolePayload,

            // --- Plans ---
            models::subscription::Plan,
            models::subscription::SubscriptionStatus,
            models::subscription::ResourceKind,
            models::subscription::Feature,
            models::subscription::PlanLimits,
            models::subscription::UsageMeter,
            models::subscription::PlanUsage,
            models::subscription::CreateAllowance,
            models::subscription::Subscription,

            // --- Invites ---
            models::invite::Invite,
            models::invite::InviteState,
            models::invite::InviteView,
            models::invite::InviteCreated,
            models::invite::AcceptOutcome,
            handlers::invites::CreateInvitePayload,
            handlers::invites::AcceptInvitePayload,

            // --- Assets ---
            models::asset::AssetCategory,
            models::asset::AssetStatus,
            models::asset::Asset,
            models::asset::StatusCount,
            handlers::assets::CreateAssetPayload,
            handlers::assets::UpdateAssetPayload,
            handlers::assets::AssignPayload,

            // --- Licenses ---
            models::license::LicenseStatus,
            models::license::License,
            models::license::RevealedKey,
            handlers::licenses::CreateLicensePayload,
            handlers::licenses::UpdateLicensePayload,

            // --- Import ---
            models::import::RowError,
            models::import::ImportReport,

            // --- Audit ---
            models::audit::AuditResource,
            models::audit::AuditLogEntry,

            // --- Requests ---
            models::request::RequestedResource,
            models::request::RequestStatus,
            models::request::ResourceRequest,
            handlers::requests::CreateRequestPayload,

            // --- Billing ---
            models::billing::BillingEvent,
            models::billing::WebhookOutcome,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e suas Organizações"),
        (name = "Organizations", description = "Organizações (tenants) e Assinatura"),
        (name = "Members", description = "Membros e Papéis"),
        (name = "Invites", description = "Convites por E-mail"),
        (name = "Assets", description = "Inventário de Ativos"),
        (name = "Licenses", description = "Licenças de Software"),
        (name = "Audit", description = "Trilha de Auditoria"),
        (name = "Requests", description = "Pedidos de Ativos e Licenças"),
        (name = "Billing", description = "Webhook do Provedor de Pagamentos"),
        (name = "Dashboard", description = "Indicadores da Organização")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
