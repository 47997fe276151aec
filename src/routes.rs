// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, tenant_guard},
};

pub fn router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/webhooks/billing", post(handlers::billing::billing_webhook));

    // Só exigem sessão válida
    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route(
            "/api/users/me/organizations",
            get(handlers::auth::get_my_organizations),
        )
        .route(
            "/api/organizations",
            post(handlers::organizations::create_organization)
                .get(handlers::auth::get_my_organizations),
        )
        .route("/api/invites/accept", post(handlers::invites::accept_invite))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Sessão + associação à organização do x-organization-id
    let tenant_routes = Router::new()
        .route(
            "/api/organization",
            get(handlers::organizations::get_organization)
                .patch(handlers::organizations::update_organization)
                .delete(handlers::organizations::delete_organization),
        )
        .route(
            "/api/organization/subscription",
            get(handlers::organizations::get_subscription),
        )
        .route(
            "/api/organization/can-create/{resource}",
            get(handlers::organizations::can_create),
        )
        .route("/api/members", get(handlers::members::list_members))
        .route("/api/members/me", delete(handlers::members::leave_organization))
        .route(
            "/api/members/{user_id}",
            patch(handlers::members::change_role).delete(handlers::members::remove_member),
        )
        .route(
            "/api/invites",
            get(handlers::invites::list_invites).post(handlers::invites::create_invite),
        )
        .route("/api/invites/{id}", delete(handlers::invites::revoke_invite))
        .route(
            "/api/assets",
            get(handlers::assets::list_assets).post(handlers::assets::create_asset),
        )
        .route("/api/assets/import", post(handlers::assets::import_assets))
        .route(
            "/api/assets/{id}",
            get(handlers::assets::get_asset)
                .patch(handlers::assets::update_asset)
                .delete(handlers::assets::delete_asset),
        )
        .route("/api/assets/{id}/assign", post(handlers::assets::assign_asset))
        .route(
            "/api/licenses",
            get(handlers::licenses::list_licenses).post(handlers::licenses::create_license),
        )
        .route("/api/licenses/import", post(handlers::licenses::import_licenses))
        .route(
            "/api/licenses/{id}",
            get(handlers::licenses::get_license)
                .patch(handlers::licenses::update_license)
                .delete(handlers::licenses::delete_license),
        )
        .route(
            "/api/licenses/{id}/assign",
            post(handlers::licenses::assign_license),
        )
        .route(
            "/api/licenses/{id}/reveal",
            post(handlers::licenses::reveal_license_key),
        )
        .route("/api/audit", get(handlers::audit::list_audit))
        .route("/api/audit/export", get(handlers::audit::export_audit))
        .route(
            "/api/requests",
            get(handlers::requests::list_requests).post(handlers::requests::create_request),
        )
        .route(
            "/api/requests/{id}/approve",
            post(handlers::requests::approve_request),
        )
        .route("/api/requests/{id}/deny", post(handlers::requests::deny_request))
        .route(
            "/api/requests/{id}/cancel",
            post(handlers::requests::cancel_request),
        )
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(tenant_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
