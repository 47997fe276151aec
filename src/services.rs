pub mod asset_service;
pub mod audit_service;
pub mod auth;
pub mod dashboard_service;
pub mod import_service;
pub mod invite_service;
pub mod license_service;
pub mod member_service;
pub mod organization_service;
pub mod plan_service;
pub mod policy;
pub mod request_service;
pub mod tenancy_service;
pub mod webhook_service;

#[cfg(test)]
pub(crate) mod test_support;
