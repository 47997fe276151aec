pub mod asset;
pub mod audit;
pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod import;
pub mod invite;
pub mod license;
pub mod organization;
pub mod request;
pub mod subscription;
