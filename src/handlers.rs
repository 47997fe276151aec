pub mod assets;
pub mod audit;
pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod invites;
pub mod licenses;
pub mod members;
pub mod organizations;
pub mod requests;
