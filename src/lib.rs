pub mod adapters;
pub mod configuration;
pub mod domain;
pub mod email;
pub mod link_signer;
pub mod messages;
pub mod routes;
pub mod startup;
pub mod subscription_manager;
pub mod telemetry;
