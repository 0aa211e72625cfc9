pub mod api;
pub mod logger;
pub mod settings;

pub mod client;
pub mod server;

pub mod application_impl;
pub mod application_port;
pub mod domain_model;
pub mod domain_port;
pub mod infra;
pub mod infra_memory;
