//! # Quill API Server
//!
//! Actix-web HTTP surface of the Quill blogging API. The binary in
//! `main.rs` wires configuration and telemetry around [`handlers::configure_routes`].

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use state::AppState;
