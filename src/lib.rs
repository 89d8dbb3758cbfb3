//! # Ficha Semanal
//!
//! Weekly timesheet collection service: short-lived submit tokens, a
//! bearer-token guarded form endpoint, API-key guarded machine endpoints
//! and a denormalized export for BI tools.
//!
//! ## Architecture
//!
//! - **domain**: submission model, validation, reporting rows, repository trait
//! - **infrastructure**: token codec, secret comparison, SeaORM and in-memory storage
//! - **interfaces**: HTTP router, middleware and handlers
//! - **client**: HTTP client with explicit credential handling
//! - **server**: runtime lifecycle

pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use client::{ClientError, Credential, FichaClient};
pub use config::{default_config_path, AppConfig};
pub use infrastructure::{init_database, DatabaseConfig};
pub use interfaces::http::create_api_router;
pub use server::{init_tracing, ServerHandle, ServerOptions};
