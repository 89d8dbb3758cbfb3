//! HTTP interface
//!
//! - `middleware`: bearer-token and API-key guards
//! - `modules`: handlers per feature
//! - `router`: route table with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc};
