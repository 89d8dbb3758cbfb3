//! Token issuance: `GET /get-token`

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
