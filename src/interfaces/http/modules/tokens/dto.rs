//! Token DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Freshly issued submit token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub success: bool,
    /// Compact HS256 token, `header.payload.signature`
    pub token: String,
    /// Lifetime in seconds
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}
