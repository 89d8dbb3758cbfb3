//! Token issuance handler

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error, warn};

use super::dto::TokenResponse;
use crate::infrastructure::crypto::{create_submit_token, JwtConfig, TOKEN_TTL_SECS};
use crate::interfaces::http::common::{ApiError, ErrorBody};
use crate::interfaces::http::middleware::AuthError;

#[derive(Clone, Debug)]
pub struct TokenState {
    pub jwt_config: JwtConfig,
    /// Hostnames allowed to request tokens; empty allows any caller
    pub allowed_origins: Arc<Vec<String>>,
}

/// Hostname of the `Origin` header, or of `Referer` when there is no origin.
fn request_host(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(header::ORIGIN)
        .or_else(|| headers.get(header::REFERER))?
        .to_str()
        .ok()?;
    let uri: Uri = raw.parse().ok()?;
    uri.host().map(str::to_ascii_lowercase)
}

impl TokenState {
    pub fn origin_allowed(&self, headers: &HeaderMap) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match request_host(headers) {
            Some(host) => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&host)),
            None => false,
        }
    }
}

#[utoipa::path(
    get,
    path = "/get-token",
    tag = "Tokens",
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 403, description = "Origin not allowed", body = ErrorBody),
        (status = 500, description = "Token could not be signed", body = ErrorBody)
    )
)]
pub async fn get_token(State(state): State<TokenState>, headers: HeaderMap) -> Response {
    if !state.origin_allowed(&headers) {
        warn!(origin = ?request_host(&headers), "Token request from disallowed origin");
        return AuthError::OriginNotAllowed.into_response();
    }

    if !state.jwt_config.is_configured() {
        warn!("JWT_SECRET not configured; signing with the default secret");
    }

    match create_submit_token(&state.jwt_config) {
        Ok((token, claims)) => {
            metrics::counter!("tokens_issued_total").increment(1);
            debug!(jti = %claims.jti, "Issued submit token");
            Json(TokenResponse {
                success: true,
                token,
                expires_in: TOKEN_TTL_SECS,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to sign token: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Error generating token").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn state(origins: &[&str]) -> TokenState {
        TokenState {
            jwt_config: JwtConfig::new(Some("s".into())),
            allowed_origins: Arc::new(origins.iter().map(|o| o.to_string()).collect()),
        }
    }

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        assert!(state(&[]).origin_allowed(&HeaderMap::new()));
    }

    #[test]
    fn origin_hostname_must_be_listed() {
        let s = state(&["fichas.example.com"]);
        assert!(s.origin_allowed(&headers(&[(header::ORIGIN, "https://fichas.example.com")])));
        assert!(s.origin_allowed(&headers(&[(header::ORIGIN, "https://FICHAS.example.com:8443")])));
        assert!(!s.origin_allowed(&headers(&[(header::ORIGIN, "https://evil.example.net")])));
        assert!(!s.origin_allowed(&HeaderMap::new()));
        assert!(!s.origin_allowed(&headers(&[(header::ORIGIN, "null")])));
    }

    #[test]
    fn referer_is_used_without_origin() {
        let s = state(&["fichas.example.com"]);
        assert!(s.origin_allowed(&headers(&[(
            header::REFERER,
            "https://fichas.example.com/form?step=2"
        )])));
    }
}
