//! Authentication middleware for Axum
//!
//! - `submit_token_middleware`: bearer token guard for the form write path
//! - `require_write_key` / `require_read_key`: static `x-api-key` gate

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::common::ApiError;
use crate::config::SecurityConfig;
use crate::infrastructure::crypto::{decode, timing_safe_eq_opt, JwtConfig, JwtError, SubmitClaims};

/// Header carrying the machine-to-machine secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    WrongAudience,
    OriginNotAllowed,
    MissingApiKey,
    ApiKeyNotConfigured,
    InvalidApiKey,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::WrongAudience | Self::OriginNotAllowed => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingToken => "Authentication token required",
            Self::InvalidToken => "Invalid authentication token",
            Self::ExpiredToken => "Token has expired",
            Self::WrongAudience => "Token not valid for this operation",
            Self::OriginNotAllowed => "Origin not allowed",
            Self::MissingApiKey => {
                "API key not provided. Include the x-api-key header in the request."
            }
            Self::ApiKeyNotConfigured => {
                "Server is not configured correctly. Contact the administrator."
            }
            Self::InvalidApiKey => "Invalid API key.",
        }
    }

    /// Label for `auth_failures_total`
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::WrongAudience => "wrong_audience",
            Self::OriginNotAllowed => "origin_not_allowed",
            Self::MissingApiKey => "missing_api_key",
            Self::ApiKeyNotConfigured => "api_key_not_configured",
            Self::InvalidApiKey => "invalid_api_key",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        metrics::counter!("auth_failures_total", "reason" => self.reason()).increment(1);
        ApiError::new(self.status(), self.message()).into_response()
    }
}

/// Configured secret per access class
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub write: Option<String>,
    pub read: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("write", &self.write.as_ref().map(|_| "[REDACTED]"))
            .field("read", &self.read.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Which configured key an endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyClass {
    Write,
    Read,
}

impl ApiKeys {
    fn expected(&self, class: ApiKeyClass) -> Option<&str> {
        match class {
            ApiKeyClass::Write => self.write.as_deref(),
            ApiKeyClass::Read => self.read.as_deref(),
        }
        .filter(|k| !k.is_empty())
    }
}

/// Authentication state shared by every guard
#[derive(Clone, Debug)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
    pub api_keys: ApiKeys,
    /// Skip API-key checks entirely
    pub development: bool,
}

impl AuthState {
    pub fn from_security(security: &SecurityConfig) -> Self {
        Self {
            jwt_config: security.jwt_config(),
            api_keys: ApiKeys {
                write: security.api_secret_key.clone(),
                read: security.powerbi_api_key.clone(),
            },
            development: security.is_development(),
        }
    }

    /// Check a bearer token for the submit action.
    ///
    /// `Ok(None)` means no secret is configured and the request passes
    /// unverified.
    pub fn verify_submit(&self, headers: &HeaderMap) -> Result<Option<SubmitClaims>, AuthError> {
        let Some(secret) = self.jwt_config.secret.as_deref() else {
            warn!("JWT_SECRET not configured; accepting submission without token verification");
            return Ok(None);
        };

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_token)
            .ok_or(AuthError::MissingToken)?;

        let claims: SubmitClaims = decode(token, secret.as_bytes())?;
        if !claims.permits_submit() {
            return Err(AuthError::WrongAudience);
        }
        Ok(Some(claims))
    }

    /// Check `x-api-key` against the secret of `class`.
    pub fn verify_api_key(&self, headers: &HeaderMap, class: ApiKeyClass) -> Result<(), AuthError> {
        if self.development {
            warn!(?class, "Development mode: API-key check skipped");
            return Ok(());
        }

        let provided = headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok());
        let expected = self.api_keys.expected(class);
        if timing_safe_eq_opt(provided, expected) {
            return Ok(());
        }

        match (provided, expected) {
            (None, _) => Err(AuthError::MissingApiKey),
            (Some(_), None) => {
                error!(?class, "API key for this endpoint is not configured");
                Err(AuthError::ApiKeyNotConfigured)
            }
            (Some(_), Some(_)) => {
                warn!(?class, "Rejected request with invalid API key");
                Err(AuthError::InvalidApiKey)
            }
        }
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Bearer token guard for the submission write path.
///
/// Verified claims are inserted into request extensions.
pub async fn submit_token_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match auth_state.verify_submit(request.headers()) {
        Ok(claims) => {
            if let Some(claims) = claims {
                request.extensions_mut().insert(claims);
            }
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn require_api_key(
    auth_state: &AuthState,
    class: ApiKeyClass,
    request: Request<Body>,
    next: Next,
) -> Response {
    match auth_state.verify_api_key(request.headers(), class) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// API-key gate, write class
pub async fn require_write_key(
    State(auth_state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    require_api_key(&auth_state, ApiKeyClass::Write, request, next).await
}

/// API-key gate, read class
pub async fn require_read_key(
    State(auth_state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    require_api_key(&auth_state, ApiKeyClass::Read, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::{encode, SubmitClaims};
    use axum::http::HeaderValue;
    use chrono::Utc;

    const SECRET: &str = "middleware-secret";

    fn state() -> AuthState {
        AuthState {
            jwt_config: JwtConfig::new(Some(SECRET.to_string())),
            api_keys: ApiKeys {
                write: Some("write-key".into()),
                read: Some("read-key".into()),
            },
            development: false,
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn api_key(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_valid_submit_token() {
        let claims = SubmitClaims::issue_at(Utc::now().timestamp());
        let token = encode(&claims, SECRET.as_bytes()).unwrap();
        let verified = state().verify_submit(&bearer(&token)).unwrap();
        assert_eq!(verified, Some(claims));
    }

    #[test]
    fn missing_header_is_401() {
        let err = state().verify_submit(&HeaderMap::new()).unwrap_err();
        assert_eq!(err, AuthError::MissingToken);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn non_bearer_scheme_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(state().verify_submit(&headers).unwrap_err(), AuthError::MissingToken);
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let claims = SubmitClaims::issue_at(Utc::now().timestamp());
        let token = encode(&claims, b"someone-else").unwrap();
        assert_eq!(state().verify_submit(&bearer(&token)).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let claims = SubmitClaims::issue_at(Utc::now().timestamp() - 7200);
        let token = encode(&claims, SECRET.as_bytes()).unwrap();
        let err = state().verify_submit(&bearer(&token)).unwrap_err();
        assert_eq!(err, AuthError::ExpiredToken);
        assert_eq!(err.message(), "Token has expired");
    }

    #[test]
    fn wrong_audience_or_action_is_403() {
        let mut claims = SubmitClaims::issue_at(Utc::now().timestamp());
        claims.aud = "another-app".into();
        let token = encode(&claims, SECRET.as_bytes()).unwrap();
        let err = state().verify_submit(&bearer(&token)).unwrap_err();
        assert_eq!(err, AuthError::WrongAudience);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let mut claims = SubmitClaims::issue_at(Utc::now().timestamp());
        claims.action = "read".into();
        let token = encode(&claims, SECRET.as_bytes()).unwrap();
        assert_eq!(state().verify_submit(&bearer(&token)).unwrap_err(), AuthError::WrongAudience);
    }

    #[test]
    fn unconfigured_secret_passes_through() {
        let open = AuthState {
            jwt_config: JwtConfig::new(None),
            ..state()
        };
        assert_eq!(open.verify_submit(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn api_key_classes_are_separate() {
        let s = state();
        assert!(s.verify_api_key(&api_key("write-key"), ApiKeyClass::Write).is_ok());
        assert!(s.verify_api_key(&api_key("read-key"), ApiKeyClass::Read).is_ok());
        assert_eq!(
            s.verify_api_key(&api_key("read-key"), ApiKeyClass::Write).unwrap_err(),
            AuthError::InvalidApiKey
        );
        assert_eq!(
            s.verify_api_key(&HeaderMap::new(), ApiKeyClass::Read).unwrap_err(),
            AuthError::MissingApiKey
        );
    }

    #[test]
    fn unconfigured_api_key_rejects_everything() {
        let s = AuthState {
            api_keys: ApiKeys {
                write: Some(String::new()),
                read: None,
            },
            ..state()
        };
        let err = s.verify_api_key(&api_key("anything"), ApiKeyClass::Read).unwrap_err();
        assert_eq!(err, AuthError::ApiKeyNotConfigured);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            s.verify_api_key(&api_key(""), ApiKeyClass::Write).unwrap_err(),
            AuthError::ApiKeyNotConfigured
        );
        assert_eq!(
            s.verify_api_key(&HeaderMap::new(), ApiKeyClass::Read).unwrap_err(),
            AuthError::MissingApiKey
        );
    }

    #[test]
    fn development_mode_skips_api_key() {
        let dev = AuthState {
            development: true,
            api_keys: ApiKeys::default(),
            ..state()
        };
        assert!(dev.verify_api_key(&HeaderMap::new(), ApiKeyClass::Write).is_ok());
    }

    #[test]
    fn api_keys_debug_is_redacted() {
        let rendered = format!("{:?}", state().api_keys);
        assert!(!rendered.contains("write-key"));
    }
}
