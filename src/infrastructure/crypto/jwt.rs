//! Compact HS256 token codec
//!
//! Tokens are `header.payload.signature`, each segment base64url without
//! padding. Only HMAC-SHA256 is supported; the header is fixed and never
//! consulted when verifying, so there is no algorithm negotiation.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use super::timing::timing_safe_eq;

type HmacSha256 = Hmac<Sha256>;

/// Secret used when `JWT_SECRET` is not configured.
pub const DEFAULT_SECRET: &str = "default-secret-change-in-production";

/// Audience every submit token is bound to.
pub const SUBMIT_AUDIENCE: &str = "ficha-semanal";

/// The only action a submit token grants.
pub const SUBMIT_ACTION: &str = "submit";

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("token must have exactly three segments")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token payload")]
    MalformedPayload,

    #[error("token has expired")]
    Expired,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// JWT configuration
#[derive(Clone, Default)]
pub struct JwtConfig {
    /// Secret key for signing tokens. `None` means the operator left it unset.
    pub secret: Option<String>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Key used for issuing tokens, falling back to [`DEFAULT_SECRET`].
    pub fn signing_secret(&self) -> &str {
        self.secret.as_deref().unwrap_or(DEFAULT_SECRET)
    }
}

#[derive(Serialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

const HEADER: Header<'static> = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Claims carried by a submit token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitClaims {
    /// Random session identifier (128 bits, hex)
    pub sub: String,
    /// Audience
    pub aud: String,
    /// Permitted action
    pub action: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id (64 bits, hex)
    pub jti: String,
}

impl SubmitClaims {
    /// Fresh claims issued at `now`.
    pub fn issue_at(now: i64) -> Self {
        let mut rng = rand::thread_rng();
        let session: [u8; 16] = rng.gen();
        let token_id: [u8; 8] = rng.gen();

        Self {
            sub: hex::encode(session),
            aud: SUBMIT_AUDIENCE.to_string(),
            action: SUBMIT_ACTION.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            jti: hex::encode(token_id),
        }
    }

    /// Whether these claims grant the submit action to this application.
    pub fn permits_submit(&self) -> bool {
        self.aud == SUBMIT_AUDIENCE && self.action == SUBMIT_ACTION
    }
}

fn sign(message: &str, secret: &[u8]) -> Result<String, JwtError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| JwtError::Encoding(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Serialize and sign `claims`.
pub fn encode<T: Serialize>(claims: &T, secret: &[u8]) -> Result<String, JwtError> {
    let header_json =
        serde_json::to_vec(&HEADER).map_err(|e| JwtError::Encoding(e.to_string()))?;
    let payload_json =
        serde_json::to_vec(claims).map_err(|e| JwtError::Encoding(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    );
    let signature = sign(&signing_input, secret)?;

    Ok(format!("{}.{}", signing_input, signature))
}

/// `exp` as Unix seconds. `null` counts as absent; numeric strings are
/// accepted; any other non-number is a malformed payload.
fn expiry(claims: &Value) -> Result<Option<i64>, JwtError> {
    match claims.get("exp") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .map(Some)
            .ok_or(JwtError::MalformedPayload),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| Some(f.floor() as i64))
            .ok_or(JwtError::MalformedPayload),
        Some(_) => Err(JwtError::MalformedPayload),
    }
}

/// Verify `token` against the current clock.
pub fn decode<T: DeserializeOwned>(token: &str, secret: &[u8]) -> Result<T, JwtError> {
    decode_at(token, secret, Utc::now().timestamp())
}

/// Verify `token` as if the current time were `now` (Unix seconds).
pub fn decode_at<T: DeserializeOwned>(token: &str, secret: &[u8], now: i64) -> Result<T, JwtError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = parts.as_slice() else {
        return Err(JwtError::Malformed);
    };

    let expected = sign(&format!("{}.{}", header_b64, payload_b64), secret)?;
    if !timing_safe_eq(&expected, signature_b64) {
        return Err(JwtError::InvalidSignature);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| JwtError::MalformedPayload)?;
    let claims: Value =
        serde_json::from_slice(&payload).map_err(|_| JwtError::MalformedPayload)?;

    if let Some(exp) = expiry(&claims)? {
        if now >= exp {
            return Err(JwtError::Expired);
        }
    }

    serde_json::from_value(claims).map_err(|_| JwtError::MalformedPayload)
}

/// Mint a submit token with the configured (or default) secret.
pub fn create_submit_token(config: &JwtConfig) -> Result<(String, SubmitClaims), JwtError> {
    let claims = SubmitClaims::issue_at(Utc::now().timestamp());
    let token = encode(&claims, config.signing_secret().as_bytes())?;
    Ok((token, claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &[u8] = b"unit-test-secret";

    fn flip_bit(token: &str, segment: usize, index: usize, bit: u8) -> String {
        let mut parts: Vec<Vec<u8>> = token.split('.').map(|p| p.as_bytes().to_vec()).collect();
        parts[segment][index] ^= 1 << bit;
        parts
            .into_iter()
            .map(|p| String::from_utf8_lossy(&p).into_owned())
            .collect::<Vec<_>>()
            .join(".")
    }

    #[test]
    fn test_create_and_verify_token() {
        let claims = SubmitClaims::issue_at(1_700_000_000);
        let token = encode(&claims, SECRET).unwrap();

        let decoded: SubmitClaims = decode_at(&token, SECRET, 1_700_000_001).unwrap();
        assert_eq!(decoded, claims);
        assert!(decoded.permits_submit());
        assert_eq!(decoded.exp - decoded.iat, TOKEN_TTL_SECS);
        assert_eq!(decoded.sub.len(), 32);
        assert_eq!(decoded.jti.len(), 16);
    }

    #[test]
    fn header_is_fixed_hs256() {
        let token = encode(&json!({"x": 1}), SECRET).unwrap();
        let header = token.split('.').next().unwrap();
        let header = URL_SAFE_NO_PAD.decode(header).unwrap();
        assert_eq!(header, br#"{"alg":"HS256","typ":"JWT"}"#);
        assert!(!token.contains('='));
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        assert_eq!(decode::<Value>("abc", SECRET), Err(JwtError::Malformed));
        assert_eq!(decode::<Value>("a.b", SECRET), Err(JwtError::Malformed));
        assert_eq!(decode::<Value>("a.b.c.d", SECRET), Err(JwtError::Malformed));
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let token = encode(&json!({"sub": "x"}), SECRET).unwrap();
        assert_eq!(
            decode::<Value>(&token, b"other-secret"),
            Err(JwtError::InvalidSignature)
        );
    }

    #[test]
    fn any_bit_flip_fails_signature() {
        let token = encode(&SubmitClaims::issue_at(1_700_000_000), SECRET).unwrap();
        let lens: Vec<usize> = token.split('.').map(str::len).collect();

        for (segment, len) in lens.into_iter().enumerate() {
            for index in [0, len / 2, len - 1] {
                for bit in 0..7 {
                    let tampered = flip_bit(&token, segment, index, bit);
                    if tampered.split('.').count() != 3 {
                        // Flipping into a '.' changes the segment count instead.
                        assert_eq!(
                            decode_at::<Value>(&tampered, SECRET, 1_700_000_001),
                            Err(JwtError::Malformed)
                        );
                        continue;
                    }
                    assert_eq!(
                        decode_at::<Value>(&tampered, SECRET, 1_700_000_001),
                        Err(JwtError::InvalidSignature),
                        "segment {segment} index {index} bit {bit}"
                    );
                }
            }
        }
    }

    #[test]
    fn expiry_boundary() {
        let claims = SubmitClaims::issue_at(1_000);
        let token = encode(&claims, SECRET).unwrap();

        assert!(decode_at::<SubmitClaims>(&token, SECRET, claims.exp - 1).is_ok());
        assert_eq!(
            decode_at::<SubmitClaims>(&token, SECRET, claims.exp),
            Err(JwtError::Expired)
        );
        assert_eq!(
            decode_at::<SubmitClaims>(&token, SECRET, claims.exp + 3600),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn tokens_without_exp_never_expire() {
        let token = encode(&json!({"sub": "x"}), SECRET).unwrap();
        assert!(decode_at::<Value>(&token, SECRET, i64::MAX).is_ok());
    }

    #[test]
    fn null_exp_counts_as_absent() {
        let token = encode(&json!({"sub": "x", "exp": null}), SECRET).unwrap();
        assert!(decode_at::<Value>(&token, SECRET, i64::MAX).is_ok());
    }

    #[test]
    fn numeric_string_exp_is_enforced() {
        let token = encode(&json!({"sub": "x", "exp": "4102444800"}), SECRET).unwrap();
        assert!(decode_at::<Value>(&token, SECRET, 4_102_444_799).is_ok());
        assert_eq!(
            decode_at::<Value>(&token, SECRET, 4_102_444_800),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn non_numeric_exp_is_malformed() {
        for exp in [json!("soon"), json!(true), json!({"at": 1})] {
            let token = encode(&json!({"sub": "x", "exp": exp}), SECRET).unwrap();
            assert_eq!(
                decode_at::<Value>(&token, SECRET, 0),
                Err(JwtError::MalformedPayload)
            );
        }
    }

    #[test]
    fn signed_garbage_payload_is_malformed() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let input = format!("{}.{}", header, payload);
        let token = format!("{}.{}", input, sign(&input, SECRET).unwrap());

        assert_eq!(decode::<Value>(&token, SECRET), Err(JwtError::MalformedPayload));
    }

    #[test]
    fn signed_payload_of_wrong_shape_is_malformed() {
        let token = encode(&json!({"sub": 42}), SECRET).unwrap();
        assert_eq!(
            decode::<SubmitClaims>(&token, SECRET),
            Err(JwtError::MalformedPayload)
        );
    }

    #[test]
    fn default_secret_used_when_unconfigured() {
        let config = JwtConfig::new(None);
        assert!(!config.is_configured());
        assert_eq!(config.signing_secret(), DEFAULT_SECRET);

        let (token, claims) = create_submit_token(&config).unwrap();
        let decoded: SubmitClaims = decode(&token, DEFAULT_SECRET.as_bytes()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn empty_secret_counts_as_unconfigured() {
        assert!(!JwtConfig::new(Some(String::new())).is_configured());
        assert!(JwtConfig::new(Some("s".into())).is_configured());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = JwtConfig::new(Some("top-secret".into()));
        assert!(!format!("{:?}", config).contains("top-secret"));
    }
}
