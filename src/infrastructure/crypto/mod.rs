//! Token signing and secret comparison

pub mod jwt;
pub mod timing;

pub use jwt::{
    create_submit_token, decode, decode_at, encode, JwtConfig, JwtError, SubmitClaims,
    DEFAULT_SECRET, SUBMIT_ACTION, SUBMIT_AUDIENCE, TOKEN_TTL_SECS,
};
pub use timing::{timing_safe_eq, timing_safe_eq_opt};
