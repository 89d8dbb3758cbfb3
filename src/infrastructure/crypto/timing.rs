//! Constant-time comparison for shared secrets

use subtle::ConstantTimeEq;

/// Compare two secrets without leaking the position of the first mismatch.
///
/// Unequal lengths return `false` immediately, so the length itself is
/// observable through timing. The byte comparison is constant-time.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Like [`timing_safe_eq`], but an absent value on either side never matches.
pub fn timing_safe_eq_opt(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => timing_safe_eq(a, b),
        _ => false,
    }
}
