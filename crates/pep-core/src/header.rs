//! Authorization header normalization.

const BEARER_SCHEME: &str = "bearer ";

/// Strip a leading `Bearer ` scheme token from a raw authorization header.
///
/// The scheme is matched case-insensitively, and duplicated scheme tokens
/// (`Bearer bearer abc`) are removed as well. The token itself is returned
/// untouched, including any whitespace or casing it carries.
pub fn clean_auth_header(raw: &str) -> &str {
    let mut token = raw;
    while let Some(rest) = strip_bearer(token) {
        token = rest;
    }
    token
}

fn strip_bearer(value: &str) -> Option<&str> {
    let prefix = value.get(..BEARER_SCHEME.len())?;
    if prefix.eq_ignore_ascii_case(BEARER_SCHEME) {
        Some(&value[BEARER_SCHEME.len()..])
    } else {
        None
    }
}
