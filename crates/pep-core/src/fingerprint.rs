//! Cache keys derived from the authorization-relevant facts of a request.

use sha2::{Digest, Sha256};
use std::fmt;

/// The facts of a single request that an authorization decision depends on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationQuery<'a> {
    /// HTTP method, e.g. `GET`
    pub method: &'a str,
    /// Request path, e.g. `/orders`
    pub path: &'a str,
    /// Bearer token with the scheme already stripped
    pub token: &'a str,
}

impl<'a> AuthorizationQuery<'a> {
    pub fn new(method: &'a str, path: &'a str, token: &'a str) -> Self {
        Self {
            method,
            path,
            token,
        }
    }

    /// Derive the decision cache key for this query
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.method, self.path, self.token)
    }
}

/// Stable decision cache key
///
/// Lowercase hex SHA-256 over the length-prefixed fields, so field boundaries
/// are unambiguous and raw tokens never end up in the cache map or the logs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(method: &str, path: &str, token: &str) -> Self {
        let mut hasher = Sha256::new();
        for field in [method, path, token] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        let out = hasher.finalize();
        Fingerprint(base16ct::lower::encode_string(&out))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
