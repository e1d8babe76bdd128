use super::{AuthConfig, AuthType, Authenticator};
use crate::server::ServletRequest;
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use tracing::debug;

/// HTTP Basic authenticator backed by the policy's `users` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuthenticator;

/// Lowercase hex SHA-256 digest of a clear-text password.
#[must_use]
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl BasicAuthenticator {
    /// Decode `Authorization: Basic <base64(user:pass)>`.
    fn credentials(header: &str) -> Option<(String, String)> {
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;
        Some((user.to_string(), password.to_string()))
    }
}

impl Authenticator for BasicAuthenticator {
    fn authenticate(&self, config: &AuthConfig, request: &dyn ServletRequest) -> bool {
        if config.auth_type != AuthType::Basic {
            return false;
        }
        let Some((user, password)) = request.header("authorization").and_then(Self::credentials)
        else {
            debug!(realm = %config.realm, "No basic credentials supplied");
            return false;
        };
        let accepted = config
            .users
            .get(&user)
            .is_some_and(|expected| expected.eq_ignore_ascii_case(&password_digest(&password)));
        debug!(realm = %config.realm, user = %user, accepted, "Basic credentials checked");
        accepted
    }
}
