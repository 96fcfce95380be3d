use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;
use tracing::{debug, warn};

use crate::claims::DecodedClaims;
use crate::error::{AuthError, AuthResult};
use crate::roles::Role;
use crate::session::TokenStore;

/// Decode the payload segment of a JWT. The header and signature are not
/// looked at, so any `alg` (including `none`) is accepted. The result is
/// display data, not proof of identity.
pub fn decode_unverified(token: &str) -> AuthResult<DecodedClaims> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_header), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(AuthError::Decode("token has no payload segment".into())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| AuthError::Decode(err.to_string()))?;
    let claims: Value =
        serde_json::from_slice(&bytes).map_err(|err| AuthError::InvalidJson(err.to_string()))?;
    DecodedClaims::try_from(claims)
}

/// Reads the current session and derives claims on every call.
#[derive(Clone)]
pub struct ClaimsResolver {
    store: TokenStore,
}

impl ClaimsResolver {
    pub fn new(store: TokenStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn resolve(&self) -> Option<DecodedClaims> {
        let blob = self.store.read()?;
        match decode_unverified(&blob.token) {
            Ok(claims) => {
                debug!(role = %claims.role, "resolved session claims");
                Some(claims)
            }
            Err(err) => {
                warn!(error = %err, "failed to decode session token");
                None
            }
        }
    }

    /// Resolved role, `Unknown` when there is no decodable session.
    pub fn role(&self) -> Role {
        self.resolve().map(|claims| claims.role).unwrap_or_default()
    }
}
