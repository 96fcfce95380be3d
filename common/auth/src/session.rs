use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::claims::lenient_id;
use crate::config::SessionConfig;
use crate::error::{AuthError, AuthResult};
use crate::storage::{KeyValueStorage, MemoryStorage};

pub const DEFAULT_SESSION_KEY: &str = "session";

/// Persisted login result: the bearer token plus the profile echoed by the
/// login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBlob {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl SessionBlob {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.user = Some(user);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub classlevel: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub contact: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub school_id: Option<String>,
    #[serde(default)]
    pub school_name: Option<String>,
}

/// Parse a stored blob. A JSON `null` or a blank token counts as no session.
pub fn parse_blob(raw: &str) -> AuthResult<Option<SessionBlob>> {
    let blob: Option<SessionBlob> = serde_json::from_str(raw)
        .map_err(|err| AuthError::MalformedSession(err.to_string()))?;
    Ok(blob.filter(|blob| !blob.token.trim().is_empty()))
}

/// Owns the single storage key holding the session blob.
///
/// Every successful write or clear bumps a generation counter that guards
/// subscribe to, so a reader waiting on the store learns about completed
/// writes instead of guessing with a delay.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    generation: Arc<watch::Sender<u64>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &SessionConfig) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            storage,
            key: config.key.clone(),
            generation: Arc::new(generation),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), &SessionConfig::default())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current session, or `None` when absent or unreadable. Never fails.
    pub fn read(&self) -> Option<SessionBlob> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read session storage");
                return None;
            }
        };

        match parse_blob(&raw) {
            Ok(blob) => blob,
            Err(err) => {
                warn!(key = %self.key, error = %err, "ignoring malformed session blob");
                None
            }
        }
    }

    pub fn write(&self, blob: &SessionBlob) -> AuthResult<()> {
        let raw = serde_json::to_string(blob)
            .map_err(|err| AuthError::MalformedSession(err.to_string()))?;
        self.storage.set(&self.key, &raw)?;
        self.bump();
        debug!(key = %self.key, "session written");
        Ok(())
    }

    pub fn clear(&self) -> AuthResult<()> {
        self.storage.remove(&self.key)?;
        self.bump();
        debug!(key = %self.key, "session cleared");
        Ok(())
    }

    /// Receiver that changes after every completed write or clear.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    fn bump(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }
}
