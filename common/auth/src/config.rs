use std::time::Duration;

use crate::session::DEFAULT_SESSION_KEY;

/// Runtime configuration for the persisted session and its guard.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Storage key holding the serialized session blob.
    pub key: String,
    /// Delay before a freshly mounted guard reads the store.
    pub settle_delay: Duration,
}

impl SessionConfig {
    /// Construct config with the default one second settle delay.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            settle_delay: Duration::from_millis(1000),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_KEY)
    }
}
