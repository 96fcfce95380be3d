use common_auth::AuthError;
use serde::Deserialize;
use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("failed to decode backend response: {0}")]
    Decode(String),
    #[error("no session available; sign in first")]
    MissingSession,
    #[error(transparent)]
    Session(#[from] AuthError),
}

impl BackendError {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Network(_) => "network",
            BackendError::Rejected { .. } => "rejected",
            BackendError::Decode(_) => "decode",
            BackendError::MissingSession => "missing_session",
            BackendError::Session(_) => "session",
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}

/// Error bodies come back as `{error}` from most endpoints and `{message}`
/// from a few older ones.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub(crate) fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.message))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}
