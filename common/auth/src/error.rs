use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("stored session is malformed: {0}")]
    MalformedSession(String),
    #[error("session storage failure: {0}")]
    Storage(String),
    #[error("storage key '{0}' is not a plain file name")]
    InvalidKey(String),
    #[error("failed to decode token: {0}")]
    Decode(String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
}

impl From<std::io::Error> for AuthError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}
