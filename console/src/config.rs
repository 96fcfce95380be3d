use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use common_auth::session::DEFAULT_SESSION_KEY;
use common_auth::SessionConfig;

use crate::models::Credentials;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub storage_dir: PathBuf,
    pub session_key: String,
    pub guard_settle: Duration,
    pub feedback_clear: Duration,
    pub scan_terminal: Option<String>,
    pub login_email: Option<String>,
    pub login_password: Option<String>,
    pub teacher_login: bool,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("FEES_API_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            anyhow::bail!("FEES_API_BASE_URL must be an http(s) origin, got '{api_base_url}'");
        }

        let http_timeout_secs = parse_or(&lookup, "FEES_HTTP_TIMEOUT_SECS", 15u64)?;
        let storage_dir = lookup("FEES_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("fee-console"));
        let session_key = lookup("FEES_SESSION_KEY")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string());
        let guard_settle_ms = parse_or(&lookup, "FEES_GUARD_SETTLE_MS", 1000u64)?;
        let feedback_clear_ms = parse_or(&lookup, "FEES_FEEDBACK_CLEAR_MS", 3000u64)?;
        let scan_terminal = lookup("SCAN_TERMINAL").filter(|value| !value.trim().is_empty());
        let login_email = lookup("FEES_LOGIN_EMAIL").filter(|value| !value.trim().is_empty());
        let login_password = lookup("FEES_LOGIN_PASSWORD");
        let teacher_login = lookup("FEES_TEACHER_LOGIN")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Ok(Self {
            api_base_url,
            http_timeout: Duration::from_secs(http_timeout_secs.max(1)),
            storage_dir,
            session_key,
            guard_settle: Duration::from_millis(guard_settle_ms),
            feedback_clear: Duration::from_millis(feedback_clear_ms),
            scan_terminal,
            login_email,
            login_password,
            teacher_login,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.session_key.clone()).with_settle_delay(self.guard_settle)
    }

    /// Credentials for an unattended sign-in, when both halves are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.login_email, &self.login_password) {
            (Some(email), Some(password)) => Some(Credentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
