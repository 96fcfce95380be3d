use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_ACCOUNTANT: &str = "accountant";

/// Display role carried in the session token.
///
/// Advisory only: the token is never verified client side, so the backend
/// remains the authorization boundary. Anything the console does not
/// recognise (including a missing claim) collapses to `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Accountant,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn from_claim(value: Option<&str>) -> Self {
        match value {
            Some(raw) => raw.parse().unwrap_or_default(),
            None => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Teacher => ROLE_TEACHER,
            Role::Accountant => ROLE_ACCOUNTANT,
            Role::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown)
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let role = match s.trim().to_ascii_lowercase().as_str() {
            ROLE_ADMIN => Role::Admin,
            ROLE_TEACHER => Role::Teacher,
            ROLE_ACCOUNTANT => Role::Accountant,
            _ => Role::Unknown,
        };
        Ok(role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
