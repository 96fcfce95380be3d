use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::roles::Role;

/// Claims read from the session token payload without signature verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedClaims {
    pub role: Role,
    pub school_id: Option<String>,
    pub teacher_id: Option<String>,
    pub classlevel: Option<String>,
    /// Informational only; sessions are never expired client side.
    pub expires_at: Option<DateTime<Utc>>,
    pub raw: Value,
}

impl DecodedClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn school_id(&self) -> Option<&str> {
        self.school_id.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default, deserialize_with = "lenient_id")]
    role: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    school_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    teacher_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    classlevel: Option<String>,
    #[serde(default)]
    exp: Option<Value>,
}

/// Seconds since the epoch from an integer, float or numeric string. Anything
/// else is ignored; expiry never decides whether claims decode.
fn expiry(exp: &Value) -> Option<DateTime<Utc>> {
    let seconds = match exp {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|secs| secs.is_finite()).map(|secs| secs.trunc() as i64))?,
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|secs| secs.is_finite())?.trunc() as i64,
        _ => return None,
    };
    Utc.timestamp_opt(seconds, 0).single()
}

/// Identifiers arrive as strings or bare numbers depending on the backend
/// endpoint that minted them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(serde_json::Number),
}

/// Accepts a string or numeric id, normalising blanks to `None`.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<IdRepr>::deserialize(deserializer)?;
    Ok(value.and_then(|repr| {
        let text = match repr {
            IdRepr::Text(text) => text.trim().to_string(),
            IdRepr::Number(number) => number.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }))
}

impl TryFrom<ClaimsRepr> for DecodedClaims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let expires_at = value.exp.as_ref().and_then(expiry);

        Ok(Self {
            role: Role::from_claim(value.role.as_deref()),
            school_id: value.school_id,
            teacher_id: value.teacher_id,
            classlevel: value.classlevel,
            expires_at,
            raw: Value::Null,
        })
    }
}

impl TryFrom<Value> for DecodedClaims {
    type Error = AuthError;

    fn try_from(value: Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = DecodedClaims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
