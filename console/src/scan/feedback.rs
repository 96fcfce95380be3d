use thiserror::Error;

use crate::error::BackendError;

/// Why a debit did not go through, in the terms the operator sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("duplicate transaction within 24 hours")]
    Duplicate,
    #[error("insufficient balance")]
    LowBalance,
    #[error("invalid terminal")]
    InvalidTerminal,
    #[error("balance lookup failed")]
    BalanceLookup,
    #[error("network failure")]
    Network,
    #[error("unrecognized backend error: {0}")]
    Unrecognized(String),
}

impl TransactionError {
    pub fn from_backend(err: &BackendError) -> Self {
        match err {
            BackendError::Network(_) => TransactionError::Network,
            BackendError::Rejected { message, .. } => Self::classify(message),
            other => TransactionError::Unrecognized(other.to_string()),
        }
    }

    /// Map a backend error string onto the known codes.
    pub fn classify(code: &str) -> Self {
        let normalized = code.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "duplicate transaction" | "transaction already made within 24 hours" => {
                TransactionError::Duplicate
            }
            "low balance" | "insufficient balance" => TransactionError::LowBalance,
            "invalid terminal" | "terminal not found" => TransactionError::InvalidTerminal,
            "error fetching balance" | "balance lookup failed" => TransactionError::BalanceLookup,
            _ if normalized.contains("24 hours") || normalized.contains("duplicate") => {
                TransactionError::Duplicate
            }
            _ => TransactionError::Unrecognized(code.trim().to_string()),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            TransactionError::Duplicate => {
                "Transaction already recorded for this student in the last 24 hours"
            }
            TransactionError::LowBalance => "Insufficient balance for this transaction",
            TransactionError::InvalidTerminal => "Invalid terminal selected",
            TransactionError::BalanceLookup => "Unable to fetch the student's balance",
            TransactionError::Network => {
                "Network error. Please check your connection and try again."
            }
            TransactionError::Unrecognized(_) => "Transaction failed. Please try again.",
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionError::Duplicate => "duplicate",
            TransactionError::LowBalance => "low_balance",
            TransactionError::InvalidTerminal => "invalid_terminal",
            TransactionError::BalanceLookup => "balance_lookup",
            TransactionError::Network => "network",
            TransactionError::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Audible confirmation played after a successful debit.
pub trait Chime: Send + Sync {
    fn play(&self);
}

pub struct SilentChime;

impl Chime for SilentChime {
    fn play(&self) {}
}
