//! Terminal scan flow: decoded student codes become debit transactions.

pub mod feedback;
pub mod flow;
pub mod payload;
pub mod source;

use thiserror::Error;

pub use feedback::{Chime, SilentChime, TransactionError};
pub use flow::{ScanFlow, ScanOutcome, ScanState};
pub use payload::{encode_student_code, parse_payload, ScanPayload};
pub use source::{run_scanner, CodeSource, LineSource, ScanSummary};

/// Shown for any code that cannot be turned into a payload.
pub const INVALID_CODE_MESSAGE: &str = "Invalid QR code format or missing student data";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("code matches no known student format")]
    UnrecognizedFormat,
    #[error("code is missing {0}")]
    MissingField(&'static str),
    #[error("no terminal selected")]
    NoTerminalSelected,
    #[error("unknown terminal '{0}'")]
    UnknownTerminal(String),
    #[error("transaction failed: {0}")]
    Transaction(#[from] TransactionError),
}

impl ScanError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::UnrecognizedFormat | ScanError::MissingField(_) => INVALID_CODE_MESSAGE,
            ScanError::NoTerminalSelected => "Select a terminal before scanning",
            ScanError::UnknownTerminal(_) => "Invalid terminal selected",
            ScanError::Transaction(err) => err.user_message(),
        }
    }
}
