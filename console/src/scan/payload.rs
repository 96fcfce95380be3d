//! Student code formats printed on ID cards.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ScanError;

pub const STUDENT_CODE_PREFIX: &str = "STUDENT:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPayload {
    pub student_id: String,
    pub student_name: String,
    pub class_name: String,
}

/// Fields pulled out of a code before emptiness is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFields<'a> {
    pub student_id: &'a str,
    pub student_name: &'a str,
    pub class_name: &'a str,
}

impl<'a> RawFields<'a> {
    fn into_payload(self) -> Result<ScanPayload, ScanError> {
        let student_id = self.student_id.trim();
        let student_name = self.student_name.trim();
        let class_name = self.class_name.trim();
        if student_id.is_empty() {
            return Err(ScanError::MissingField("student_id"));
        }
        if student_name.is_empty() {
            return Err(ScanError::MissingField("student_name"));
        }
        if class_name.is_empty() {
            return Err(ScanError::MissingField("class_name"));
        }
        Ok(ScanPayload {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            class_name: class_name.to_string(),
        })
    }
}

pub trait PayloadFormat: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract<'a>(&self, text: &'a str) -> Option<RawFields<'a>>;
}

/// `STUDENT:<id>|<name>|<class>[|<gender>]`. Anything after the class is
/// ignored by the scanner.
pub struct CompactFormat;

impl PayloadFormat for CompactFormat {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn extract<'a>(&self, text: &'a str) -> Option<RawFields<'a>> {
        let body = text.trim().strip_prefix(STUDENT_CODE_PREFIX)?;
        let mut parts = body.split('|');
        Some(RawFields {
            student_id: parts.next()?,
            student_name: parts.next()?,
            class_name: parts.next()?,
        })
    }
}

static LEGACY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ID:\s*(.*?),\s*Name:\s*(.*?),\s*Class:\s*(.*)").expect("legacy code pattern")
});

/// `ID: <id>, Name: <name>, Class: <class>` from the first generation of cards.
pub struct LegacyFormat;

impl PayloadFormat for LegacyFormat {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn extract<'a>(&self, text: &'a str) -> Option<RawFields<'a>> {
        let captures = LEGACY_PATTERN.captures(text)?;
        Some(RawFields {
            student_id: captures.get(1)?.as_str(),
            student_name: captures.get(2)?.as_str(),
            class_name: captures.get(3)?.as_str(),
        })
    }
}

/// Tried in order; the first format that recognises the text decides.
pub static FORMATS: &[&dyn PayloadFormat] = &[&CompactFormat, &LegacyFormat];

pub fn parse_payload(text: &str) -> Result<ScanPayload, ScanError> {
    FORMATS
        .iter()
        .find_map(|format| format.extract(text))
        .ok_or(ScanError::UnrecognizedFormat)?
        .into_payload()
}

/// Text encoded into the QR code on a generated ID card.
pub fn encode_student_code(
    student_id: &str,
    student_name: &str,
    class_name: &str,
    gender: Option<&str>,
) -> String {
    let mut code = format!("{STUDENT_CODE_PREFIX}{student_id}|{student_name}|{class_name}");
    if let Some(gender) = gender {
        code.push('|');
        code.push_str(gender);
    }
    code
}
