//! Wire types exchanged with the fees backend.

use chrono::{DateTime, NaiveDate, Utc};
use common_auth::claims::lenient_id;
use common_money::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Which sign-in page the credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInKind {
    Staff,
    Teacher,
}

impl SignInKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            SignInKind::Staff => "/login",
            SignInKind::Teacher => "/teacher-login",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StudentRepr")]
pub struct Student {
    pub student_id: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub gender: Option<String>,
    pub balance: Option<Amount>,
    pub status: Option<String>,
}

/// Student rows name the class `class`, `class_name` or `classlevel`
/// depending on the endpoint, sometimes several at once.
#[derive(Deserialize)]
struct StudentRepr {
    #[serde(default, deserialize_with = "lenient_id")]
    student_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    student_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    class: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    class_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    classlevel: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    balance: Option<Amount>,
    #[serde(default)]
    status: Option<String>,
}

impl TryFrom<StudentRepr> for Student {
    type Error = String;

    fn try_from(repr: StudentRepr) -> Result<Self, Self::Error> {
        Ok(Self {
            student_id: repr
                .student_id
                .or(repr.id)
                .ok_or("student row has no student_id")?,
            name: repr
                .name
                .or(repr.student_name)
                .ok_or("student row has no name")?,
            class_name: repr
                .class
                .or(repr.class_name)
                .or(repr.classlevel)
                .ok_or("student row has no class")?,
            gender: repr.gender,
            balance: repr.balance,
            status: repr.status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub gender: String,
    pub school_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_contact: Option<String>,
}

/// Fee category a scan is charged against, e.g. "Bus" or "Canteen".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TerminalRepr")]
pub struct Terminal {
    pub name: String,
    pub price: Amount,
}

/// Older endpoints key terminals by `terminal` or `id` instead of `name`;
/// `name` wins when several are present.
#[derive(Deserialize)]
struct TerminalRepr {
    #[serde(default, deserialize_with = "lenient_id")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    terminal: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    price: Amount,
}

impl TryFrom<TerminalRepr> for Terminal {
    type Error = String;

    fn try_from(repr: TerminalRepr) -> Result<Self, Self::Error> {
        let name = repr
            .name
            .or(repr.terminal)
            .or(repr.id)
            .ok_or("terminal row has no name")?;
        Ok(Self {
            name,
            price: repr.price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTerminal {
    pub name: String,
    pub price: Amount,
    pub school_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffUser {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub classlevel: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classlevel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub school_id: String,
}

/// Terminals a student is allowed to be charged at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(deserialize_with = "required_id")]
    pub student_id: String,
    #[serde(default)]
    pub student_name: Option<String>,
    pub terminal: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPermission {
    pub student_id: String,
    pub terminal: String,
    pub school_id: String,
}

/// Outstanding debt recorded when a student was served on credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CreditReportRepr")]
pub struct CreditReport {
    pub id: Option<String>,
    pub student_id: String,
    pub student_name: Option<String>,
    pub terminal: String,
    pub amount: Amount,
    pub status: Option<String>,
    pub date: Option<String>,
}

#[derive(Deserialize)]
struct CreditReportRepr {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(deserialize_with = "required_id")]
    student_id: String,
    #[serde(default)]
    student_name: Option<String>,
    terminal: String,
    amount: Amount,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<CreditReportRepr> for CreditReport {
    fn from(repr: CreditReportRepr) -> Self {
        Self {
            id: repr.id,
            student_id: repr.student_id,
            student_name: repr.student_name,
            terminal: repr.terminal,
            amount: repr.amount,
            status: repr.status,
            date: repr.date.or(repr.created_at),
        }
    }
}

/// Ledger line: a top-up or a charge against a terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct Entry {
    pub student_id: String,
    pub student_name: Option<String>,
    pub terminal: String,
    pub amount: Amount,
    pub date: Option<String>,
}

#[derive(Deserialize)]
struct EntryRepr {
    #[serde(deserialize_with = "required_id")]
    student_id: String,
    #[serde(default)]
    student_name: Option<String>,
    terminal: String,
    amount: Amount,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<EntryRepr> for Entry {
    fn from(repr: EntryRepr) -> Self {
        Self {
            student_id: repr.student_id,
            student_name: repr.student_name,
            terminal: repr.terminal,
            amount: repr.amount,
            date: repr.date.or(repr.created_at),
        }
    }
}

impl Entry {
    /// Calendar day of the entry, accepting RFC 3339 stamps or bare dates.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(self.date.as_deref()?)
    }
}

pub(crate) fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntry {
    pub student_id: String,
    pub amount: Amount,
    pub terminal: String,
    pub school_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebitRequest {
    pub student_id: String,
    pub student_name: String,
    pub class: String,
    pub terminal: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebitResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<TransactionReceipt>,
}

/// Echo of a completed debit shown back to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub name: String,
    pub amount: Amount,
    pub terminal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub student_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditStatusUpdate {
    pub credit_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditPayment {
    pub student_id: String,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient_id(deserializer)?.ok_or_else(|| serde::de::Error::custom("empty identifier"))
}
