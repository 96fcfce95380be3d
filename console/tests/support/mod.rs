#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common_auth::{SessionBlob, UserProfile};
use common_money::Amount;
use fee_console::error::{BackendError, BackendResult};
use fee_console::models::{
    Acknowledgement, CreditPayment, CreditReport, CreditStatusUpdate, Credentials, DebitRequest,
    Entry, NewEntry, NewPermission, NewStudent, NewTerminal, NewUser, Permission, SignInKind,
    StaffUser, StatusUpdate, Student, Terminal, TransactionReceipt,
};
use fee_console::scan::Chime;
use fee_console::Backend;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

/// HS256 token with the given payload. The console never checks the
/// signature, so the key is arbitrary.
pub fn mint_token(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).expect("encode token")
}

pub fn token_for(role: &str, school_id: &str) -> String {
    mint_token(json!({ "role": role, "school_id": school_id, "exp": 4_102_444_800i64 }))
}

pub fn session_for(role: &str, school_id: &str) -> SessionBlob {
    SessionBlob::new(token_for(role, school_id)).with_user(UserProfile {
        name: Some(format!("{role} user")),
        role: Some(role.to_string()),
        school_id: Some(school_id.to_string()),
        ..UserProfile::default()
    })
}

pub fn terminal(name: &str, cents: i64) -> Terminal {
    Terminal {
        name: name.to_string(),
        price: Amount::from_minor(cents),
    }
}

/// Scripted reply for one debit call.
#[derive(Debug, Clone)]
pub enum DebitReply {
    Approve,
    Reject(&'static str),
    Offline,
}

/// In-process backend double.
pub struct StubBackend {
    pub logins: Mutex<VecDeque<SessionBlob>>,
    pub terminals: Mutex<Vec<Terminal>>,
    pub replies: Mutex<VecDeque<DebitReply>>,
    pub debits: Mutex<Vec<DebitRequest>>,
    pub debit_delay: Duration,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            logins: Mutex::new(VecDeque::new()),
            terminals: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            debits: Mutex::new(Vec::new()),
            debit_delay: Duration::ZERO,
        }
    }

    pub fn with_login(self, blob: SessionBlob) -> Self {
        self.logins.lock().unwrap().push_back(blob);
        self
    }

    pub fn with_terminals(self, terminals: Vec<Terminal>) -> Self {
        *self.terminals.lock().unwrap() = terminals;
        self
    }

    pub fn with_replies(self, replies: impl IntoIterator<Item = DebitReply>) -> Self {
        self.replies.lock().unwrap().extend(replies);
        self
    }

    pub fn with_debit_delay(mut self, delay: Duration) -> Self {
        self.debit_delay = delay;
        self
    }

    pub fn debit_count(&self) -> usize {
        self.debits.lock().unwrap().len()
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn login(&self, _kind: SignInKind, _credentials: &Credentials) -> BackendResult<SessionBlob> {
        self.logins.lock().unwrap().pop_front().ok_or(BackendError::Rejected {
            status: 401,
            message: "Invalid credentials".into(),
        })
    }

    async fn students(&self, _school_id: &str, _classlevel: Option<&str>) -> BackendResult<Vec<Student>> {
        Ok(Vec::new())
    }

    async fn terminals(&self, _school_id: &str) -> BackendResult<Vec<Terminal>> {
        Ok(self.terminals.lock().unwrap().clone())
    }

    async fn users(&self, _school_id: &str) -> BackendResult<Vec<StaffUser>> {
        Ok(Vec::new())
    }

    async fn permissions(&self, _school_id: &str) -> BackendResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    async fn credit_reports(&self, _school_id: &str) -> BackendResult<Vec<CreditReport>> {
        Ok(Vec::new())
    }

    async fn entries(&self, _school_id: &str) -> BackendResult<Vec<Entry>> {
        Ok(Vec::new())
    }

    async fn add_student(&self, _student: &NewStudent) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }

    async fn add_terminal(&self, _terminal: &NewTerminal) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }

    async fn add_user(&self, _user: &NewUser) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }

    async fn add_permission(&self, _permission: &NewPermission) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }

    async fn add_entry(&self, _entry: &NewEntry) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }

    async fn debit(&self, request: &DebitRequest) -> BackendResult<TransactionReceipt> {
        self.debits.lock().unwrap().push(request.clone());
        if !self.debit_delay.is_zero() {
            tokio::time::sleep(self.debit_delay).await;
        }
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(DebitReply::Approve);
        match reply {
            DebitReply::Approve => Ok(TransactionReceipt {
                name: request.student_name.clone(),
                amount: request.amount.clone(),
                terminal: request.terminal.clone(),
            }),
            DebitReply::Reject(message) => Err(BackendError::Rejected {
                status: 400,
                message: message.to_string(),
            }),
            DebitReply::Offline => Err(BackendError::Network("connection refused".into())),
        }
    }

    async fn update_status(&self, _update: &StatusUpdate) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }

    async fn update_credit_status(&self, _update: &CreditStatusUpdate) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }

    async fn pay_credit(&self, _payment: &CreditPayment) -> BackendResult<Acknowledgement> {
        Ok(Acknowledgement::default())
    }
}

#[derive(Default)]
pub struct CountingChime {
    pub plays: AtomicUsize,
}

impl CountingChime {
    pub fn count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl Chime for CountingChime {
    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}

