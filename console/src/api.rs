use std::time::Duration;

use async_trait::async_trait;
use common_auth::{SessionBlob, TokenStore};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::error::{rejection_message, BackendError, BackendResult};
use crate::models::{
    Acknowledgement, CreditPayment, CreditReport, CreditStatusUpdate, Credentials, DebitRequest,
    DebitResponse, Entry, NewEntry, NewPermission, NewStudent, NewTerminal, NewUser, Permission,
    SignInKind, StaffUser, StatusUpdate, Student, Terminal, TransactionReceipt,
};

/// Remote REST backend. It is the only real authorization boundary: the
/// console's role checks are cosmetic.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, kind: SignInKind, credentials: &Credentials) -> BackendResult<SessionBlob>;

    async fn students(&self, school_id: &str, classlevel: Option<&str>) -> BackendResult<Vec<Student>>;
    async fn terminals(&self, school_id: &str) -> BackendResult<Vec<Terminal>>;
    async fn users(&self, school_id: &str) -> BackendResult<Vec<StaffUser>>;
    async fn permissions(&self, school_id: &str) -> BackendResult<Vec<Permission>>;
    async fn credit_reports(&self, school_id: &str) -> BackendResult<Vec<CreditReport>>;
    async fn entries(&self, school_id: &str) -> BackendResult<Vec<Entry>>;

    async fn add_student(&self, student: &NewStudent) -> BackendResult<Acknowledgement>;
    async fn add_terminal(&self, terminal: &NewTerminal) -> BackendResult<Acknowledgement>;
    async fn add_user(&self, user: &NewUser) -> BackendResult<Acknowledgement>;
    async fn add_permission(&self, permission: &NewPermission) -> BackendResult<Acknowledgement>;
    async fn add_entry(&self, entry: &NewEntry) -> BackendResult<Acknowledgement>;

    async fn debit(&self, request: &DebitRequest) -> BackendResult<TransactionReceipt>;
    async fn update_status(&self, update: &StatusUpdate) -> BackendResult<Acknowledgement>;
    async fn update_credit_status(&self, update: &CreditStatusUpdate) -> BackendResult<Acknowledgement>;
    async fn pay_credit(&self, payment: &CreditPayment) -> BackendResult<Acknowledgement>;
}

/// reqwest-backed client against a single backend origin. The bearer token
/// is read from the session store on every call so a fresh login is picked
/// up without rebuilding the client.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    store: TokenStore,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration, store: TokenStore) -> BackendResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, store))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, store: TokenStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> BackendResult<RequestBuilder> {
        let session = self.store.read().ok_or(BackendError::MissingSession)?;
        Ok(request.bearer_auth(session.token))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> BackendResult<Vec<T>> {
        let request = self.authorized(self.client.get(self.url(path)))?;
        let response = request.send().await?;
        read_json(path, response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> BackendResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(self.client.post(self.url(path)).json(body))?;
        let response = request.send().await?;
        read_json(path, response).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> BackendResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = rejection_message(&body);
    warn!(path, status = status.as_u16(), %message, "backend rejected request");
    Err(BackendError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// `/{resource}/{school_id}[/{rest}]` with every segment percent-encoded.
fn scoped_path(resource: &str, school_id: &str, rest: Option<&str>) -> String {
    match rest {
        Some(rest) => format!("/{resource}/{}/{}", encode(school_id), encode(rest)),
        None => format!("/{resource}/{}", encode(school_id)),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, kind: SignInKind, credentials: &Credentials) -> BackendResult<SessionBlob> {
        let path = kind.endpoint();
        let response = self
            .client
            .post(self.url(path))
            .json(credentials)
            .send()
            .await?;
        let blob: SessionBlob = read_json(path, response).await?;
        debug!(?kind, "login accepted");
        Ok(blob)
    }

    async fn students(&self, school_id: &str, classlevel: Option<&str>) -> BackendResult<Vec<Student>> {
        self.get_list(&scoped_path("students", school_id, classlevel)).await
    }

    async fn terminals(&self, school_id: &str) -> BackendResult<Vec<Terminal>> {
        self.get_list(&scoped_path("terminals", school_id, None)).await
    }

    async fn users(&self, school_id: &str) -> BackendResult<Vec<StaffUser>> {
        self.get_list(&scoped_path("users", school_id, None)).await
    }

    async fn permissions(&self, school_id: &str) -> BackendResult<Vec<Permission>> {
        self.get_list(&scoped_path("permissions", school_id, None)).await
    }

    async fn credit_reports(&self, school_id: &str) -> BackendResult<Vec<CreditReport>> {
        self.get_list(&scoped_path("credit-reports", school_id, None)).await
    }

    async fn entries(&self, school_id: &str) -> BackendResult<Vec<Entry>> {
        self.get_list(&scoped_path("entries", school_id, None)).await
    }

    async fn add_student(&self, student: &NewStudent) -> BackendResult<Acknowledgement> {
        self.post("/add-student", student).await
    }

    async fn add_terminal(&self, terminal: &NewTerminal) -> BackendResult<Acknowledgement> {
        self.post("/add-terminal", terminal).await
    }

    async fn add_user(&self, user: &NewUser) -> BackendResult<Acknowledgement> {
        self.post("/add-user", user).await
    }

    async fn add_permission(&self, permission: &NewPermission) -> BackendResult<Acknowledgement> {
        self.post("/add-permission", permission).await
    }

    async fn add_entry(&self, entry: &NewEntry) -> BackendResult<Acknowledgement> {
        self.post("/add-entry", entry).await
    }

    async fn debit(&self, request: &DebitRequest) -> BackendResult<TransactionReceipt> {
        let response: DebitResponse = self.post("/debit", request).await?;

        // Some deployments answer 200 with `{success: false, error}`.
        if let Some(error) = response.error.filter(|error| !error.trim().is_empty()) {
            return Err(BackendError::Rejected {
                status: 200,
                message: error.trim().to_string(),
            });
        }
        if response.success == Some(false) {
            return Err(BackendError::Rejected {
                status: 200,
                message: response.message.unwrap_or_default(),
            });
        }

        Ok(response.details.unwrap_or_else(|| TransactionReceipt {
            name: request.student_name.clone(),
            amount: request.amount.clone(),
            terminal: request.terminal.clone(),
        }))
    }

    async fn update_status(&self, update: &StatusUpdate) -> BackendResult<Acknowledgement> {
        self.post("/update-status", update).await
    }

    async fn update_credit_status(&self, update: &CreditStatusUpdate) -> BackendResult<Acknowledgement> {
        self.post("/update-credit-status", update).await
    }

    async fn pay_credit(&self, payment: &CreditPayment) -> BackendResult<Acknowledgement> {
        self.post("/pay-credit", payment).await
    }
}
