use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use common_observability::ConsoleMetrics;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::feedback::{Chime, TransactionError};
use super::payload::parse_payload;
use super::ScanError;
use crate::api::Backend;
use crate::error::BackendResult;
use crate::models::{DebitRequest, Terminal, TransactionReceipt};

pub const DEFAULT_FEEDBACK_CLEAR: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    SelectTerminal,
    Scanning,
    Success(TransactionReceipt),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Charged(TransactionReceipt),
    Rejected(ScanError),
    /// Dropped because a debit was already in flight.
    Busy,
}

/// Scan session for one operator station.
///
/// Cheap to clone; clones share state. Success and error feedback fall back
/// to `Scanning` after the clear delay. Dropping the last handle cancels any
/// pending clear.
#[derive(Clone)]
pub struct ScanFlow {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn Backend>,
    chime: Arc<dyn Chime>,
    metrics: Arc<ConsoleMetrics>,
    clear_after: Duration,
    state: watch::Sender<ScanState>,
    terminals: Mutex<Vec<Terminal>>,
    selected: Mutex<Option<String>>,
    in_flight: AtomicBool,
    feedback_epoch: AtomicU64,
    clear_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let pending = self
            .clear_task
            .get_mut()
            .map(Option::take)
            .unwrap_or_else(|poisoned| poisoned.into_inner().take());
        if let Some(task) = pending {
            task.abort();
        }
    }
}

/// Holds the in-flight flag for the duration of one debit.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScanFlow {
    pub fn new(
        backend: Arc<dyn Backend>,
        chime: Arc<dyn Chime>,
        metrics: Arc<ConsoleMetrics>,
        clear_after: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::SelectTerminal);
        Self {
            inner: Arc::new(Inner {
                backend,
                chime,
                metrics,
                clear_after,
                state,
                terminals: Mutex::new(Vec::new()),
                selected: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                feedback_epoch: AtomicU64::new(0),
                clear_task: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> ScanState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.inner.state.subscribe()
    }

    pub fn terminals(&self) -> Vec<Terminal> {
        lock(&self.inner.terminals).clone()
    }

    /// Fetch the school's terminals and return to terminal selection.
    pub async fn load_terminals(&self, school_id: &str) -> BackendResult<Vec<Terminal>> {
        let terminals = match self.inner.backend.terminals(school_id).await {
            Ok(terminals) => terminals,
            Err(err) => {
                self.inner.metrics.backend_error("terminals", err.kind());
                warn!(school_id, error = %err, "failed to load terminals");
                return Err(err);
            }
        };
        info!(school_id, count = terminals.len(), "loaded terminals");

        *lock(&self.inner.terminals) = terminals.clone();
        *lock(&self.inner.selected) = None;
        self.cancel_feedback();
        self.inner.state.send_replace(ScanState::SelectTerminal);
        Ok(terminals)
    }

    pub fn select_terminal(&self, name: &str) -> Result<Terminal, ScanError> {
        let name = name.trim();
        let terminal = lock(&self.inner.terminals)
            .iter()
            .find(|terminal| terminal.name == name)
            .cloned()
            .ok_or_else(|| ScanError::UnknownTerminal(name.to_string()))?;

        *lock(&self.inner.selected) = Some(terminal.name.clone());
        self.cancel_feedback();
        self.inner.state.send_replace(ScanState::Scanning);
        info!(terminal = %terminal.name, price = %terminal.price, "terminal selected");
        Ok(terminal)
    }

    /// Selected terminal with its current price.
    pub fn selected_terminal(&self) -> Option<Terminal> {
        let selected = lock(&self.inner.selected).clone()?;
        lock(&self.inner.terminals)
            .iter()
            .find(|terminal| terminal.name == selected)
            .cloned()
    }

    /// Handle one decoded code. Never fails; the outcome is also published
    /// as feedback state.
    pub async fn handle_code(&self, text: &str) -> ScanOutcome {
        let Some(_flight) = InFlight::acquire(&self.inner.in_flight) else {
            debug!("debit in flight, ignoring decoded code");
            self.inner.metrics.scan("busy");
            return ScanOutcome::Busy;
        };

        let Some(terminal) = self.selected_terminal() else {
            self.inner.metrics.scan("no_terminal");
            return ScanOutcome::Rejected(ScanError::NoTerminalSelected);
        };

        let payload = match parse_payload(text) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "rejected scanned code");
                self.inner.metrics.scan("invalid_code");
                self.show_feedback(ScanState::Error(err.user_message().to_string()));
                return ScanOutcome::Rejected(err);
            }
        };

        let request = DebitRequest {
            student_id: payload.student_id,
            student_name: payload.student_name,
            class: payload.class_name,
            terminal: terminal.name,
            amount: terminal.price,
        };
        info!(
            student_id = %request.student_id,
            terminal = %request.terminal,
            amount = %request.amount,
            "submitting debit"
        );

        let timer = self.inner.metrics.debit_latency_seconds.start_timer();
        let result = self.inner.backend.debit(&request).await;
        timer.observe_duration();

        match result {
            Ok(receipt) => {
                self.inner.chime.play();
                self.inner.metrics.scan("charged");
                info!(name = %receipt.name, amount = %receipt.amount, terminal = %receipt.terminal, "debit recorded");
                self.show_feedback(ScanState::Success(receipt.clone()));
                ScanOutcome::Charged(receipt)
            }
            Err(err) => {
                let failure = TransactionError::from_backend(&err);
                self.inner.metrics.backend_error("debit", err.kind());
                self.inner.metrics.scan(failure.label());
                warn!(error = %err, reason = failure.label(), "debit failed");
                self.show_feedback(ScanState::Error(failure.user_message().to_string()));
                ScanOutcome::Rejected(ScanError::Transaction(failure))
            }
        }
    }

    /// Stop pending feedback timers; the flow stays usable.
    pub fn teardown(&self) {
        self.cancel_feedback();
        debug!("scan flow torn down");
    }

    fn cancel_feedback(&self) {
        self.inner.feedback_epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = lock(&self.inner.clear_task).take() {
            task.abort();
        }
    }

    fn show_feedback(&self, state: ScanState) {
        let epoch = self.inner.feedback_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_replace(state);

        let weak = Arc::downgrade(&self.inner);
        let clear_after = self.inner.clear_after;
        let task = tokio::spawn(async move {
            sleep(clear_after).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.feedback_epoch.load(Ordering::SeqCst) != epoch {
                return;
            }
            inner.state.send_if_modified(|state| {
                if matches!(state, ScanState::Success(_) | ScanState::Error(_)) {
                    *state = ScanState::Scanning;
                    true
                } else {
                    false
                }
            });
            debug!("scan feedback cleared");
        });

        if let Some(previous) = lock(&self.inner.clear_task).replace(task) {
            previous.abort();
        }
    }
}
