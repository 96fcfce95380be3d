use std::sync::Arc;
use std::time::Duration;

use common_money::Amount;
use common_observability::ConsoleMetrics;
use fee_console::scan::{
    run_scanner, LineSource, ScanError, ScanFlow, ScanOutcome, ScanState, TransactionError,
    INVALID_CODE_MESSAGE,
};

mod support;
use support::{terminal, CountingChime, DebitReply, StubBackend};

const CLEAR: Duration = Duration::from_millis(3000);
const CODE: &str = "STUDENT:K-001-002|Jeffery Bukuroh|Class 1";

struct Harness {
    flow: ScanFlow,
    backend: Arc<StubBackend>,
    chime: Arc<CountingChime>,
    metrics: Arc<ConsoleMetrics>,
}

async fn ready_flow(backend: StubBackend) -> Harness {
    let backend = Arc::new(backend.with_terminals(vec![terminal("Canteen", 500), terminal("Bus", 1250)]));
    let chime = Arc::new(CountingChime::default());
    let metrics = Arc::new(ConsoleMetrics::new().expect("metrics"));
    let flow = ScanFlow::new(backend.clone(), chime.clone(), metrics.clone(), CLEAR);

    flow.load_terminals("SCH-1").await.expect("terminals");
    assert_eq!(flow.state(), ScanState::SelectTerminal);
    flow.select_terminal("Canteen").expect("select");
    assert_eq!(flow.state(), ScanState::Scanning);

    Harness {
        flow,
        backend,
        chime,
        metrics,
    }
}

#[tokio::test(start_paused = true)]
async fn low_balance_shows_message_then_returns_to_scanning() {
    let h = ready_flow(StubBackend::new().with_replies([DebitReply::Reject("Low balance")])).await;

    let outcome = h.flow.handle_code(CODE).await;
    assert_eq!(
        outcome,
        ScanOutcome::Rejected(ScanError::Transaction(TransactionError::LowBalance))
    );
    assert_eq!(
        h.flow.state(),
        ScanState::Error("Insufficient balance for this transaction".into())
    );
    assert_eq!(h.chime.count(), 0);

    tokio::time::sleep(Duration::from_millis(2999)).await;
    assert!(matches!(h.flow.state(), ScanState::Error(_)));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(h.flow.state(), ScanState::Scanning);
}

#[tokio::test(start_paused = true)]
async fn successful_debit_chimes_and_echoes_receipt() {
    let h = ready_flow(StubBackend::new()).await;

    let outcome = h.flow.handle_code(CODE).await;
    let ScanOutcome::Charged(receipt) = outcome else {
        panic!("expected a charge, got {outcome:?}");
    };
    assert_eq!(receipt.name, "Jeffery Bukuroh");
    assert_eq!(receipt.amount, Amount::from_minor(500));
    assert_eq!(h.flow.state(), ScanState::Success(receipt));
    assert_eq!(h.chime.count(), 1);

    let sent = h.backend.debits.lock().unwrap()[0].clone();
    assert_eq!(sent.student_id, "K-001-002");
    assert_eq!(sent.class, "Class 1");
    assert_eq!(sent.terminal, "Canteen");

    tokio::time::sleep(CLEAR + Duration::from_millis(1)).await;
    assert_eq!(h.flow.state(), ScanState::Scanning);
    assert!(h.metrics.render().expect("render").contains("outcome=\"charged\""));
}

#[tokio::test(start_paused = true)]
async fn invalid_code_never_reaches_backend() {
    let h = ready_flow(StubBackend::new()).await;

    for text in ["hello world", "STUDENT:K-1||Class 1", "ID: , Name: A, Class: B"] {
        let outcome = h.flow.handle_code(text).await;
        assert!(matches!(outcome, ScanOutcome::Rejected(ref err) if err.user_message() == INVALID_CODE_MESSAGE));
        assert_eq!(h.flow.state(), ScanState::Error(INVALID_CODE_MESSAGE.into()));
    }
    assert_eq!(h.backend.debit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn backend_failures_map_to_operator_messages() {
    let h = ready_flow(StubBackend::new().with_replies([
        DebitReply::Reject("Duplicate transaction"),
        DebitReply::Reject("Invalid terminal"),
        DebitReply::Reject("Error fetching balance"),
        DebitReply::Reject("Something else broke"),
        DebitReply::Offline,
    ]))
    .await;

    let expected = [
        "Transaction already recorded for this student in the last 24 hours",
        "Invalid terminal selected",
        "Unable to fetch the student's balance",
        "Transaction failed. Please try again.",
        "Network error. Please check your connection and try again.",
    ];
    for message in expected {
        h.flow.handle_code(CODE).await;
        assert_eq!(h.flow.state(), ScanState::Error(message.into()));
    }
}

#[tokio::test(start_paused = true)]
async fn second_code_is_ignored_while_debit_in_flight() {
    let h = ready_flow(StubBackend::new().with_debit_delay(Duration::from_millis(500))).await;

    let first = tokio::spawn({
        let flow = h.flow.clone();
        async move { flow.handle_code(CODE).await }
    });
    tokio::task::yield_now().await;

    assert_eq!(h.flow.handle_code(CODE).await, ScanOutcome::Busy);
    assert!(matches!(first.await.expect("join"), ScanOutcome::Charged(_)));
    assert_eq!(h.backend.debit_count(), 1);

    // The lock is released once the debit completes.
    assert!(matches!(h.flow.handle_code(CODE).await, ScanOutcome::Charged(_)));
}

#[tokio::test(start_paused = true)]
async fn scanning_requires_a_selected_terminal() {
    let backend = Arc::new(StubBackend::new().with_terminals(vec![terminal("Canteen", 500)]));
    let flow = ScanFlow::new(
        backend.clone(),
        Arc::new(CountingChime::default()),
        Arc::new(ConsoleMetrics::new().expect("metrics")),
        CLEAR,
    );
    flow.load_terminals("SCH-1").await.expect("terminals");

    assert_eq!(
        flow.handle_code(CODE).await,
        ScanOutcome::Rejected(ScanError::NoTerminalSelected)
    );
    assert_eq!(
        flow.select_terminal("Library"),
        Err(ScanError::UnknownTerminal("Library".into()))
    );
    assert_eq!(backend.debit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn newer_feedback_is_not_cleared_by_older_timer() {
    let h = ready_flow(StubBackend::new().with_replies([DebitReply::Approve, DebitReply::Reject("Low balance")])).await;

    h.flow.handle_code(CODE).await;
    tokio::time::sleep(Duration::from_millis(2000)).await;
    h.flow.handle_code(CODE).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(matches!(h.flow.state(), ScanState::Error(_)));
    tokio::time::sleep(Duration::from_millis(1501)).await;
    assert_eq!(h.flow.state(), ScanState::Scanning);
}

#[tokio::test(start_paused = true)]
async fn dropping_flow_cancels_pending_clear() {
    let h = ready_flow(StubBackend::new()).await;
    let mut states = h.flow.subscribe();
    h.flow.handle_code(CODE).await;
    states.borrow_and_update();

    drop(h);
    tokio::time::sleep(CLEAR * 2).await;
    assert!(states.has_changed().is_err());
    assert!(matches!(*states.borrow(), ScanState::Success(_)));
}

#[tokio::test(start_paused = true)]
async fn scanner_drains_source_and_counts_outcomes() {
    let h = ready_flow(StubBackend::new().with_debit_delay(Duration::from_millis(200))).await;
    let input = format!("{CODE}\n{CODE}\n\nnot a code\n");
    let mut source = LineSource::new(std::io::Cursor::new(input.into_bytes()));

    let summary = run_scanner(&h.flow, &mut source).await;
    assert!(source.is_stopped());
    assert_eq!(summary.charged + summary.rejected + summary.ignored, 3);
    assert_eq!(summary.charged, 1);
    assert_eq!(h.backend.debit_count(), 1);
}
