use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use common_auth::{AuthState, FileStorage, TokenStore};
use common_observability::ConsoleMetrics;
use fee_console::models::{SignInKind, Terminal};
use fee_console::scan::{run_scanner, Chime, LineSource, ScanFlow, ScanState};
use fee_console::{AppShell, ConsoleConfig, HttpBackend};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Rings the terminal bell on a recorded debit.
struct TerminalBell;

impl Chime for TerminalBell {
    fn play(&self) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ConsoleConfig::from_env()?;
    let storage = FileStorage::new(config.storage_dir.clone());
    let store = TokenStore::new(Arc::new(storage), &config.session_config());
    let backend = Arc::new(
        HttpBackend::new(config.api_base_url.clone(), config.http_timeout, store.clone())
            .context("failed to build backend client")?,
    );
    info!(api = %config.api_base_url, storage = %config.storage_dir.display(), "starting scan-kiosk");

    let mut shell = AppShell::new(store.clone(), backend.clone(), config.guard_settle);
    let mut guard = shell.mount_guard();
    if guard.settled().await == AuthState::Unauthenticated {
        let credentials = config
            .credentials()
            .context("no stored session; set FEES_LOGIN_EMAIL and FEES_LOGIN_PASSWORD")?;
        let kind = if config.teacher_login {
            SignInKind::Teacher
        } else {
            SignInKind::Staff
        };
        shell
            .sign_in(kind, &credentials)
            .await
            .context("sign in failed")?;
    }
    guard.unmount();

    let school_id = shell
        .school_id()
        .context("session carries no school_id in its token or user profile")?;
    info!(role = %shell.role(), school_id = %school_id, "session ready");

    let metrics = Arc::new(ConsoleMetrics::new().context("failed to register metrics")?);
    let flow = ScanFlow::new(backend, Arc::new(TerminalBell), metrics.clone(), config.feedback_clear);
    let terminals = flow
        .load_terminals(&school_id)
        .await
        .context("failed to load terminals")?;
    if terminals.is_empty() {
        anyhow::bail!("school {school_id} has no terminals configured");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let terminal = match &config.scan_terminal {
        Some(name) => name.clone(),
        None => prompt_terminal(&terminals, &mut lines).await?,
    };
    let selected = flow.select_terminal(&terminal)?;
    println!("Scanning for {} ({}). One code per line, Ctrl-D to finish.", selected.name, selected.price);

    let printer = tokio::spawn(print_states(flow.subscribe()));
    let mut source = LineSource::from_lines(lines);
    let summary = run_scanner(&flow, &mut source).await;
    flow.teardown();
    printer.abort();

    info!(
        charged = summary.charged,
        rejected = summary.rejected,
        ignored = summary.ignored,
        "scan session finished"
    );
    match metrics.render() {
        Ok(text) => debug!(metrics = %text, "scan metrics"),
        Err(err) => warn!(error = %err, "failed to render metrics"),
    }
    Ok(())
}

async fn prompt_terminal<R>(terminals: &[Terminal], lines: &mut Lines<BufReader<R>>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    println!("Select a terminal:");
    for (index, terminal) in terminals.iter().enumerate() {
        println!("  {}) {} ({})", index + 1, terminal.name, terminal.price);
    }

    loop {
        let line = lines
            .next_line()
            .await
            .context("failed to read terminal selection")?
            .context("input closed before a terminal was selected")?;
        let choice = line.trim();
        if let Some(terminal) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| terminals.get(index))
        {
            return Ok(terminal.name.clone());
        }
        if terminals.iter().any(|terminal| terminal.name == choice) {
            return Ok(choice.to_string());
        }
        println!("Unknown terminal '{choice}', try again:");
    }
}

async fn print_states(mut states: tokio::sync::watch::Receiver<ScanState>) {
    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        match state {
            ScanState::Success(receipt) => {
                println!("OK  {} charged {} at {}", receipt.name, receipt.amount, receipt.terminal)
            }
            ScanState::Error(message) => println!("ERR {message}"),
            ScanState::Scanning => println!("... ready"),
            ScanState::SelectTerminal => println!("... select a terminal"),
        }
    }
}
