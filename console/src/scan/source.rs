use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use super::flow::{ScanFlow, ScanOutcome};

/// Producer of decoded code text: a camera decoder, or a hand-held reader
/// that types one code per line.
#[async_trait]
pub trait CodeSource: Send {
    /// Next decoded code, `None` once the source is exhausted or stopped.
    async fn next_code(&mut self) -> Option<String>;

    /// Release the underlying device. Idempotent.
    fn stop(&mut self);
}

pub struct LineSource<R> {
    lines: Option<Lines<BufReader<R>>>,
}

impl<R: AsyncRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self::from_lines(BufReader::new(reader).lines())
    }

    pub fn from_lines(lines: Lines<BufReader<R>>) -> Self {
        Self { lines: Some(lines) }
    }

    pub fn is_stopped(&self) -> bool {
        self.lines.is_none()
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> CodeSource for LineSource<R> {
    async fn next_code(&mut self) -> Option<String> {
        loop {
            let lines = self.lines.as_mut()?;
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let code = line.trim();
                    if !code.is_empty() {
                        return Some(code.to_string());
                    }
                }
                Ok(None) => {
                    self.stop();
                    return None;
                }
                Err(err) => {
                    warn!(error = %err, "code source failed");
                    self.stop();
                    return None;
                }
            }
        }
    }

    fn stop(&mut self) {
        if self.lines.take().is_some() {
            debug!("code source released");
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub charged: usize,
    pub rejected: usize,
    pub ignored: usize,
}

impl ScanSummary {
    fn record(&mut self, result: Result<ScanOutcome, JoinError>) {
        match result {
            Ok(ScanOutcome::Charged(_)) => self.charged += 1,
            Ok(ScanOutcome::Rejected(_)) => self.rejected += 1,
            Ok(ScanOutcome::Busy) => self.ignored += 1,
            Err(err) => {
                warn!(error = %err, "scan task did not complete");
                self.rejected += 1;
            }
        }
    }
}

/// Feed every decoded code into the flow until the source runs dry.
///
/// Codes are handled concurrently the way a live decoder fires callbacks, so
/// a re-detection while a debit is in flight comes back as `Busy`. The source
/// is stopped before outstanding debits are awaited.
pub async fn run_scanner(flow: &ScanFlow, source: &mut dyn CodeSource) -> ScanSummary {
    let mut pending = JoinSet::new();
    let mut summary = ScanSummary::default();

    loop {
        tokio::select! {
            code = source.next_code() => match code {
                Some(code) => {
                    let flow = flow.clone();
                    pending.spawn(async move { flow.handle_code(&code).await });
                }
                None => break,
            },
            Some(done) = pending.join_next(), if !pending.is_empty() => summary.record(done),
        }
    }

    source.stop();
    while let Some(done) = pending.join_next().await {
        summary.record(done);
    }
    debug!(?summary, "scanner finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn line_source_skips_blank_lines_and_stops_at_eof() {
        let input: &[u8] = b"STUDENT:1|A|B\n\n   \nID: 2, Name: C, Class: D\n";
        let mut source = LineSource::new(input);
        assert_eq!(source.next_code().await.as_deref(), Some("STUDENT:1|A|B"));
        assert_eq!(source.next_code().await.as_deref(), Some("ID: 2, Name: C, Class: D"));
        assert_eq!(source.next_code().await, None);
        assert!(source.is_stopped());
        assert_eq!(source.next_code().await, None);
    }
}
