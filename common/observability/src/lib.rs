use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters for the console's scan kiosk and backend traffic.
#[derive(Clone)]
pub struct ConsoleMetrics {
    pub registry: Registry,
    pub scans_total: IntCounterVec,
    pub backend_errors_total: IntCounterVec,
    pub debit_latency_seconds: Histogram,
}

impl ConsoleMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let scans_total = IntCounterVec::new(
            Opts::new("console_scans_total", "Decoded codes grouped by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(scans_total.clone()))?;

        let backend_errors_total = IntCounterVec::new(
            Opts::new(
                "console_backend_errors_total",
                "Backend failures grouped by endpoint and kind",
            ),
            &["endpoint", "kind"],
        )?;
        registry.register(Box::new(backend_errors_total.clone()))?;

        let debit_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "console_debit_latency_seconds",
                "Round trip time of debit requests",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(debit_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            scans_total,
            backend_errors_total,
            debit_latency_seconds,
        })
    }

    pub fn scan(&self, outcome: &str) {
        self.scans_total.with_label_values(&[outcome]).inc();
    }

    pub fn backend_error(&self, endpoint: &str, kind: &str) {
        self.backend_errors_total
            .with_label_values(&[endpoint, kind])
            .inc();
    }

    /// Prometheus text exposition of everything registered.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
