//! Process-wide operation counters.
//!
//! Incremented by the manager; [`Metrics::flush`] reports them as one
//! `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    queries_executed: AtomicU64,
    mutations_submitted: AtomicU64,
    mutations_failed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// All counters at zero.
    pub const fn new() -> Self {
        Self {
            queries_executed: AtomicU64::new(0),
            mutations_submitted: AtomicU64::new(0),
            mutations_failed: AtomicU64::new(0),
        }
    }

    /// Count one executed read query.
    pub fn inc_queries(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one mutation handed to the executor.
    pub fn inc_mutations_submitted(&self) {
        self.mutations_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one mutation that did not resolve to success.
    pub fn inc_mutations_failed(&self) {
        self.mutations_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read queries executed so far.
    pub fn queries_executed(&self) -> u64 {
        self.queries_executed.load(Ordering::Relaxed)
    }

    /// Mutations submitted so far.
    pub fn mutations_submitted(&self) -> u64 {
        self.mutations_submitted.load(Ordering::Relaxed)
    }

    /// Mutations failed so far.
    pub fn mutations_failed(&self) -> u64 {
        self.mutations_failed.load(Ordering::Relaxed)
    }

    /// Emit all counters as a single event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            queries_executed = self.queries_executed(),
            mutations_submitted = self.mutations_submitted(),
            mutations_failed = self.mutations_failed(),
        );
    }
}
