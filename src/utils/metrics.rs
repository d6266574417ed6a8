//! Observability and Metrics
//!
//! Counters for API traffic, login attempts and codec failures.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for engine operations
#[derive(Debug)]
pub struct Metrics {
    /// Total API calls dispatched
    pub calls_total: AtomicU64,
    /// Calls that failed at the transport or codec layer
    pub calls_failed: AtomicU64,
    /// Calls answered with a non-success result code
    pub business_failures: AtomicU64,
    /// Login attempts (each runs the full handshake)
    pub logins_total: AtomicU64,
    /// Successful logins
    pub logins_success: AtomicU64,
    /// Logins that exhausted every attempt
    pub logins_failed: AtomicU64,
    /// Request payloads encrypted
    pub payloads_encrypted: AtomicU64,
    /// Response payloads that failed to decrypt
    pub decrypt_failures: AtomicU64,
    /// Client version refreshes triggered by the server
    pub version_refreshes: AtomicU64,
    /// Sessions invalidated by the server
    pub session_invalidations: AtomicU64,
    /// Total request body bytes sent
    pub bytes_sent: AtomicU64,
    /// Total response body bytes received
    pub bytes_received: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            calls_total: AtomicU64::new(0),
            calls_failed: AtomicU64::new(0),
            business_failures: AtomicU64::new(0),
            logins_total: AtomicU64::new(0),
            logins_success: AtomicU64::new(0),
            logins_failed: AtomicU64::new(0),
            payloads_encrypted: AtomicU64::new(0),
            decrypt_failures: AtomicU64::new(0),
            version_refreshes: AtomicU64::new(0),
            session_invalidations: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a dispatched call and its body size
    pub fn call_sent(&self, byte_count: u64) {
        self.calls_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a received response body
    pub fn response_received(&self, byte_count: u64) {
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn call_failed(&self) {
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn business_failure(&self) {
        self.business_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn login_attempt(&self) {
        self.logins_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn login_success(&self) {
        self.logins_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn login_failed(&self) {
        self.logins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn payload_encrypted(&self) {
        self.payloads_encrypted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrypt_failure(&self) {
        self.decrypt_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn version_refreshed(&self) {
        self.version_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_invalidated(&self) {
        self.session_invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls_total: self.calls_total.load(Ordering::Relaxed),
            calls_failed: self.calls_failed.load(Ordering::Relaxed),
            business_failures: self.business_failures.load(Ordering::Relaxed),
            logins_total: self.logins_total.load(Ordering::Relaxed),
            logins_success: self.logins_success.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            payloads_encrypted: self.payloads_encrypted.load(Ordering::Relaxed),
            decrypt_failures: self.decrypt_failures.load(Ordering::Relaxed),
            version_refreshes: self.version_refreshes.load(Ordering::Relaxed),
            session_invalidations: self.session_invalidations.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            calls_total = snapshot.calls_total,
            calls_failed = snapshot.calls_failed,
            business_failures = snapshot.business_failures,
            logins_total = snapshot.logins_total,
            logins_success = snapshot.logins_success,
            logins_failed = snapshot.logins_failed,
            payloads_encrypted = snapshot.payloads_encrypted,
            decrypt_failures = snapshot.decrypt_failures,
            version_refreshes = snapshot.version_refreshes,
            session_invalidations = snapshot.session_invalidations,
            bytes_sent = snapshot.bytes_sent,
            bytes_received = snapshot.bytes_received,
            uptime_seconds = snapshot.uptime_seconds,
            "Engine metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub calls_total: u64,
    pub calls_failed: u64,
    pub business_failures: u64,
    pub logins_total: u64,
    pub logins_success: u64,
    pub logins_failed: u64,
    pub payloads_encrypted: u64,
    pub decrypt_failures: u64,
    pub version_refreshes: u64,
    pub session_invalidations: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.call_sent(100);
        metrics.call_sent(28);
        metrics.response_received(64);
        metrics.login_attempt();
        metrics.login_attempt();
        metrics.login_success();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.calls_total, 2);
        assert_eq!(snapshot.bytes_sent, 128);
        assert_eq!(snapshot.bytes_received, 64);
        assert_eq!(snapshot.logins_total, 2);
        assert_eq!(snapshot.logins_success, 1);
        assert_eq!(snapshot.logins_failed, 0);
    }
}
