//! Optional metrics instrumentation for ordo.
//!
//! When the `observe` feature is enabled, store operations emit counters and
//! histograms via the [`metrics`] crate. A downstream application must install
//! a metrics recorder to collect the data.
//!
//! Without the feature every function in this module is a zero-cost no-op.

/// Record a committed append (counter + latency histogram + events).
///
/// - `ordo.append.commits_total`
/// - `ordo.append.events_total`
/// - `ordo.append.commit_duration_seconds`
#[inline]
pub fn record_append(duration: std::time::Duration, events: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("ordo.append.commits_total").increment(1);
        metrics::counter!("ordo.append.events_total").increment(events as u64);
        metrics::histogram!("ordo.append.commit_duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, events);
    }
}

/// Record an append rejected before commit.
///
/// - `ordo.append.rejected_total` – counter with `reason` label
///   (`conflict` / `invalid` / `error`)
#[inline]
pub fn record_rejected(reason: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("ordo.append.rejected_total", "reason" => reason).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = reason;
    }
}

/// Record a read (counter with `scope` label + events returned).
///
/// - `ordo.read.total` – `scope` is `aggregate` or `global`
/// - `ordo.read.events_total`
#[inline]
pub fn record_read(scope: &'static str, events: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("ordo.read.total", "scope" => scope).increment(1);
        metrics::counter!("ordo.read.events_total", "scope" => scope).increment(events as u64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (scope, events);
    }
}
