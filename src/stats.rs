//! Run-wide counters and the per-second throughput reporter.
//!
//! [`RunCounters`] is the only state shared between workers and the
//! reporter. All counters are monotonically increasing and use relaxed
//! atomics: the reporter only computes deltas and final sums, so no
//! ordering constraint between the counters is required.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide counters written by every worker.
#[derive(Debug, Default)]
pub struct RunCounters {
    completed: AtomicU64,
    latency_sum_us: AtomicU64,
    latency_samples: AtomicU64,
    errors: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub completed: u64,
    pub latency_sum_us: u64,
    pub latency_samples: u64,
    pub errors: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed operation and its latency in microseconds.
    ///
    /// Failed operations are recorded too: the run measures degraded
    /// throughput under partial failure rather than halting.
    pub fn record(&self, latency_us: u64) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one failed operation.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Total completed operations so far.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Total failed operations so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Read all counters at once.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            latency_sum_us: self.latency_sum_us.load(Ordering::Relaxed),
            latency_samples: self.latency_samples.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// One reporter tick: throughput over the last interval and since start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalReport {
    /// Operations per second over the last interval.
    pub interval_rps: f64,
    /// Operations per second since the run started.
    pub overall_rps: f64,
    /// Average latency (µs) over the last interval.
    pub interval_avg_latency_us: f64,
    /// Total completed operations at this tick.
    pub completed: u64,
}

/// Computes interval/cumulative deltas over successive counter snapshots.
///
/// The reporter is a pure observer: it reads the atomics, never writes
/// them, and never blocks a worker.
pub struct ThroughputReporter<'a> {
    counters: &'a RunCounters,
    start: Instant,
    previous: CounterSnapshot,
    previous_time: Instant,
}

impl<'a> ThroughputReporter<'a> {
    /// Create a reporter anchored at the run's start instant.
    pub fn new(counters: &'a RunCounters, start: Instant) -> Self {
        Self {
            counters,
            start,
            previous: CounterSnapshot::default(),
            previous_time: start,
        }
    }

    /// Sample the counters at `now` and compute the interval report.
    pub fn tick(&mut self, now: Instant) -> IntervalReport {
        let current = self.counters.snapshot();
        let interval_secs = now.duration_since(self.previous_time).as_secs_f64();
        let overall_secs = now.duration_since(self.start).as_secs_f64();

        let interval_count = current.completed - self.previous.completed;
        let interval_lat_sum = current.latency_sum_us - self.previous.latency_sum_us;
        let interval_lat_samples = current.latency_samples - self.previous.latency_samples;

        let interval_rps = if interval_secs > 0.0 {
            interval_count as f64 / interval_secs
        } else {
            0.0
        };
        let overall_rps = if overall_secs > 0.0 {
            current.completed as f64 / overall_secs
        } else {
            0.0
        };
        let interval_avg_latency_us = if interval_lat_samples > 0 {
            interval_lat_sum as f64 / interval_lat_samples as f64
        } else {
            0.0
        };

        self.previous = current;
        self.previous_time = now;

        IntervalReport {
            interval_rps,
            overall_rps,
            interval_avg_latency_us,
            completed: current.completed,
        }
    }

    /// Run the reporting loop on a one-second cadence until `running` is
    /// cleared, then flush one last line.
    pub fn run(mut self, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_secs(1));
            let report = self.tick(Instant::now());
            print_interval(&report);
        }
        // Final flush so the last partial interval is visible.
        let report = self.tick(Instant::now());
        print_interval(&report);
        println!();
    }
}

fn print_interval(report: &IntervalReport) {
    print!(
        "[+] Throughput (1s interval): {:.2} req/s, overall={:.2} req/s, interval_avg_latency={:.2} us\r",
        report.interval_rps, report.overall_rps, report.interval_avg_latency_us
    );
    let _ = std::io::stdout().flush();
}
