//! Final latency and throughput reporting.
//!
//! Pure post-run computation: only runs after every worker has joined, over
//! the complete merged latency sample set.

use std::fmt;
use std::time::Duration;

/// Latency distribution over the full run, in microseconds.
///
/// Percentiles use nearest-rank indexing into the sorted sample sequence:
/// `index = floor(p/100 * len)` clamped to the last sample, with `p`
/// clamped to `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyReport {
    pub min_us: u64,
    pub max_us: u64,
    pub avg_us: f64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub samples: usize,
}

impl LatencyReport {
    /// Compute the report from the merged samples.
    ///
    /// Returns `None` when no latencies were recorded.
    pub fn from_samples(mut samples: Vec<u64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();

        let sum: u64 = samples.iter().sum();
        Some(Self {
            min_us: samples[0],
            max_us: samples[samples.len() - 1],
            avg_us: sum as f64 / samples.len() as f64,
            p50_us: percentile(&samples, 50.0),
            p95_us: percentile(&samples, 95.0),
            p99_us: percentile(&samples, 99.0),
            samples: samples.len(),
        })
    }
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Latency Report (microseconds) ---")?;
        writeln!(f, "  Min: {} us", self.min_us)?;
        writeln!(f, "  P50: {} us", self.p50_us)?;
        writeln!(f, "  P95: {} us", self.p95_us)?;
        writeln!(f, "  P99: {} us", self.p99_us)?;
        writeln!(f, "  Max: {} us", self.max_us)?;
        write!(f, "  Avg: {:.2} us", self.avg_us)
    }
}

/// Nearest-rank percentile over an ascending-sorted slice.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    let p = p.clamp(0.0, 100.0);
    let index = ((p / 100.0) * sorted.len() as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Merge per-worker latency sequences into one sample set.
pub fn merge_latencies(per_worker: Vec<Vec<u64>>) -> Vec<u64> {
    let total: usize = per_worker.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    for latencies in per_worker {
        merged.extend(latencies);
    }
    merged
}

/// Final run summary printed after all workers have joined.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Total wall-clock run time.
    pub total_time: Duration,
    /// Total completed operations, failures included.
    pub completed: u64,
    /// Total failed operations.
    pub errors: u64,
    /// Latency distribution, when any samples exist.
    pub latency: Option<LatencyReport>,
}

impl RunSummary {
    /// Overall throughput in operations per second.
    pub fn overall_rps(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[+] Total test time: {:.2} seconds",
            self.total_time.as_secs_f64()
        )?;
        writeln!(f, "[+] Total requests completed: {}", self.completed)?;
        writeln!(f, "[+] Total errors: {}", self.errors)?;
        writeln!(f, "[+] Overall throughput: {:.2} req/s", self.overall_rps())?;
        writeln!(f)?;
        match &self.latency {
            Some(report) => write!(f, "{report}"),
            None => write!(f, "[!] No latencies recorded."),
        }
    }
}
