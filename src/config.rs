//! Benchmark run configuration and startup validation.
//!
//! A [`BenchConfig`] is immutable once the run starts. All fatal checks
//! (mutually-exclusive flags, ramp parameter consistency) happen in
//! [`BenchConfig::validate`] before any connection is opened or worker
//! spawned.

use crate::error::BenchError;
use crate::limiter::{RampMode, RateLimit};
use std::time::Duration;

/// Default total request count when neither `--requests`, `--sequential`
/// nor `--test-duration` is given.
pub const DEFAULT_TOTAL_REQUESTS: u64 = 100_000;

/// What ends the run: a fixed operation count or a wall-clock deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Run until the configured number of operations has completed.
    Count(u64),
    /// Run until `start + duration` has passed.
    Duration(Duration),
}

/// QPS ramp curve selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RampCurve {
    /// Add a fixed signed delta per interval.
    Linear,
    /// Multiply by a fixed factor per interval.
    Exponential,
}

/// Complete benchmark configuration.
///
/// Built from the CLI in `main.rs`; the engine only ever sees a validated
/// instance.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Number of pooled connections.
    pub pool_size: usize,
    /// Number of worker threads.
    pub threads: usize,
    /// Explicit total request count, if given.
    pub requests: Option<u64>,
    /// Value size in bytes for write operations.
    pub data_size: usize,
    /// Operation name (set, get, hset, mset, mget, custom).
    pub command: String,
    /// Random keyspace size; 0 disables random keys.
    pub random_keyspace: u64,
    /// Sequential keyspace length, if sequential mode is enabled.
    pub sequential: Option<u64>,
    /// Test duration in seconds, if time-bounded.
    pub test_duration: Option<u64>,
    /// Static QPS limit; 0 disables it.
    pub qps: u32,
    /// Starting QPS for a ramp.
    pub start_qps: u32,
    /// Ending QPS for a ramp.
    pub end_qps: u32,
    /// Seconds between ramp adjustments.
    pub qps_change_interval: u64,
    /// Signed QPS delta per interval (linear mode only).
    pub qps_change: i32,
    /// Ramp curve.
    pub qps_ramp_mode: RampCurve,
    /// Multiplier per interval (exponential mode only).
    pub qps_ramp_factor: f64,
    /// Connect with TLS.
    pub tls: bool,
}

impl BenchConfig {
    /// Validate the configuration. Every violation here is fatal and must
    /// be reported before the run starts.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.threads == 0 {
            return Err(BenchError::Config("--threads must be at least 1".into()));
        }
        if self.pool_size == 0 {
            return Err(BenchError::Config("--clients must be at least 1".into()));
        }

        // Exactly one of {explicit count, sequential keyspace, duration}
        // may govern termination.
        if self.sequential.is_some() && self.requests.is_some() {
            return Err(BenchError::Config(
                "--sequential is mutually exclusive with --requests".into(),
            ));
        }
        if self.test_duration.is_some() && self.requests.is_some() {
            return Err(BenchError::Config(
                "--test-duration is mutually exclusive with --requests".into(),
            ));
        }
        if self.test_duration.is_some() && self.sequential.is_some() {
            return Err(BenchError::Config(
                "--test-duration is mutually exclusive with --sequential".into(),
            ));
        }
        if let Some(d) = self.test_duration {
            if d == 0 {
                return Err(BenchError::Config(
                    "--test-duration must be a positive number of seconds".into(),
                ));
            }
        }
        if let Some(len) = self.sequential {
            if len == 0 {
                return Err(BenchError::Config(
                    "--sequential keyspace length must be positive".into(),
                ));
            }
        }

        // The rate-limit cross-checks live with the limit construction so
        // the two can never disagree.
        self.rate_limit()?;

        Ok(())
    }

    /// How the run terminates.
    pub fn termination(&self) -> Termination {
        if let Some(secs) = self.test_duration {
            Termination::Duration(Duration::from_secs(secs))
        } else {
            Termination::Count(self.total_requests())
        }
    }

    /// Effective total request count for count-bounded runs.
    ///
    /// Sequential mode issues exactly one request per key in the keyspace.
    pub fn total_requests(&self) -> u64 {
        self.sequential
            .or(self.requests)
            .unwrap_or(DEFAULT_TOTAL_REQUESTS)
    }

    /// Build the validated rate limit from the QPS flags.
    pub fn rate_limit(&self) -> Result<RateLimit, BenchError> {
        let has_static = self.qps > 0;
        let has_ramp = self.start_qps > 0
            || self.end_qps > 0
            || self.qps_change_interval > 0
            || self.qps_change != 0;

        if has_static && has_ramp {
            return Err(BenchError::Config(
                "--qps is mutually exclusive with --start-qps/--end-qps/--qps-change-interval/--qps-change"
                    .into(),
            ));
        }

        if has_static {
            return Ok(RateLimit::Static { qps: self.qps });
        }

        if !has_ramp {
            return Ok(RateLimit::Unconstrained);
        }

        if self.start_qps == 0 || self.end_qps == 0 || self.qps_change_interval == 0 {
            return Err(BenchError::Config(
                "QPS ramping requires --start-qps, --end-qps and --qps-change-interval".into(),
            ));
        }
        if self.start_qps == self.end_qps {
            return Err(BenchError::Config(
                "--start-qps and --end-qps must be different".into(),
            ));
        }

        let mode = match self.qps_ramp_mode {
            RampCurve::Linear => {
                if self.qps_change == 0 {
                    return Err(BenchError::Config(
                        "linear QPS ramping requires a nonzero --qps-change".into(),
                    ));
                }
                let rising = self.end_qps > self.start_qps;
                if rising != (self.qps_change > 0) {
                    return Err(BenchError::Config(
                        "--qps-change sign must match (end-qps - start-qps)".into(),
                    ));
                }
                RampMode::Linear {
                    change: self.qps_change,
                }
            }
            RampCurve::Exponential => {
                if self.qps_ramp_factor <= 0.0 {
                    return Err(BenchError::Config(
                        "exponential QPS ramping requires a positive --qps-ramp-factor".into(),
                    ));
                }
                if self.qps_ramp_factor == 1.0 {
                    return Err(BenchError::Config(
                        "--qps-ramp-factor of exactly 1.0 never reaches --end-qps".into(),
                    ));
                }
                // The factor must move the target toward end-qps, or the
                // ramp multiplies away from it forever.
                if self.qps_ramp_factor < 1.0 && self.end_qps > self.start_qps {
                    return Err(BenchError::Config(
                        "--qps-ramp-factor below 1.0 ramps down but end-qps is above start-qps"
                            .into(),
                    ));
                }
                if self.qps_ramp_factor > 1.0 && self.end_qps < self.start_qps {
                    return Err(BenchError::Config(
                        "--qps-ramp-factor above 1.0 ramps up but end-qps is below start-qps"
                            .into(),
                    ));
                }
                RampMode::Exponential {
                    factor: self.qps_ramp_factor,
                }
            }
        };

        Ok(RateLimit::Ramp {
            start: self.start_qps,
            end: self.end_qps,
            interval: Duration::from_secs(self.qps_change_interval),
            mode,
        })
    }
}
