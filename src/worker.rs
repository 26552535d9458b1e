//! Worker scheduling: quota distribution, key generation and the
//! per-worker benchmark loop.

use crate::client::BenchClient;
use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::limiter::RateLimiter;
use crate::ops::{self, OpKind};
use crate::pool::ClientPool;
use crate::stats::RunCounters;
use rand::Rng;
use std::time::Instant;
use tracing::error;

/// When an individual worker stops iterating.
#[derive(Debug, Clone, Copy)]
pub enum WorkerTermination {
    /// Stop after this many operations.
    Count(u64),
    /// Stop once the shared wall-clock deadline has passed.
    Deadline(Instant),
}

/// Key generation policy for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Round-robin over `[0, len)` by per-worker completed count.
    Sequential { len: u64 },
    /// Uniform draw from `[0, keyspace)`.
    Random { keyspace: u64 },
    /// A key unique to the worker and its completed count; reads without
    /// a keyspace target one fixed key.
    Unique,
}

impl KeyMode {
    /// Derive the key policy from the run configuration.
    pub fn from_config(config: &BenchConfig) -> KeyMode {
        if let Some(len) = config.sequential {
            KeyMode::Sequential { len }
        } else if config.random_keyspace > 0 {
            KeyMode::Random {
                keyspace: config.random_keyspace,
            }
        } else {
            KeyMode::Unique
        }
    }
}

/// Distribute `total` operations across `workers` as evenly as possible.
///
/// Worker `i` gets `total / workers`, plus one extra when
/// `i < total % workers`; the quotas always sum to `total` exactly.
pub fn split_requests(total: u64, workers: usize) -> Vec<u64> {
    let base = total / workers as u64;
    let remainder = (total % workers as u64) as usize;
    (0..workers)
        .map(|i| base + u64::from(i < remainder))
        .collect()
}

/// Generate the key for one iteration.
pub fn generate_key(
    mode: KeyMode,
    op: Option<OpKind>,
    worker_id: usize,
    completed: u64,
) -> String {
    match mode {
        KeyMode::Sequential { len } => format!("key:{}", completed % len),
        KeyMode::Random { keyspace } => {
            format!("key:{}", rand::rng().random_range(0..keyspace))
        }
        KeyMode::Unique => match op {
            Some(OpKind::Get) => "somekey".to_string(),
            _ => format!("key:{worker_id}:{completed}"),
        },
    }
}

/// Everything one worker needs, shared state borrowed from the driver.
pub struct WorkerContext<'a, C> {
    /// Worker index, used in keys and failure logs.
    pub id: usize,
    /// Termination policy for this worker.
    pub termination: WorkerTermination,
    /// Shared connection pool.
    pub pool: &'a ClientPool<C>,
    /// Shared rate limiter.
    pub limiter: &'a RateLimiter,
    /// Shared run counters.
    pub counters: &'a RunCounters,
    /// Resolved operation; `None` means the configured name is unknown
    /// and every iteration fails.
    pub op: Option<OpKind>,
    /// Configured operation name, for logging.
    pub op_name: &'a str,
    /// Key generation policy.
    pub key_mode: KeyMode,
    /// Pre-generated value payload for write operations.
    pub payload: String,
}

/// Run one worker to completion and return its latency samples (µs).
///
/// An operation failure is logged and counted but never stops the loop;
/// the run keeps measuring degraded throughput under partial failure.
pub fn run_worker<C: BenchClient>(ctx: WorkerContext<'_, C>) -> Vec<u64> {
    let mut latencies = match ctx.termination {
        WorkerTermination::Count(quota) => Vec::with_capacity(quota as usize),
        WorkerTermination::Deadline(_) => Vec::new(),
    };
    let mut completed = 0u64;

    loop {
        match ctx.termination {
            WorkerTermination::Count(quota) => {
                if completed >= quota {
                    break;
                }
            }
            WorkerTermination::Deadline(deadline) => {
                if Instant::now() >= deadline {
                    break;
                }
            }
        }

        let mut client = ctx.pool.acquire();
        ctx.limiter.throttle();

        let key = generate_key(ctx.key_mode, ctx.op, ctx.id, completed);
        let start = Instant::now();
        let result = match ctx.op {
            Some(op) => ops::execute(op, &mut *client, &key, &ctx.payload),
            None => Err(BenchError::UnknownOperation(ctx.op_name.to_string())),
        };
        let elapsed_us = start.elapsed().as_micros() as u64;

        if let Err(err) = result {
            ctx.counters.record_error();
            error!(worker = ctx.id, operation = ctx.op_name, "operation failed: {err}");
        }

        latencies.push(elapsed_us);
        ctx.counters.record(elapsed_us);

        drop(client);
        completed += 1;
    }

    latencies
}
