//! Run driver: wires the pool, limiter, workers and reporter together
//! and produces the final summary.

use crate::client::{generate_payload, BenchClient};
use crate::config::{BenchConfig, Termination};
use crate::error::BenchError;
use crate::limiter::RateLimiter;
use crate::ops::OpKind;
use crate::pool::ClientPool;
use crate::report::{merge_latencies, LatencyReport, RunSummary};
use crate::stats::{RunCounters, ThroughputReporter};
use crate::worker::{self, KeyMode, WorkerContext, WorkerTermination};
use anyhow::{anyhow, Context};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Execute a full benchmark run.
///
/// `connect` is called once per pool slot before any worker starts; the
/// first connection failure aborts the run. Workers then share the pool
/// and limiter until their termination condition fires, and the merged
/// per-worker latencies become the final [`RunSummary`].
pub fn run_benchmark<C, F>(config: &BenchConfig, connect: F) -> anyhow::Result<RunSummary>
where
    C: BenchClient,
    F: Fn(usize) -> Result<C, BenchError>,
{
    config.validate().context("invalid configuration")?;
    let limiter = RateLimiter::new(config.rate_limit().context("invalid rate limit")?);

    // Resolved once up front; an unknown name fails every iteration
    // instead of aborting the run.
    let op = OpKind::resolve(&config.command);
    if op.is_none() {
        warn!(command = %config.command, "unknown command, every operation will fail");
    }

    let pool = ClientPool::connect(config.pool_size, connect)
        .context("failed to populate connection pool")?;
    info!(clients = pool.size(), threads = config.threads, "connection pool ready");

    let terminations: Vec<WorkerTermination> = match config.termination() {
        Termination::Count(total) => worker::split_requests(total, config.threads)
            .into_iter()
            .map(WorkerTermination::Count)
            .collect(),
        Termination::Duration(duration) => {
            let deadline = Instant::now() + duration;
            vec![WorkerTermination::Deadline(deadline); config.threads]
        }
    };
    let key_mode = KeyMode::from_config(config);

    let counters = RunCounters::new();
    let running = AtomicBool::new(true);
    let start = Instant::now();

    let per_worker = std::thread::scope(|scope| -> anyhow::Result<Vec<Vec<u64>>> {
        let reporter = ThroughputReporter::new(&counters, start);
        let reporter_handle = scope.spawn(|| reporter.run(&running));

        let handles: Vec<_> = terminations
            .iter()
            .enumerate()
            .map(|(id, &termination)| {
                let ctx = WorkerContext {
                    id,
                    termination,
                    pool: &pool,
                    limiter: &limiter,
                    counters: &counters,
                    op,
                    op_name: &config.command,
                    key_mode,
                    payload: generate_payload(config.data_size),
                };
                scope.spawn(move || worker::run_worker(ctx))
            })
            .collect();

        // Join every worker before touching the running flag so the
        // reporter keeps printing for the whole run, then stop it.
        let worker_results: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
        running.store(false, Ordering::Relaxed);
        let reporter_result = reporter_handle.join();

        let mut per_worker = Vec::with_capacity(worker_results.len());
        for result in worker_results {
            per_worker.push(result.map_err(|_| anyhow!("worker thread panicked"))?);
        }
        reporter_result.map_err(|_| anyhow!("reporter thread panicked"))?;
        Ok(per_worker)
    })?;

    let total_time = start.elapsed();
    let snapshot = counters.snapshot();
    info!(
        completed = snapshot.completed,
        errors = snapshot.errors,
        "benchmark finished in {:.2}s",
        total_time.as_secs_f64()
    );

    Ok(RunSummary {
        total_time,
        completed: snapshot.completed,
        errors: snapshot.errors,
        latency: LatencyReport::from_samples(merge_latencies(per_worker)),
    })
}
