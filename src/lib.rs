//! Valkey Benchmark Library
//!
//! A concurrent load generator for Valkey/Redis-compatible key-value
//! stores.
//!
//! # Features
//!
//! - Bounded connection pool shared by all worker threads
//! - Static and ramping QPS rate limits (linear or exponential)
//! - Count-bounded and time-bounded runs
//! - Sequential, random and per-worker-unique key generation
//! - Live one-second throughput reporting and a final latency
//!   percentile report
//!
//! # CLI Usage
//!
//! ```bash
//! # 100k SETs over 4 threads against a local server
//! valkey-bench -H 127.0.0.1 -p 6379 --threads 4 -t set -n 100000
//!
//! # Time-bounded GETs ramping from 100 to 1000 QPS
//! valkey-bench -t get --test-duration 60 \
//!   --start-qps 100 --end-qps 1000 --qps-change-interval 5 --qps-change 100
//! ```
//!
//! As a library, [`runner::run_benchmark`] drives a full run against any
//! [`client::BenchClient`] implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod limiter;
pub mod ops;
pub mod pool;
pub mod report;
pub mod runner;
pub mod stats;
pub mod worker;

pub use client::{BenchClient, ValkeyClient};
pub use config::BenchConfig;
pub use error::BenchError;
pub use report::RunSummary;
pub use runner::run_benchmark;
