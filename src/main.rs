//! Command-line interface for valkey-bench
//!
//! # Usage Examples
//! ```bash
//! # 100k SETs over 4 threads
//! valkey-bench -H 127.0.0.1 -p 6379 --threads 4 -t set -n 100000
//!
//! # 60s of GETs over random keys, capped at 5000 QPS
//! valkey-bench -t get -r 100000 --test-duration 60 --qps 5000
//!
//! # Exponential QPS ramp, doubling every 5 seconds
//! valkey-bench --test-duration 120 --start-qps 100 --end-qps 10000 \
//!   --qps-change-interval 5 --qps-ramp-mode exponential --qps-ramp-factor 2.0
//! ```

use clap::Parser;
use valkey_bench::config::{BenchConfig, RampCurve, Termination};
use valkey_bench::{run_benchmark, ValkeyClient};

#[derive(Parser)]
#[command(name = "valkey-bench")]
#[command(about = "A concurrent benchmark tool for Valkey/Redis-compatible servers")]
#[command(long_about = None)]
struct Cli {
    /// Server hostname or IP address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = 6379)]
    port: u16,

    /// Number of pooled connections shared by all workers
    #[arg(short = 'c', long = "clients", default_value_t = 50)]
    clients: usize,

    /// Total number of requests for a count-bounded run
    #[arg(short = 'n', long)]
    requests: Option<u64>,

    /// Value payload size in bytes for write operations
    #[arg(short = 'd', long = "data-size", default_value_t = 3)]
    data_size: usize,

    /// Operation to benchmark (set, get, hset, mset, mget, custom)
    #[arg(short = 't', long = "command", default_value = "set")]
    command: String,

    /// Draw keys uniformly from [0, KEYSPACE) instead of unique keys
    #[arg(short = 'r', long = "random", value_name = "KEYSPACE", default_value_t = 0)]
    random: u64,

    /// Issue exactly one request per key in [0, KEYSPACE), round-robin
    #[arg(long, value_name = "KEYSPACE")]
    sequential: Option<u64>,

    /// Number of worker threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Run for this many seconds instead of a fixed request count
    #[arg(long, value_name = "SECONDS")]
    test_duration: Option<u64>,

    /// Static QPS cap across all workers (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    qps: u32,

    /// Starting QPS for a ramp
    #[arg(long, default_value_t = 0)]
    start_qps: u32,

    /// Target QPS for a ramp
    #[arg(long, default_value_t = 0)]
    end_qps: u32,

    /// Seconds between QPS ramp adjustments
    #[arg(long, value_name = "SECONDS", default_value_t = 0)]
    qps_change_interval: u64,

    /// Signed QPS delta per interval for a linear ramp
    #[arg(long, default_value_t = 0)]
    qps_change: i32,

    /// Ramp curve shape
    #[arg(long, value_enum, default_value = "linear")]
    qps_ramp_mode: RampCurve,

    /// Multiplier per interval for an exponential ramp
    #[arg(long, default_value_t = 0.0)]
    qps_ramp_factor: f64,

    /// Connect over TLS
    #[arg(long, default_value_t = false)]
    tls: bool,
}

impl Cli {
    fn into_config(self) -> BenchConfig {
        BenchConfig {
            host: self.host,
            port: self.port,
            pool_size: self.clients,
            threads: self.threads,
            requests: self.requests,
            data_size: self.data_size,
            command: self.command,
            random_keyspace: self.random,
            sequential: self.sequential,
            test_duration: self.test_duration,
            qps: self.qps,
            start_qps: self.start_qps,
            end_qps: self.end_qps,
            qps_change_interval: self.qps_change_interval,
            qps_change: self.qps_change,
            qps_ramp_mode: self.qps_ramp_mode,
            qps_ramp_factor: self.qps_ramp_factor,
            tls: self.tls,
        }
    }
}

fn print_banner(config: &BenchConfig) {
    println!(
        "[+] Target: {}:{}{}",
        config.host,
        config.port,
        if config.tls { " (TLS)" } else { "" }
    );
    println!(
        "[+] Threads: {}, pooled connections: {}",
        config.threads, config.pool_size
    );
    println!(
        "[+] Command: {}, data size: {} bytes",
        config.command, config.data_size
    );
    match config.termination() {
        Termination::Count(total) => println!("[+] Total requests: {total}"),
        Termination::Duration(d) => println!("[+] Test duration: {} seconds", d.as_secs()),
    }
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Cli::parse().into_config();
    print_banner(&config);

    let summary = run_benchmark(&config, |_| ValkeyClient::connect(&config))?;
    println!("{summary}");
    Ok(())
}
