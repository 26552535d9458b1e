//! End-to-end engine tests against in-process mock clients.
//!
//! These exercise the full run path (pool, limiter, workers, counters,
//! summary) without a real server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use valkey_bench::client::BenchClient;
use valkey_bench::config::{BenchConfig, RampCurve};
use valkey_bench::error::BenchError;
use valkey_bench::runner::run_benchmark;

/// Shared in-memory store so every pooled mock sees the same data.
#[derive(Default)]
struct MockStore {
    data: Mutex<HashMap<String, String>>,
    set_calls: AtomicU64,
}

struct MockClient {
    store: Arc<MockStore>,
}

impl BenchClient for MockClient {
    fn set(&mut self, key: &str, value: &str) -> Result<(), BenchError> {
        self.store.set_calls.fetch_add(1, Ordering::Relaxed);
        self.store
            .data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, BenchError> {
        Ok(self.store.data.lock().unwrap().get(key).cloned())
    }

    fn hset(&mut self, key: &str, fields: &[(String, String)]) -> Result<(), BenchError> {
        let mut data = self.store.data.lock().unwrap();
        for (field, value) in fields {
            data.insert(format!("{key}.{field}"), value.clone());
        }
        Ok(())
    }

    fn mset(&mut self, pairs: &[(String, String)]) -> Result<(), BenchError> {
        let mut data = self.store.data.lock().unwrap();
        for (key, value) in pairs {
            data.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<String>>, BenchError> {
        let data = self.store.data.lock().unwrap();
        Ok(keys.iter().map(|key| data.get(key).cloned()).collect())
    }
}

/// A client whose every operation fails.
struct FailingClient;

fn injected() -> BenchError {
    BenchError::Io(std::io::Error::other("injected failure"))
}

impl BenchClient for FailingClient {
    fn set(&mut self, _key: &str, _value: &str) -> Result<(), BenchError> {
        Err(injected())
    }

    fn get(&mut self, _key: &str) -> Result<Option<String>, BenchError> {
        Err(injected())
    }

    fn hset(&mut self, _key: &str, _fields: &[(String, String)]) -> Result<(), BenchError> {
        Err(injected())
    }

    fn mset(&mut self, _pairs: &[(String, String)]) -> Result<(), BenchError> {
        Err(injected())
    }

    fn mget(&mut self, _keys: &[String]) -> Result<Vec<Option<String>>, BenchError> {
        Err(injected())
    }
}

fn base_config() -> BenchConfig {
    BenchConfig {
        host: "127.0.0.1".to_string(),
        port: 6379,
        pool_size: 4,
        threads: 2,
        requests: Some(200),
        data_size: 3,
        command: "set".to_string(),
        random_keyspace: 0,
        sequential: None,
        test_duration: None,
        qps: 0,
        start_qps: 0,
        end_qps: 0,
        qps_change_interval: 0,
        qps_change: 0,
        qps_ramp_mode: RampCurve::Linear,
        qps_ramp_factor: 0.0,
        tls: false,
    }
}

#[test]
fn test_count_bounded_run_completes_exact_total() {
    let store = Arc::new(MockStore::default());
    let mut config = base_config();
    config.requests = Some(250);
    config.threads = 4;

    let factory_store = store.clone();
    let summary = run_benchmark(&config, move |_| {
        Ok(MockClient {
            store: factory_store.clone(),
        })
    })
    .unwrap();

    assert_eq!(summary.completed, 250);
    assert_eq!(summary.errors, 0);
    assert_eq!(store.set_calls.load(Ordering::Relaxed), 250);
    let latency = summary.latency.expect("latency report");
    assert_eq!(latency.samples, 250);
    assert!(latency.min_us <= latency.p50_us);
    assert!(latency.p50_us <= latency.p95_us);
    assert!(latency.p95_us <= latency.p99_us);
    assert!(latency.p99_us <= latency.max_us);
}

#[test]
fn test_sequential_run_touches_each_key_once() {
    let store = Arc::new(MockStore::default());
    let mut config = base_config();
    config.requests = None;
    config.sequential = Some(100);
    config.threads = 1;

    let factory_store = store.clone();
    let summary = run_benchmark(&config, move |_| {
        Ok(MockClient {
            store: factory_store.clone(),
        })
    })
    .unwrap();

    assert_eq!(summary.completed, 100);
    let data = store.data.lock().unwrap();
    assert_eq!(data.len(), 100);
    for i in 0..100 {
        assert!(data.contains_key(&format!("key:{i}")));
    }
}

#[test]
fn test_failing_operations_still_fill_the_quota() {
    let mut config = base_config();
    config.requests = Some(120);
    config.threads = 3;

    let summary = run_benchmark(&config, |_| Ok(FailingClient)).unwrap();

    assert_eq!(summary.completed, 120);
    assert_eq!(summary.errors, 120);
    // Failed operations are still timed.
    assert_eq!(summary.latency.expect("latency report").samples, 120);
}

#[test]
fn test_unknown_command_fails_every_iteration() {
    let store = Arc::new(MockStore::default());
    let mut config = base_config();
    config.command = "flushall".to_string();
    config.requests = Some(50);

    let summary = run_benchmark(&config, move |_| {
        Ok(MockClient {
            store: store.clone(),
        })
    })
    .unwrap();

    assert_eq!(summary.completed, 50);
    assert_eq!(summary.errors, 50);
}

#[test]
fn test_more_threads_than_connections() {
    let store = Arc::new(MockStore::default());
    let mut config = base_config();
    config.pool_size = 2;
    config.threads = 8;
    config.requests = Some(400);

    let summary = run_benchmark(&config, move |_| {
        Ok(MockClient {
            store: store.clone(),
        })
    })
    .unwrap();

    assert_eq!(summary.completed, 400);
    assert_eq!(summary.errors, 0);
}

#[test]
fn test_connect_failure_aborts_the_run() {
    let config = base_config();

    let result = run_benchmark(&config, |index| {
        if index < 2 {
            Ok(FailingClient)
        } else {
            Err(injected())
        }
    });

    let err = result.expect_err("pool construction must fail");
    assert!(format!("{err:#}").contains("connection pool"));
}

#[test]
fn test_time_bounded_run_terminates() {
    let store = Arc::new(MockStore::default());
    let mut config = base_config();
    config.requests = None;
    config.test_duration = Some(1);
    config.threads = 2;
    // Keep the sample volume small; throughput is not under test here.
    config.qps = 1000;

    let start = std::time::Instant::now();
    let summary = run_benchmark(&config, move |_| {
        Ok(MockClient {
            store: store.clone(),
        })
    })
    .unwrap();

    assert!(summary.completed > 0);
    assert!(start.elapsed() >= std::time::Duration::from_secs(1));
    // Generous upper bound so the test never hangs silently.
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
}

#[test]
fn test_static_qps_limits_throughput() {
    let store = Arc::new(MockStore::default());
    let mut config = base_config();
    config.requests = Some(100);
    config.threads = 2;
    config.qps = 50;

    let start = std::time::Instant::now();
    let summary = run_benchmark(&config, move |_| {
        Ok(MockClient {
            store: store.clone(),
        })
    })
    .unwrap();

    assert_eq!(summary.completed, 100);
    // 100 ops at 50 QPS need a second window boundary to pass.
    assert!(start.elapsed() >= std::time::Duration::from_millis(900));
}
