//! Client abstraction over the key-value store.
//!
//! The engine only talks to [`BenchClient`]; the production implementation
//! wraps a `redis` crate connection, and tests substitute in-process mocks.

use crate::config::BenchConfig;
use crate::error::BenchError;
use rand::Rng;
use redis::Commands;

/// The operations a benchmarked client must support.
///
/// Construction establishes the underlying connection; a construction
/// failure is fatal at pool-build time.
pub trait BenchClient: Send {
    /// Store `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), BenchError>;

    /// Fetch the value under `key`, or `None` when absent.
    fn get(&mut self, key: &str) -> Result<Option<String>, BenchError>;

    /// Store multiple hash fields under `key`.
    fn hset(&mut self, key: &str, fields: &[(String, String)]) -> Result<(), BenchError>;

    /// Store multiple key-value pairs in one call.
    fn mset(&mut self, pairs: &[(String, String)]) -> Result<(), BenchError>;

    /// Fetch multiple keys in one call.
    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<String>>, BenchError>;
}

/// A single pooled connection to a Valkey/Redis-compatible server.
pub struct ValkeyClient {
    connection: redis::Connection,
}

impl ValkeyClient {
    /// Open one connection described by `config`.
    pub fn connect(config: &BenchConfig) -> Result<Self, BenchError> {
        let scheme = if config.tls { "rediss" } else { "redis" };
        let url = format!("{scheme}://{}:{}/", config.host, config.port);
        let client = redis::Client::open(url)?;
        let connection = client.get_connection()?;
        Ok(Self { connection })
    }
}

impl BenchClient for ValkeyClient {
    fn set(&mut self, key: &str, value: &str) -> Result<(), BenchError> {
        let () = self.connection.set(key, value)?;
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, BenchError> {
        Ok(self.connection.get(key)?)
    }

    fn hset(&mut self, key: &str, fields: &[(String, String)]) -> Result<(), BenchError> {
        let () = self.connection.hset_multiple(key, fields)?;
        Ok(())
    }

    fn mset(&mut self, pairs: &[(String, String)]) -> Result<(), BenchError> {
        let () = self.connection.mset(pairs)?;
        Ok(())
    }

    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<String>>, BenchError> {
        Ok(self.connection.mget(keys)?)
    }
}

/// Generate a random uppercase payload of `size` bytes.
///
/// Each worker generates its payload once up front; the payload content is
/// irrelevant to the measurement, only its size matters.
pub fn generate_payload(size: usize) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::rng();
    (0..size)
        .map(|_| CHARS[rng.random_range(0..CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_has_requested_size() {
        assert_eq!(generate_payload(0).len(), 0);
        assert_eq!(generate_payload(3).len(), 3);
        assert_eq!(generate_payload(1024).len(), 1024);
    }

    #[test]
    fn test_payload_is_uppercase_ascii() {
        let payload = generate_payload(256);
        assert!(payload.bytes().all(|b| b.is_ascii_uppercase()));
    }
}
