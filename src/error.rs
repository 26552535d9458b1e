//! Error types for the benchmark engine.

use thiserror::Error;

/// Errors that can occur while configuring or running a benchmark.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Invalid or mutually-exclusive configuration. Fatal before the run starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A pool connection could not be established. Fatal at pool-build time.
    #[error("Connection #{index} failed to connect: {source}")]
    Connect {
        index: usize,
        #[source]
        source: Box<BenchError>,
    },

    /// Client-level error from the underlying Valkey/Redis connection.
    #[error("Client error: {0}")]
    Client(#[from] redis::RedisError),

    /// A read returned no value where one was expected.
    #[error("Empty response for key '{0}'")]
    EmptyRead(String),

    /// The configured operation name is not in the supported set.
    /// Reported per call, never at startup.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
