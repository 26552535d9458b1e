//! Benchmark operation registry.
//!
//! The operation name from the configuration is resolved once at startup
//! into an [`OpKind`]; workers then dispatch through [`execute`] on every
//! iteration. An unresolvable name is not a startup error: the affected
//! workers fail (and log) each iteration, which keeps a misconfigured run
//! observable instead of silently absent.

use crate::client::BenchClient;
use crate::error::BenchError;

/// Number of keys touched by one `mset`/`mget` operation.
pub const MULTI_KEY_COUNT: usize = 50;

/// The closed set of benchmarkable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Set,
    Get,
    HSet,
    MSet,
    MGet,
    Custom,
}

impl OpKind {
    /// Resolve an operation name. Returns `None` for names outside the
    /// supported set.
    pub fn resolve(name: &str) -> Option<OpKind> {
        match name {
            "set" => Some(OpKind::Set),
            "get" => Some(OpKind::Get),
            "hset" => Some(OpKind::HSet),
            "mset" => Some(OpKind::MSet),
            "mget" => Some(OpKind::MGet),
            "custom" => Some(OpKind::Custom),
            _ => None,
        }
    }

    /// The canonical name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Set => "set",
            OpKind::Get => "get",
            OpKind::HSet => "hset",
            OpKind::MSet => "mset",
            OpKind::MGet => "mget",
            OpKind::Custom => "custom",
        }
    }
}

/// Execute one operation against `client`.
///
/// `key` is the generated key for this iteration and `value` the
/// pre-generated payload. Multi-key operations derive their key batch from
/// `key` so that distinct iterations touch distinct batches.
pub fn execute<C: BenchClient>(
    op: OpKind,
    client: &mut C,
    key: &str,
    value: &str,
) -> Result<(), BenchError> {
    match op {
        OpKind::Set => client.set(key, value),
        OpKind::Get => match client.get(key)? {
            Some(_) => Ok(()),
            None => Err(BenchError::EmptyRead(key.to_string())),
        },
        OpKind::HSet => {
            let fields = vec![
                ("field1".to_string(), value.to_string()),
                ("field2".to_string(), value.to_string()),
            ];
            client.hset(key, &fields)
        }
        OpKind::MSet => {
            let pairs: Vec<(String, String)> = (0..MULTI_KEY_COUNT)
                .map(|i| (format!("{key}:{i}"), value.to_string()))
                .collect();
            client.mset(&pairs)
        }
        OpKind::MGet => {
            let keys: Vec<String> = (0..MULTI_KEY_COUNT)
                .map(|i| format!("{key}:{i}"))
                .collect();
            client.mget(&keys)?;
            Ok(())
        }
        OpKind::Custom => custom(client),
    }
}

/// User-supplied operation hook.
///
/// Replace this body to benchmark your own command sequence; the default
/// issues a single fixed `set`.
pub fn custom<C: BenchClient>(client: &mut C) -> Result<(), BenchError> {
    client.set("custom_key", "custom_value")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_operations() {
        assert_eq!(OpKind::resolve("set"), Some(OpKind::Set));
        assert_eq!(OpKind::resolve("get"), Some(OpKind::Get));
        assert_eq!(OpKind::resolve("hset"), Some(OpKind::HSet));
        assert_eq!(OpKind::resolve("mset"), Some(OpKind::MSet));
        assert_eq!(OpKind::resolve("mget"), Some(OpKind::MGet));
        assert_eq!(OpKind::resolve("custom"), Some(OpKind::Custom));
    }

    #[test]
    fn test_resolve_unknown_operation() {
        assert_eq!(OpKind::resolve("flushall"), None);
        assert_eq!(OpKind::resolve(""), None);
        assert_eq!(OpKind::resolve("SET"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for op in [
            OpKind::Set,
            OpKind::Get,
            OpKind::HSet,
            OpKind::MSet,
            OpKind::MGet,
            OpKind::Custom,
        ] {
            assert_eq!(OpKind::resolve(op.name()), Some(op));
        }
    }
}
