//! Expiring key/value cache for catalog responses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Minimal cache capability consumed by the movie tools.
///
/// Values are stored as JSON so one cache can hold search lists, detail
/// records and similarity lists side by side.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value, ttl: Duration);
}

/// In-process cache.  Entries are dropped lazily when read after expiry;
/// there is no size bound.
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: Mutex<HashMap<String, (Value, Instant)>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for TtlCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        let expired = match entries.get(key) {
            None => return None,
            Some((_, expires_at)) => Instant::now() >= *expires_at,
        };
        if expired {
            entries.remove(key);
            debug!(key, "cache entry expired");
            return None;
        }
        entries.get(key).map(|(value, _)| value.clone())
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), (value, Instant::now() + ttl));
        }
    }
}

/// Derive a cache key from an operation tag and its parameters.
///
/// Parameters are serialized to JSON, object keys are sorted recursively and
/// the canonical text is hashed, so the same parameter set always lands on
/// the same key regardless of field order.
pub fn cache_key(tag: &str, params: &impl Serialize) -> Result<String> {
    let value = serde_json::to_value(params)?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{tag}:{:x}", hasher.finalize()))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
