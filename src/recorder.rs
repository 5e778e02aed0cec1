//! Per-target call counting keyed by canonicalized arguments.

use crate::logging;
use crate::runtime::TargetId;
use crate::value::Value;
use crate::{MockError, Result};
use std::collections::HashMap;
use std::fmt;

/// Canonical bucket key for one argument list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallKey {
    /// No arguments, or arguments with no canonical encoding
    None,
    /// Exactly one integer argument, stored bare
    Int(i64),
    /// Canonical encoding of the full argument list
    Serialized(String),
}

impl CallKey {
    /// Canonical key for `args`, or the reason it has none.
    pub fn canonical(args: &[Value]) -> std::result::Result<CallKey, String> {
        match args {
            [] => Ok(CallKey::None),
            [Value::Int(i)] => Ok(CallKey::Int(*i)),
            _ => serde_json::to_string(args)
                .map(CallKey::Serialized)
                .map_err(|e| e.to_string()),
        }
    }

    /// Key used for lookups: unencodable arguments map to the unkeyed bucket
    pub fn lenient(args: &[Value]) -> CallKey {
        Self::canonical(args).unwrap_or(CallKey::None)
    }

    /// A representative argument list for this bucket
    pub fn decode(&self) -> Vec<Value> {
        match self {
            CallKey::None => Vec::new(),
            CallKey::Int(i) => vec![Value::Int(*i)],
            CallKey::Serialized(raw) => serde_json::from_str::<Vec<Value>>(raw)
                .unwrap_or_else(|_| vec![Value::Str(raw.clone())]),
        }
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKey::None => f.write_str("none"),
            CallKey::Int(i) => write!(f, "{}", i),
            CallKey::Serialized(raw) => f.write_str(raw),
        }
    }
}

/// Counts for one target, in first-seen bucket order
#[derive(Debug, Clone, Default)]
struct Buckets {
    order: Vec<(CallKey, u64)>,
    index: HashMap<CallKey, usize>,
}

impl Buckets {
    fn increment(&mut self, key: CallKey) {
        match self.index.get(&key) {
            Some(&slot) => self.order[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.order.len());
                self.order.push((key, 1));
            }
        }
    }

    fn count(&self, key: &CallKey) -> u64 {
        self.index
            .get(key)
            .map(|&slot| self.order[slot].1)
            .unwrap_or(0)
    }

    fn total(&self) -> u64 {
        self.order.iter().map(|(_, count)| count).sum()
    }
}

/// Call counter table for every mocked target
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    counts: HashMap<TargetId, Buckets>,
    strict_keys: bool,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject unencodable arguments instead of counting them unkeyed
    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    /// Count one call with the arguments exactly as received
    pub fn record_call(&mut self, target: &TargetId, args: &[Value]) -> Result<()> {
        let key = match CallKey::canonical(args) {
            Ok(key) => key,
            Err(reason) if self.strict_keys => {
                return Err(MockError::Serialization(format!(
                    "arguments to {} have no canonical encoding: {}",
                    target, reason
                )))
            }
            Err(reason) => {
                logging::log_unkeyed_call(&target.to_string(), &reason);
                CallKey::None
            }
        };
        self.counts.entry(target.clone()).or_default().increment(key);
        Ok(())
    }

    /// Total calls when `args` is empty, otherwise calls with exactly `args`
    pub fn num_calls(&self, target: &TargetId, args: &[Value]) -> u64 {
        let Some(buckets) = self.counts.get(target) else {
            return 0;
        };
        if args.is_empty() {
            return buckets.total();
        }
        buckets.count(&CallKey::lenient(args))
    }

    /// One representative argument list per distinct bucket
    pub fn arguments_called_with(&self, target: &TargetId) -> Vec<Vec<Value>> {
        self.counts
            .get(target)
            .map(|buckets| {
                buckets
                    .order
                    .iter()
                    .filter(|(_, count)| *count > 0)
                    .map(|(key, _)| key.decode())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn first_arguments_called_with(&self, target: &TargetId) -> Option<Vec<Value>> {
        self.arguments_called_with(target).into_iter().next()
    }

    pub fn last_arguments_called_with(&self, target: &TargetId) -> Option<Vec<Value>> {
        self.arguments_called_with(target).pop()
    }

    /// Forget every count for one target
    pub fn clear_target(&mut self, target: &TargetId) {
        self.counts.remove(target);
    }

    /// Forget every count
    pub fn reset(&mut self) {
        self.counts.clear();
    }

    /// Targets that have been called at least once
    pub fn tracked_targets(&self) -> usize {
        self.counts.len()
    }
}
