//! # Delivery-grouped last-value cache.
//!
//! [`ParameterCache`] stores the most recent value of every parameter it has
//! seen, with one extra guarantee: values that **arrived together** stay
//! answerable **together**. Each `update` publishes one shared, immutable
//! entry holding the whole delivery, and every parameter of the delivery
//! points at that same entry.
//!
//! Point queries ([`ParameterCache::get_value`]) are plain last-value
//! lookups. Grouped queries ([`ParameterCache::get_values`]) walk the
//! requested list and, for each still-unresolved parameter, satisfy as many
//! of the remaining requested parameters as possible from that *single*
//! entry before moving on — so parameters produced in one delivery are never
//! answered from two different points in time.
//!
//! A bounded per-parameter history is retained alongside the last values:
//! [`ParameterCache::get_all_values`] returns the most recent samples of one
//! parameter, newest first, dropping the oldest once the capacity is reached.
//!
//! ## Concurrency
//! Point and grouped reads are lock-free and may run concurrently with the
//! single writer (the router's ingestion path must never block on point
//! queries). This is sound because entries are immutable once published and
//! replaced atomically per key. History reads take a short per-parameter
//! lock shared with the writer.
//!
//! ## Example
//! ```rust
//! use paramflow::{Parameter, ParameterCache, ParameterValue, Value};
//!
//! let a = Parameter::new("/SAT1/A");
//! let b = Parameter::new("/SAT1/B");
//! let cache = ParameterCache::new();
//!
//! let sample = |p: &Parameter, v: i64| {
//!     ParameterValue::new(p.clone()).with_eng_value(Value::Sint64(v))
//! };
//!
//! cache.update(&[sample(&a, 1), sample(&b, 2)]);
//! cache.update(&[sample(&a, 3)]);
//!
//! // A alone: most recent.
//! assert_eq!(cache.get_value(&a).unwrap().eng_value, Some(Value::Sint64(3)));
//! // A and B together: A from the second delivery, B from the first
//! // (no newer B exists).
//! let both = cache.get_values(&[a.clone(), b.clone()]);
//! assert_eq!(both.len(), 2);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::values::{Parameter, ParameterValue};

/// Samples retained per parameter unless configured otherwise.
const DEFAULT_HISTORY_CAPACITY: usize = 512;

/// One published delivery: immutable once constructed, shared by every
/// parameter that was part of it.
struct CacheEntry {
    values: Vec<ParameterValue>,
}

impl CacheEntry {
    /// Last value for `parameter` within this delivery, if present.
    ///
    /// Last occurrence wins when a delivery carries the same parameter more
    /// than once.
    fn find(&self, parameter: &Parameter) -> Option<&ParameterValue> {
        self.values.iter().rev().find(|pv| pv.parameter == *parameter)
    }

    fn contains(&self, parameter: &Parameter) -> bool {
        self.values.iter().any(|pv| pv.parameter == *parameter)
    }
}

/// Last-value store with "arrived together" read semantics and a bounded
/// per-parameter history.
pub struct ParameterCache {
    entries: DashMap<Parameter, Arc<CacheEntry>>,
    /// Newest-first ring of recent samples per parameter.
    histories: DashMap<Parameter, Mutex<VecDeque<ParameterValue>>>,
    history_capacity: usize,
}

impl Default for ParameterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterCache {
    /// Creates an empty cache with the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty cache retaining at most `capacity` samples per
    /// parameter (a capacity of 0 is treated as 1).
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            histories: DashMap::new(),
            history_capacity: capacity.max(1),
        }
    }

    /// Records one delivery: a single shared entry is published and every
    /// parameter in `batch` is pointed at it (last writer wins per key).
    /// Every sample is also appended to its parameter's history, evicting
    /// the oldest once the capacity is reached.
    pub fn update(&self, batch: &[ParameterValue]) {
        if batch.is_empty() {
            return;
        }
        let entry = Arc::new(CacheEntry {
            values: batch.to_vec(),
        });
        for pv in &entry.values {
            self.entries.insert(pv.parameter.clone(), Arc::clone(&entry));
            let history = self.histories.entry(pv.parameter.clone()).or_default();
            let mut history = history.lock();
            history.push_front(pv.clone());
            history.truncate(self.history_capacity);
        }
    }

    /// Most recent value for `parameter`, if any. Plain lookup, no grouping.
    #[must_use]
    pub fn get_value(&self, parameter: &Parameter) -> Option<ParameterValue> {
        self.entries
            .get(parameter)
            .and_then(|entry| entry.find(parameter).cloned())
    }

    /// Values for `parameters`, answered delivery-consistently.
    ///
    /// Walks the request in order; each unresolved parameter's entry also
    /// satisfies every other still-unresolved requested parameter present in
    /// that entry, so parameters known to have been produced together are
    /// answered from one point in time. Parameters with no recorded value
    /// are omitted — misses are not errors.
    #[must_use]
    pub fn get_values(&self, parameters: &[Parameter]) -> Vec<ParameterValue> {
        let mut result = Vec::with_capacity(parameters.len());
        let mut resolved = vec![false; parameters.len()];
        for i in 0..parameters.len() {
            if resolved[i] {
                continue;
            }
            let Some(entry) = self.entries.get(&parameters[i]).map(|e| Arc::clone(e.value())) else {
                resolved[i] = true;
                continue;
            };
            for j in i..parameters.len() {
                if resolved[j] {
                    continue;
                }
                if let Some(pv) = entry.find(&parameters[j]) {
                    result.push(pv.clone());
                    resolved[j] = true;
                }
            }
            debug_assert!(entry.contains(&parameters[i]));
        }
        result
    }

    /// Retained samples of `parameter`, newest first. Empty (not an error)
    /// if the parameter was never recorded.
    #[must_use]
    pub fn get_all_values(&self, parameter: &Parameter) -> Vec<ParameterValue> {
        self.histories
            .get(parameter)
            .map(|history| history.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of parameters with a recorded value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
