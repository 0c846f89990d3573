//! Streaming aggregation over validated entries
//!
//! Two tallies are kept: requests per client address, and (count, total
//! latency) per path. Both remember the order in which keys were first seen.
//! Ranking uses a stable sort, so among equal values the key seen first in
//! the stream ranks first. Top-N truncation only happens in
//! [`AggregationState::finalize`], after any shard merge.

use crate::ValidatedEntry;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Largest accepted `max_clients` / `max_paths`; larger values are clamped.
pub const MAX_TOP_N: usize = 10_000;

// RANKED MAP //

/// Key/value pairs in rank order. Serializes as a JSON object whose keys
/// keep that order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMap<V>(Vec<(String, V)>);

impl<V> RankedMap<V> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<V> Default for RankedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> FromIterator<(String, V)> for RankedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<V: Serialize> Serialize for RankedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// PATH STATS //

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathStats {
    pub count: u64,
    pub total_ms: u128,
}

impl PathStats {
    /// Average latency in hundredths of a second, rounded half away from zero.
    /// Integer arithmetic, so 5 ms is exactly 0.005 s and rounds to 0.01.
    pub fn average_hundredths(&self) -> u128 {
        if self.count == 0 {
            return 0;
        }
        // hundredths = total_ms / (10 * count), rounded
        let denom = 10 * u128::from(self.count);
        (2 * self.total_ms + denom) / (2 * denom)
    }

    pub fn average_seconds(&self) -> f64 {
        self.average_hundredths() as f64 / 100.0
    }
}

// TALLY //

// insertion-ordered map; index points into `slots`
#[derive(Debug, Clone)]
struct Tally<V> {
    index: HashMap<String, usize>,
    slots: Vec<(String, V)>,
}

impl<V> Default for Tally<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
        }
    }
}

impl<V: Default> Tally<V> {
    fn entry(&mut self, key: &str) -> &mut V {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                let slot = self.slots.len();
                self.index.insert(key.to_string(), slot);
                self.slots.push((key.to_string(), V::default()));
                slot
            }
        };
        &mut self.slots[slot].1
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.slots[slot].1)
    }
}

// AGGREGATION STATE //

#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    clients: Tally<u64>,
    paths: Tally<PathStats>,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, entry: &ValidatedEntry) {
        *self.clients.entry(&entry.remote_addr) += 1;

        let stats = self.paths.entry(&entry.http_path);
        stats.count += 1;
        stats.total_ms += u128::from(entry.http_response_time_milliseconds);
    }

    /// Fold another shard into this one. Keys already here keep their place;
    /// keys new to this shard follow in the other shard's order.
    pub fn merge(&mut self, other: AggregationState) {
        for (addr, count) in other.clients.slots {
            *self.clients.entry(&addr) += count;
        }
        for (path, theirs) in other.paths.slots {
            let ours = self.paths.entry(&path);
            ours.count += theirs.count;
            ours.total_ms += theirs.total_ms;
        }
    }

    pub fn client_count(&self, addr: &str) -> Option<u64> {
        self.clients.get(addr).copied()
    }

    pub fn path_stats(&self, path: &str) -> Option<PathStats> {
        self.paths.get(path).copied()
    }

    /// Clients in first-seen order.
    pub fn clients(&self) -> impl Iterator<Item = (&str, u64)> {
        self.clients.slots.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Paths in first-seen order.
    pub fn paths(&self) -> impl Iterator<Item = (&str, PathStats)> {
        self.paths.slots.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn top_clients(&self, max_clients: usize) -> RankedMap<u64> {
        let mut ranked: Vec<(&str, u64)> = self.clients().collect();
        ranked.sort_by_key(|&(_, count)| Reverse(count));

        ranked
            .into_iter()
            .take(max_clients.min(MAX_TOP_N))
            .map(|(addr, count)| (addr.to_string(), count))
            .collect()
    }

    pub fn top_paths(&self, max_paths: usize) -> RankedMap<f64> {
        let mut ranked: Vec<(&str, PathStats)> = self.paths().collect();
        // rank on the rounded value, so paths equal to two decimals tie
        ranked.sort_by_key(|(_, stats)| Reverse(stats.average_hundredths()));

        ranked
            .into_iter()
            .take(max_paths.min(MAX_TOP_N))
            .map(|(path, stats)| (path.to_string(), stats.average_seconds()))
            .collect()
    }

    pub fn finalize(&self, max_clients: usize, max_paths: usize) -> (RankedMap<u64>, RankedMap<f64>) {
        (self.top_clients(max_clients), self.top_paths(max_paths))
    }
}
