//! Keyed storage for operators that combine incoming deltas with
//! accumulated per-key state (reduce, join, topk).

use fnv::FnvBuildHasher;
use indexmap::IndexMap;

use crate::multiset::{Multiplicity, MultiSet};
use crate::value::Value;

type Inner<V> = IndexMap<V, Multiplicity, FnvBuildHasher>;

/// `K -> (V -> multiplicity)`, with no zero multiplicities and no empty
/// inner maps: both are pruned eagerly so the index's size always reflects
/// live data, never history.
///
/// Inner maps preserve first-insertion order (backed by [`indexmap`]); this
/// gives `mode`'s tie-break a deterministic "first encountered" rule and
/// keeps test assertions reproducible.
#[derive(Debug, Clone)]
pub struct Index<K, V> {
    outer: IndexMap<K, Inner<V>, FnvBuildHasher>,
}

impl<K, V> Default for Index<K, V> {
    fn default() -> Self {
        Index { outer: IndexMap::default() }
    }
}

impl<K: Value, V: Value> Index<K, V> {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjusts the multiplicity of `(k, v)` by `delta`, pruning the entry
    /// (and the key, if it becomes empty) when the total reaches zero.
    pub fn add(&mut self, k: K, v: V, delta: Multiplicity) {
        if delta == 0 {
            return;
        }
        let inner = self.outer.entry(k.clone()).or_default();
        let total = match inner.get(&v) {
            Some(existing) => existing + delta,
            None => delta,
        };
        if total == 0 {
            inner.shift_remove(&v);
        } else {
            inner.insert(v, total);
        }
        if inner.is_empty() {
            self.outer.shift_remove(&k);
        }
    }

    /// Current signed multiplicity of `(k, v)`, or `0` if absent.
    pub fn multiplicity(&self, k: &K, v: &V) -> Multiplicity {
        self.outer.get(k).and_then(|inner| inner.get(v)).copied().unwrap_or(0)
    }

    /// Iterates the `(value, multiplicity)` pairs stored under `k`, in
    /// first-insertion order. Empty for keys with no live entries.
    pub fn entries(&self, k: &K) -> impl Iterator<Item = (&V, Multiplicity)> {
        self.outer.get(k).into_iter().flat_map(|inner| inner.iter().map(|(v, m)| (v, *m)))
    }

    /// True when `k` currently has no live entries.
    pub fn is_empty_key(&self, k: &K) -> bool {
        !self.outer.contains_key(k)
    }

    /// Replaces the entries stored under `k` with `new_entries`, returning
    /// the minimal `(value, delta)` pairs needed to get there from the
    /// current state, and applying those deltas to `self` in the same call.
    ///
    /// This is the "recompute from scratch, diff against what we last
    /// emitted, emit the minimal delta" primitive shared by `reduce`,
    /// `join`, and `topk`'s window recomputation: each maintains some
    /// derived per-key state and needs to tell a consumer only what
    /// changed.
    pub(crate) fn reconcile<I: IntoIterator<Item = (V, Multiplicity)>>(
        &mut self,
        k: &K,
        new_entries: I,
    ) -> Vec<(V, Multiplicity)> {
        use std::collections::HashMap;

        let mut new_totals: HashMap<V, Multiplicity> = HashMap::new();
        for (v, m) in new_entries {
            *new_totals.entry(v).or_insert(0) += m;
        }

        let old: Vec<(V, Multiplicity)> = self.entries(k).map(|(v, m)| (v.clone(), m)).collect();
        let mut deltas = Vec::new();
        for (v, old_m) in &old {
            let new_m = new_totals.remove(v).unwrap_or(0);
            let delta = new_m - old_m;
            if delta != 0 {
                deltas.push((v.clone(), delta));
            }
        }
        for (v, new_m) in new_totals {
            if new_m != 0 {
                deltas.push((v, new_m));
            }
        }

        for (v, delta) in deltas.iter().cloned() {
            self.add(k.clone(), v, delta);
        }
        deltas
    }

    /// Number of distinct keys with at least one live entry.
    pub fn key_count(&self) -> usize {
        self.outer.len()
    }

    /// Iterates every currently-live key.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.outer.keys()
    }
}

impl<K: Value, V1: Value> Index<K, V1> {
    /// Keyed equi-join against another index: for every `(k, v1, m1)` in
    /// `self` and `(k, v2, m2)` in `other`, emits `((k, (v1, v2)), m1 *
    /// m2)`.
    ///
    /// Probes whichever side currently has fewer keys, to bound work by
    /// `min(|self|, |other|)` rather than always walking `self`.
    pub fn join<V2: Value>(&self, other: &Index<K, V2>) -> MultiSet<(K, (V1, V2))> {
        let mut out = MultiSet::new();
        if self.key_count() <= other.key_count() {
            for k in self.keys() {
                if let Some(build_inner) = other.outer.get(k) {
                    for (v1, m1) in self.entries(k) {
                        for (v2, m2) in build_inner.iter() {
                            out.push((k.clone(), (v1.clone(), v2.clone())), m1 * m2);
                        }
                    }
                }
            }
        } else {
            for k in other.keys() {
                if let Some(build_inner) = self.outer.get(k) {
                    for (v2, m2) in other.entries(k) {
                        for (v1, m1) in build_inner.iter() {
                            out.push((k.clone(), (v1.clone(), v2.clone())), m1 * m2);
                        }
                    }
                }
            }
        }
        out
    }
}
