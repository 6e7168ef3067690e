//! Ordered, windowed per-key top-K with stable fractional-index output.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::Result;
use crate::fractional::key_between;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::index::Index;
use crate::multiset::{Multiplicity, MultiSet};
use crate::value::{tag, Value};

/// Window parameters for [`Stream::topk`].
///
/// `limit = None` means an unbounded window (the whole visible, ordered
/// set per key); `offset` defaults to `0`.
#[derive(Debug, Clone)]
pub struct TopKOptions {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Default for TopKOptions {
    fn default() -> Self {
        TopKOptions { offset: 0, limit: None }
    }
}

/// Per-key state: the full ordered set of currently-visible values (with
/// their stable tie-break tags), and the window slice as it was last
/// emitted (value, tag, fractional key).
struct KeyState<V> {
    sorted: Vec<(V, u64)>,
    window: Vec<(V, u64, String)>,
    value_tags: HashMap<V, u64>,
}

impl<V> Default for KeyState<V> {
    fn default() -> Self {
        KeyState { sorted: Vec::new(), window: Vec::new(), value_tags: HashMap::new() }
    }
}

struct TopKNode<K, V, C> {
    input: Edge<(K, V)>,
    output: Tap<(K, (V, String))>,
    counts: Index<K, V>,
    states: HashMap<K, KeyState<V>>,
    comparator: C,
    options: TopKOptions,
}

impl<K, V, C> TopKNode<K, V, C>
where
    K: Value,
    V: Value,
    C: Fn(&V, &V) -> Ordering,
{
    /// A free function, not a `&self` method: called while `self.states` is
    /// already mutably borrowed (see `run_once`), so it takes only the
    /// `comparator` field it actually needs rather than the whole node.
    fn position_of(comparator: &C, sorted: &[(V, u64)], v: &V, tag: u64) -> usize {
        sorted
            .binary_search_by(|(ev, etag)| comparator(ev, v).then(etag.cmp(&tag)))
            .unwrap_or_else(|pos| pos)
    }

    fn recompute_key(&mut self, k: &K, out: &mut MultiSet<(K, (V, String))>) {
        let state = self.states.entry(k.clone()).or_default();
        let (start, end) = {
            let visible_len = state.sorted.len();
            let opts = &self.options;
            let start = opts.offset.min(visible_len);
            let end = match opts.limit {
                Some(limit) => (start + limit).min(visible_len),
                None => visible_len,
            };
            (start, end)
        };

        let new_window: Vec<(V, u64)> = state.sorted[start..end].to_vec();
        let old_by_tag: HashMap<u64, String> =
            state.window.iter().map(|(_, tag, key)| (*tag, key.clone())).collect();

        let mut positions: Vec<Option<String>> = Vec::with_capacity(new_window.len());
        for (_, tag) in &new_window {
            positions.push(old_by_tag.get(tag).cloned());
        }
        // Fill gaps left-to-right: for each unassigned slot, find the next
        // already-known key to its right (an anchor or an already-filled
        // slot) and generate strictly between it and the running left bound.
        for i in 0..positions.len() {
            if positions[i].is_some() {
                continue;
            }
            let left = if i == 0 { None } else { positions[i - 1].clone() };
            let right = positions[i + 1..].iter().find_map(|p| p.clone());
            positions[i] = Some(key_between(left.as_deref(), right.as_deref()));
        }

        let new_window_with_keys: Vec<(V, u64, String)> = new_window
            .into_iter()
            .zip(positions)
            .map(|((v, tag), key)| (v, tag, key.expect("every slot assigned a key")))
            .collect();

        let new_by_tag: HashMap<u64, &String> =
            new_window_with_keys.iter().map(|(_, tag, key)| (*tag, key)).collect();

        for (v, old_tag, old_key) in &state.window {
            if !new_by_tag.contains_key(old_tag) {
                out.push((k.clone(), (v.clone(), old_key.clone())), -1);
            }
        }
        for (v, new_tag, new_key) in &new_window_with_keys {
            if !old_by_tag.contains_key(new_tag) {
                out.push((k.clone(), (v.clone(), new_key.clone())), 1);
            }
        }

        state.window = new_window_with_keys;
    }
}

impl<K, V, C> OpNode for TopKNode<K, V, C>
where
    K: Value,
    V: Value,
    C: Fn(&V, &V) -> Ordering,
{
    fn run_once(&mut self) {
        let mut per_key: HashMap<K, HashMap<V, Multiplicity>> = HashMap::new();
        for batch in drain_all(&self.input) {
            for ((k, v), m) in batch.into_inner() {
                *per_key.entry(k).or_default().entry(v).or_insert(0) += m;
            }
        }
        if per_key.is_empty() {
            return;
        }

        let mut out = MultiSet::new();
        for (k, deltas) in per_key {
            {
                let state = self.states.entry(k.clone()).or_default();
                for (v, delta) in deltas {
                    if delta == 0 {
                        continue;
                    }
                    let old_total = self.counts.multiplicity(&k, &v);
                    let new_total = old_total + delta;
                    self.counts.add(k.clone(), v.clone(), delta);

                    let was_visible = old_total > 0;
                    let is_visible = new_total > 0;
                    if !was_visible && is_visible {
                        let t = tag::next();
                        state.value_tags.insert(v.clone(), t);
                        let pos = Self::position_of(&self.comparator, &state.sorted, &v, t);
                        state.sorted.insert(pos, (v, t));
                    } else if was_visible && !is_visible {
                        if let Some(t) = state.value_tags.remove(&v) {
                            if let Some(idx) =
                                state.sorted.iter().position(|(_, et)| *et == t)
                            {
                                state.sorted.remove(idx);
                            }
                        }
                    }
                }
            }
            self.recompute_key(&k, &mut out);
        }

        if !out.is_empty() {
            edge::broadcast(&self.output, out);
        }
    }
}

impl<K: Value, V: Value> Stream<(K, V)> {
    /// Maintains an ordered window `[offset, offset+limit)` per key,
    /// emitting minimal `moveIn`/`moveOut` deltas (`+1`/`-1`) on `(value,
    /// fractional_index)` pairs as the window changes. Sorting a key's
    /// emitted rows by their fractional index reproduces the order
    /// `comparator` defines; no row is emitted for a value whose sorted
    /// position and window membership are both unchanged by a batch.
    pub fn topk<C>(&self, comparator: C, options: TopKOptions) -> Result<Stream<(K, (V, String))>>
    where
        C: Fn(&V, &V) -> Ordering + 'static,
    {
        let output: Tap<(K, (V, String))> = self.new_output_tap();
        self.graph.register_node(Box::new(TopKNode {
            input: self.subscribe(),
            output: output.clone(),
            counts: Index::new(),
            states: HashMap::new(),
            comparator,
            options,
        }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }
}
