//! Emits each distinct value once regardless of positive multiplicity.

use std::collections::HashMap;

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::multiset::{Multiplicity, MultiSet};
use crate::value::Value;

struct DistinctNode<V> {
    input: Edge<V>,
    output: Tap<V>,
    counts: HashMap<V, Multiplicity>,
}

impl<V: Value> OpNode for DistinctNode<V> {
    fn run_once(&mut self) {
        let mut deltas: HashMap<V, Multiplicity> = HashMap::new();
        for batch in drain_all(&self.input) {
            for (v, m) in batch.into_inner() {
                *deltas.entry(v).or_insert(0) += m;
            }
        }
        if deltas.is_empty() {
            return;
        }

        let mut out = MultiSet::new();
        for (v, delta) in deltas {
            if delta == 0 {
                continue;
            }
            let old_total = self.counts.get(&v).copied().unwrap_or(0);
            let new_total = old_total + delta;
            let was_visible = old_total > 0;
            let is_visible = new_total > 0;
            if new_total == 0 {
                self.counts.remove(&v);
            } else {
                self.counts.insert(v.clone(), new_total);
            }
            match (was_visible, is_visible) {
                (false, true) => out.push(v, 1),
                (true, false) => out.push(v, -1),
                _ => {}
            }
        }
        if !out.is_empty() {
            edge::broadcast(&self.output, out);
        }
    }
}

impl<V: Value> Stream<V> {
    /// Emits each value with multiplicity `+1` exactly once while its
    /// accumulated input multiplicity is positive, and `-1` the moment that
    /// accumulated multiplicity stops being positive.
    pub fn distinct(&self) -> Result<Stream<V>> {
        let output: Tap<V> = self.new_output_tap();
        self.graph.register_node(Box::new(DistinctNode {
            input: self.subscribe(),
            output: output.clone(),
            counts: HashMap::new(),
        }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }
}
