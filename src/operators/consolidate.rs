//! Collapses a batch's multiplicities to one entry per value, dropping zeros.

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::value::Value;

struct ConsolidateNode<V> {
    input: Edge<V>,
    output: Tap<V>,
}

impl<V: Value> OpNode for ConsolidateNode<V> {
    fn run_once(&mut self) {
        let mut combined = crate::multiset::MultiSet::new();
        for batch in drain_all(&self.input) {
            combined.extend(batch);
        }
        combined.consolidate();
        if !combined.is_empty() {
            edge::broadcast(&self.output, combined);
        }
    }
}

impl<V: Value> Stream<V> {
    /// Sums multiplicities of equal values within the current pass and
    /// drops values that net to zero, emitting a single consolidated batch.
    pub fn consolidate(&self) -> Result<Stream<V>> {
        let output: Tap<V> = self.new_output_tap();
        self.graph.register_node(Box::new(ConsolidateNode { input: self.subscribe(), output: output.clone() }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }
}
