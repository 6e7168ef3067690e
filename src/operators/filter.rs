//! Stateless predicate filtering.

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::multiset::MultiSet;
use crate::value::Value;

struct FilterNode<V, F> {
    input: Edge<V>,
    output: Tap<V>,
    predicate: F,
}

impl<V: Value, F: FnMut(&V) -> bool> OpNode for FilterNode<V, F> {
    fn run_once(&mut self) {
        for batch in drain_all(&self.input) {
            let filtered =
                MultiSet::from_iter(batch.into_inner().into_iter().filter(|(v, _)| (self.predicate)(v)));
            if !filtered.is_empty() {
                edge::broadcast(&self.output, filtered);
            }
        }
    }
}

impl<V: Value> Stream<V> {
    /// Keeps only values for which `predicate` returns `true`, preserving
    /// their multiplicities.
    pub fn filter<F>(&self, predicate: F) -> Result<Stream<V>>
    where
        F: FnMut(&V) -> bool + 'static,
    {
        let output: Tap<V> = self.new_output_tap();
        self.graph.register_node(Box::new(FilterNode { input: self.subscribe(), output: output.clone(), predicate }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }
}
