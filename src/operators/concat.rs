//! Forwarding union of two streams from the same graph.

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::value::Value;

struct ConcatNode<V> {
    left: Edge<V>,
    right: Edge<V>,
    output: Tap<V>,
}

impl<V: Value> OpNode for ConcatNode<V> {
    fn run_once(&mut self) {
        for batch in drain_all(&self.left) {
            if !batch.is_empty() {
                edge::broadcast(&self.output, batch);
            }
        }
        for batch in drain_all(&self.right) {
            if !batch.is_empty() {
                edge::broadcast(&self.output, batch);
            }
        }
    }
}

impl<V: Value> Stream<V> {
    /// Forwards every message from either stream unchanged; cross-stream
    /// ordering is not preserved (consolidate downstream if that matters).
    ///
    /// Fails with [`crate::error::KernelError::GraphMismatch`] if `other`
    /// belongs to a different graph.
    pub fn concat(&self, other: &Stream<V>) -> Result<Stream<V>> {
        self.graph.require_same_graph(&other.graph)?;
        let output: Tap<V> = self.new_output_tap();
        self.graph.register_node(Box::new(ConcatNode {
            left: self.subscribe(),
            right: other.subscribe(),
            output: output.clone(),
        }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }
}
