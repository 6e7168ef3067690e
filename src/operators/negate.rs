//! Multiplicity negation, used to build retraction streams.

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::value::Value;

struct NegateNode<V> {
    input: Edge<V>,
    output: Tap<V>,
}

impl<V: Value> OpNode for NegateNode<V> {
    fn run_once(&mut self) {
        for batch in drain_all(&self.input) {
            let negated = batch.negate();
            if !negated.is_empty() {
                edge::broadcast(&self.output, negated);
            }
        }
    }
}

impl<V: Value> Stream<V> {
    /// Flips every multiplicity in sign.
    pub fn negate(&self) -> Result<Stream<V>> {
        let output: Tap<V> = self.new_output_tap();
        self.graph.register_node(Box::new(NegateNode { input: self.subscribe(), output: output.clone() }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }
}
