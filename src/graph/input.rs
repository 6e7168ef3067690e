//! Source endpoints: external producers push batches in here.

use crate::graph::edge::{self, Tap};
use crate::multiset::MultiSet;
use crate::value::Value;

/// A handle producers use to push batches into a graph.
///
/// Created by [`crate::graph::Graph::input`]. Sending data is legal at any
/// time after the input is created, including before [`crate::graph::Graph::finalize`];
/// batches simply accumulate on every subscribed consumer's queue until the
/// next [`crate::graph::Graph::run`].
pub struct Input<V> {
    pub(crate) tap: Tap<V>,
}

impl<V: Value> Input<V> {
    /// Pushes one batch to every operator built on this input's stream. A
    /// no-op for an empty multiset.
    pub fn send_data(&self, data: MultiSet<V>) {
        if !data.is_empty() {
            edge::broadcast(&self.tap, data);
        }
    }
}
