//! Sink endpoints: a callback fires once per pending batch during `run()`.

use crate::graph::edge::{drain_all, Edge};
use crate::graph::OpNode;
use crate::multiset::MultiSet;

pub(crate) struct OutputNode<V> {
    pub(crate) input: Edge<V>,
    pub(crate) callback: Box<dyn FnMut(&MultiSet<V>)>,
}

impl<V> OpNode for OutputNode<V> {
    fn run_once(&mut self) {
        for batch in drain_all(&self.input) {
            (self.callback)(&batch);
        }
    }
}
