//! Stateless value transformation.

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::multiset::MultiSet;
use crate::value::Value;

struct MapNode<V, O, F> {
    input: Edge<V>,
    output: Tap<O>,
    f: F,
}

impl<V: Value, O: Value, F: FnMut(V) -> O> OpNode for MapNode<V, O, F> {
    fn run_once(&mut self) {
        for batch in drain_all(&self.input) {
            let mapped = MultiSet::from_iter(batch.into_inner().into_iter().map(|(v, m)| ((self.f)(v), m)));
            if !mapped.is_empty() {
                edge::broadcast(&self.output, mapped);
            }
        }
    }
}

impl<V: Value> Stream<V> {
    /// Applies `f` to every value, preserving multiplicities.
    ///
    /// # Examples
    ///
    /// ```
    /// use diffkernel::graph::Graph;
    ///
    /// let graph = Graph::new();
    /// let (input, stream) = graph.input::<i32>().unwrap();
    /// let doubled = stream.map(|x| x * 2).unwrap();
    /// let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    /// let seen2 = seen.clone();
    /// doubled.output(move |batch| seen2.borrow_mut().extend(batch.iter().cloned())).unwrap();
    /// graph.finalize();
    /// input.send_data(diffkernel::multiset::MultiSet::from_iter([(3, 1)]));
    /// graph.run().unwrap();
    /// assert_eq!(*seen.borrow(), vec![(6, 1)]);
    /// ```
    pub fn map<O, F>(&self, f: F) -> Result<Stream<O>>
    where
        O: Value,
        F: FnMut(V) -> O + 'static,
    {
        let output: Tap<O> = self.new_output_tap();
        self.graph.register_node(Box::new(MapNode { input: self.subscribe(), output: output.clone(), f }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }
}
