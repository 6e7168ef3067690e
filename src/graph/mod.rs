//! The dataflow graph: operator nodes connected by buffered edges, scheduled
//! synchronously to quiescence.

pub(crate) mod edge;
mod input;
mod output;

pub use input::Input;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, debug_span};

use crate::error::{KernelError, Result};
use crate::graph::edge::{self, Edge, Tap};
use crate::multiset::MultiSet;
use crate::value::Value;

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

/// A scheduled unit of work: one operator's queued-input-to-queued-output
/// transformation.
///
/// Registration order is topological by construction (the builder API can
/// only attach a downstream operator to a [`Stream`] handle that already
/// exists), so a single linear pass over registered nodes per [`Graph::run`]
/// call is sufficient to drain the whole graph; see the crate's design
/// notes for why no fixpoint loop is needed here.
pub(crate) trait OpNode {
    fn run_once(&mut self);
}

struct GraphInner {
    id: u64,
    finalized: bool,
    nodes: Vec<Box<dyn OpNode>>,
}

/// A dataflow graph.
///
/// Cheap to clone: clones share the same underlying graph (it is a
/// reference-counted handle), matching the single-threaded, cooperative
/// scheduling model described in the crate's top-level documentation.
#[derive(Clone)]
pub struct Graph(Rc<RefCell<GraphInner>>);

impl Graph {
    /// Creates a new, empty graph.
    pub fn new() -> Self {
        let id = NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed);
        Graph(Rc::new(RefCell::new(GraphInner { id, finalized: false, nodes: Vec::new() })))
    }

    pub(crate) fn id(&self) -> u64 {
        self.0.borrow().id
    }

    pub(crate) fn require_same_graph(&self, other: &Graph) -> Result<()> {
        if self.id() == other.id() {
            Ok(())
        } else {
            Err(KernelError::GraphMismatch)
        }
    }

    /// Creates a new input of element type `V`, returning the producer
    /// handle and the stream of what it produces.
    pub fn input<V: Value>(&self) -> Result<(Input<V>, Stream<V>)> {
        self.require_not_finalized()?;
        let tap: Tap<V> = edge::new_tap();
        let input = Input { tap: tap.clone() };
        let stream = Stream { graph: self.clone(), tap };
        Ok((input, stream))
    }

    pub(crate) fn require_not_finalized(&self) -> Result<()> {
        if self.0.borrow().finalized {
            Err(KernelError::StructuralError("graph is already finalized"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn register_node(&self, node: Box<dyn OpNode>) -> Result<()> {
        self.require_not_finalized()?;
        self.0.borrow_mut().nodes.push(node);
        Ok(())
    }

    /// Fixes the graph's topology. Idempotent; calling it more than once
    /// has no further effect. No operator or edge may be added afterward.
    pub fn finalize(&self) {
        self.0.borrow_mut().finalized = true;
    }

    /// Drains every operator's pending input to quiescence, in one linear
    /// pass over registration order, firing output callbacks synchronously
    /// along the way.
    ///
    /// Fails with [`KernelError::StructuralError`] if the graph has not
    /// been finalized yet.
    pub fn run(&self) -> Result<()> {
        if !self.0.borrow().finalized {
            return Err(KernelError::StructuralError("run() called before finalize()"));
        }
        let span = debug_span!("graph_run", graph_id = self.id());
        let _enter = span.enter();
        let mut inner = self.0.borrow_mut();
        for node in inner.nodes.iter_mut() {
            node.run_once();
        }
        debug!(node_count = inner.nodes.len(), "run pass complete");
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to the output of whatever operator produced it.
///
/// Cloning a `Stream` is cheap and yields a second handle to the *same*
/// fan-out point: every operator (or output) built from a `Stream`, however
/// many times it is cloned or reused, subscribes its own private queue to
/// that point, so building several downstream operators off one `Stream`
/// delivers every batch to all of them.
pub struct Stream<V> {
    pub(crate) graph: Graph,
    pub(crate) tap: Tap<V>,
}

impl<V> Clone for Stream<V> {
    fn clone(&self) -> Self {
        Stream { graph: self.graph.clone(), tap: self.tap.clone() }
    }
}

impl<V> std::fmt::Debug for Stream<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").field("graph_id", &self.graph.id()).finish_non_exhaustive()
    }
}

impl<V: Value> Stream<V> {
    /// The graph this stream belongs to.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Subscribes a fresh, private consumer edge to this stream's fan-out
    /// point, for use as an operator builder's own input queue.
    pub(crate) fn subscribe(&self) -> Edge<V> {
        edge::subscribe(&self.tap)
    }

    /// Allocates a fresh output fan-out point for a new operator built on
    /// top of this stream.
    pub(crate) fn new_output_tap<O>(&self) -> Tap<O> {
        edge::new_tap()
    }

    /// Attaches a sink: `callback` is invoked once per pending batch during
    /// each [`Graph::run`], synchronously, in the order batches arrived.
    pub fn output<F>(&self, callback: F) -> Result<()>
    where
        F: FnMut(&MultiSet<V>) + 'static,
    {
        self.graph
            .register_node(Box::new(output::OutputNode { input: self.subscribe(), callback: Box::new(callback) }))
    }
}
