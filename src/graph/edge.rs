//! The buffered queues connecting one operator's output to the operators
//! built on top of it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::multiset::MultiSet;

/// A FIFO queue of pending batches feeding exactly one consuming node.
pub(crate) type Edge<V> = Rc<RefCell<VecDeque<MultiSet<V>>>>;

/// A fresh, empty edge.
pub(crate) fn new_edge<V>() -> Edge<V> {
    Rc::new(RefCell::new(VecDeque::new()))
}

/// Drains every pending batch off an edge, leaving it empty.
pub(crate) fn drain_all<V>(edge: &Edge<V>) -> Vec<MultiSet<V>> {
    edge.borrow_mut().drain(..).collect()
}

/// The fan-out point of a single [`crate::graph::Stream`]: every downstream
/// operator built on top of the same stream subscribes its own private
/// [`Edge`] here, so that one consumer draining its queue never starves a
/// sibling consumer built from the same `.map()`/`.filter()`/etc. call on
/// the shared upstream handle.
pub(crate) type Tap<V> = Rc<RefCell<Vec<Edge<V>>>>;

/// A fresh tap with no subscribers yet.
pub(crate) fn new_tap<V>() -> Tap<V> {
    Rc::new(RefCell::new(Vec::new()))
}

/// Registers a fresh, private consumer edge on `tap` and returns it.
pub(crate) fn subscribe<V>(tap: &Tap<V>) -> Edge<V> {
    let edge = new_edge();
    tap.borrow_mut().push(edge.clone());
    edge
}

/// Pushes `batch` onto every subscriber of `tap`, cloning it for all but the
/// last subscriber. A no-op (data is dropped) if nothing has subscribed.
pub(crate) fn broadcast<V: Clone>(tap: &Tap<V>, batch: MultiSet<V>) {
    let subscribers = tap.borrow();
    let count = subscribers.len();
    for (i, edge) in subscribers.iter().enumerate() {
        if i + 1 == count {
            edge.borrow_mut().push_back(batch);
            return;
        }
        edge.borrow_mut().push_back(batch.clone());
    }
}
