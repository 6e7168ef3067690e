//! Graph lifecycle and stateless operator behavior.

use std::cell::RefCell;
use std::rc::Rc;

use diffkernel::error::KernelError;
use diffkernel::graph::Graph;
use diffkernel::multiset::MultiSet;

fn collector<V: Clone + 'static>() -> (Rc<RefCell<Vec<(V, i64)>>>, impl FnMut(&MultiSet<V>)) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen2 = seen.clone();
    (seen, move |batch: &MultiSet<V>| seen2.borrow_mut().extend(batch.iter().cloned()))
}

#[test]
fn test_map_filter_negate_chain() {
    let graph = Graph::new();
    let (input, numbers) = graph.input::<i32>().unwrap();
    let doubled = numbers.map(|n| n * 2).unwrap();
    let big = doubled.filter(|n| *n > 5).unwrap();
    let negated = big.negate().unwrap();

    let (seen, cb) = collector();
    negated.output(cb).unwrap();
    graph.finalize();

    input.send_data(MultiSet::from_iter([(1, 1), (3, 1), (5, 1)]));
    graph.run().unwrap();

    let mut got = seen.borrow().clone();
    got.sort();
    // 1*2=2 (filtered out), 3*2=6 (kept, negated to -1), 5*2=10 (kept, negated to -1)
    assert_eq!(got, vec![(6, -1), (10, -1)]);
}

#[test]
fn test_concat_forwards_both_sides() {
    let graph = Graph::new();
    let (input_a, a) = graph.input::<i32>().unwrap();
    let (input_b, b) = graph.input::<i32>().unwrap();
    let combined = a.concat(&b).unwrap().consolidate().unwrap();

    let (seen, cb) = collector();
    combined.output(cb).unwrap();
    graph.finalize();

    input_a.send_data(MultiSet::from_iter([(1, 1)]));
    input_b.send_data(MultiSet::from_iter([(1, 1), (2, 1)]));
    graph.run().unwrap();

    let mut got = seen.borrow().clone();
    got.sort();
    assert_eq!(got, vec![(1, 2), (2, 1)]);
}

#[test]
fn test_concat_rejects_different_graphs() {
    let graph_a = Graph::new();
    let graph_b = Graph::new();
    let (_input_a, a) = graph_a.input::<i32>().unwrap();
    let (_input_b, b) = graph_b.input::<i32>().unwrap();
    let err = a.concat(&b).unwrap_err();
    assert_eq!(err, KernelError::GraphMismatch);
}

#[test]
fn test_run_before_finalize_is_structural_error() {
    let graph = Graph::new();
    let err = graph.run().unwrap_err();
    assert_eq!(err, KernelError::StructuralError("run() called before finalize()"));
}

#[test]
fn test_adding_operator_after_finalize_is_structural_error() {
    let graph = Graph::new();
    let (_input, numbers) = graph.input::<i32>().unwrap();
    graph.finalize();
    let err = numbers.map(|n| n + 1).unwrap_err();
    assert_eq!(err, KernelError::StructuralError("graph is already finalized"));
}

#[test]
fn test_idempotence_of_run() {
    let graph = Graph::new();
    let (input, numbers) = graph.input::<i32>().unwrap();
    let (seen, cb) = collector();
    numbers.output(cb).unwrap();
    graph.finalize();

    input.send_data(MultiSet::from_iter([(1, 1)]));
    graph.run().unwrap();
    assert_eq!(seen.borrow().len(), 1);

    graph.run().unwrap();
    assert_eq!(seen.borrow().len(), 1, "a second run() with no new data must emit nothing");
}
