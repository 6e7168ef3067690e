//! TopK: S2 (ordered window insertion), the stability invariant, and
//! fractional-index monotonicity.

use std::cell::RefCell;
use std::rc::Rc;

use diffkernel::graph::Graph;
use diffkernel::multiset::MultiSet;
use diffkernel::TopKOptions;

fn collector<V: Clone + 'static>() -> (Rc<RefCell<Vec<(V, i64)>>>, impl FnMut(&MultiSet<V>)) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen2 = seen.clone();
    (seen, move |batch: &MultiSet<V>| seen2.borrow_mut().extend(batch.iter().cloned()))
}

fn natural_order(a: &&'static str, b: &&'static str) -> std::cmp::Ordering {
    a.cmp(b)
}

/// S2 — initial window, then a single insertion evicts exactly one element
/// and leaves the rest untouched.
#[test]
fn test_topk_insertion_evicts_exactly_one() {
    let graph = Graph::new();
    let (input, rows) = graph.input::<(&'static str, &'static str)>().unwrap();
    let windowed = rows.topk(natural_order, TopKOptions { offset: 0, limit: Some(3) }).unwrap();

    let (seen, cb) = collector();
    windowed.output(cb).unwrap();
    graph.finalize();

    input.send_data(MultiSet::from_iter([
        (("k", "c"), 1),
        (("k", "a"), 1),
        (("k", "b"), 1),
    ]));
    graph.run().unwrap();

    let initial: Vec<_> = seen.borrow().clone();
    assert_eq!(initial.len(), 3, "three initial inserts into an empty window");
    let mut initial_values: Vec<&str> =
        initial.iter().map(|((_, (v, _)), m)| { assert_eq!(*m, 1); *v }).collect();
    initial_values.sort();
    assert_eq!(initial_values, vec!["a", "b", "c"]);

    // Indices must sort in the same order as the values themselves.
    let mut by_index = initial.clone();
    by_index.sort_by(|((_, (_, ix1)), _), ((_, (_, ix2)), _)| ix1.cmp(ix2));
    let ordered_values: Vec<&str> = by_index.iter().map(|((_, (v, _)), _)| *v).collect();
    assert_eq!(ordered_values, vec!["a", "b", "c"]);

    seen.borrow_mut().clear();
    input.send_data(MultiSet::from_iter([(("k", "aa"), 1)]));
    graph.run().unwrap();

    let after: Vec<_> = seen.borrow().clone();
    assert_eq!(after.len(), 2, "inserting one new in-window element moves exactly one in and one out");
    let moved_in: Vec<_> = after.iter().filter(|(_, m)| *m == 1).collect();
    let moved_out: Vec<_> = after.iter().filter(|(_, m)| *m == -1).collect();
    assert_eq!(moved_in.len(), 1);
    assert_eq!(moved_out.len(), 1);
    assert_eq!(moved_in[0].0 .1 .0, "aa");
    assert_eq!(moved_out[0].0 .1 .0, "c", "the largest element in a 3-window must be the one evicted");
}

/// Invariant 6 — no emission for an element whose position and window
/// membership are unchanged by a batch.
#[test]
fn test_topk_stability_no_emission_for_untouched_element() {
    let graph = Graph::new();
    let (input, rows) = graph.input::<(&'static str, i32)>().unwrap();
    let windowed = rows.topk(|a: &i32, b: &i32| a.cmp(b), TopKOptions { offset: 0, limit: Some(2) }).unwrap();

    let (seen, cb) = collector();
    windowed.output(cb).unwrap();
    graph.finalize();

    input.send_data(MultiSet::from_iter([(("k", 1), 1), (("k", 2), 1), (("k", 100), 1)]));
    graph.run().unwrap();
    seen.borrow_mut().clear();

    // 100 is outside the window [0,2); removing it should not touch 1 or 2.
    input.send_data(MultiSet::from_iter([(("k", 100), -1)]));
    graph.run().unwrap();

    assert_eq!(seen.borrow().len(), 0, "removing an out-of-window element must not move window members");
}

/// Per-key windows are independent: a move in one key's window must not
/// emit anything for another key's window.
#[test]
fn test_topk_keys_are_independent() {
    let graph = Graph::new();
    let (input, rows) = graph.input::<(&'static str, &'static str)>().unwrap();
    let windowed = rows.topk(natural_order, TopKOptions { offset: 0, limit: Some(2) }).unwrap();

    let (seen, cb) = collector();
    windowed.output(cb).unwrap();
    graph.finalize();

    input.send_data(MultiSet::from_iter([
        (("k1", "a"), 1),
        (("k1", "b"), 1),
        (("k2", "x"), 1),
        (("k2", "y"), 1),
    ]));
    graph.run().unwrap();
    seen.borrow_mut().clear();

    input.send_data(MultiSet::from_iter([(("k1", "aa"), 1)]));
    graph.run().unwrap();

    let touched_keys: Vec<&str> = seen.borrow().iter().map(|((k, _), _)| *k).collect();
    assert!(touched_keys.iter().all(|k| *k == "k1"), "a k1-only insert must not emit anything for k2");
    assert!(!touched_keys.is_empty());
}

/// Unbounded window (no `limit`) still reports every visible element, in order.
#[test]
fn test_topk_unbounded_window() {
    let graph = Graph::new();
    let (input, rows) = graph.input::<(&'static str, i32)>().unwrap();
    let windowed = rows.topk(|a: &i32, b: &i32| a.cmp(b), TopKOptions::default()).unwrap();

    let (seen, cb) = collector();
    windowed.output(cb).unwrap();
    graph.finalize();

    input.send_data(MultiSet::from_iter([(("k", 3), 1), (("k", 1), 1), (("k", 2), 1)]));
    graph.run().unwrap();

    let mut got = seen.borrow().clone();
    got.sort_by(|((_, (_, ix1)), _), ((_, (_, ix2)), _)| ix1.cmp(ix2));
    let values: Vec<i32> = got.iter().map(|((_, (v, _)), _)| *v).collect();
    assert_eq!(values, vec![1, 2, 3]);
}
