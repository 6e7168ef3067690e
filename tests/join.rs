//! Join: S3 (initial join shapes), S4 (multiple batches before a run), S5
//! (simultaneous delete on both sides), and the inner-join symmetry invariant.

use std::cell::RefCell;
use std::rc::Rc;

use diffkernel::graph::Graph;
use diffkernel::multiset::MultiSet;

fn collector<V: Clone + 'static>() -> (Rc<RefCell<Vec<(V, i64)>>>, impl FnMut(&MultiSet<V>)) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen2 = seen.clone();
    (seen, move |batch: &MultiSet<V>| seen2.borrow_mut().extend(batch.iter().cloned()))
}

fn consolidated<V: Clone + Eq + std::hash::Hash + 'static>(seen: &Rc<RefCell<Vec<(V, i64)>>>) -> Vec<(V, i64)> {
    let mut ms = MultiSet::from_iter(seen.borrow().iter().cloned());
    ms.consolidate();
    ms.into_inner()
}

/// S3 — inner/left/right/full/anti join initial shapes.
#[test]
fn test_join_initial_shapes() {
    let graph = Graph::new();
    let (input_a, a) = graph.input::<(i32, &'static str)>().unwrap();
    let (input_b, b) = graph.input::<(i32, &'static str)>().unwrap();

    let inner = a.inner_join(&b).unwrap();
    let left = a.left_join(&b).unwrap();
    let right = a.right_join(&b).unwrap();
    let full = a.full_join(&b).unwrap();
    let anti = a.anti_join(&b).unwrap();

    let (inner_seen, inner_cb) = collector();
    let (left_seen, left_cb) = collector();
    let (right_seen, right_cb) = collector();
    let (full_seen, full_cb) = collector();
    let (anti_seen, anti_cb) = collector();
    inner.output(inner_cb).unwrap();
    left.output(left_cb).unwrap();
    right.output(right_cb).unwrap();
    full.output(full_cb).unwrap();
    anti.output(anti_cb).unwrap();
    graph.finalize();

    input_a.send_data(MultiSet::from_iter([((1, "A"), 1), ((2, "B"), 1)]));
    input_b.send_data(MultiSet::from_iter([((2, "X"), 1), ((3, "Y"), 1)]));
    graph.run().unwrap();

    assert_eq!(consolidated(&inner_seen), vec![((2, ("B", "X")), 1)]);

    let mut left_got = consolidated(&left_seen);
    left_got.sort();
    let mut left_want = vec![((1, ("A", None)), 1), ((2, ("B", Some("X"))), 1)];
    left_want.sort();
    assert_eq!(left_got, left_want);

    let mut right_got = consolidated(&right_seen);
    right_got.sort();
    let mut right_want = vec![((2, (Some("B"), "X")), 1), ((3, (None, "Y")), 1)];
    right_want.sort();
    assert_eq!(right_got, right_want);

    let mut full_got = consolidated(&full_seen);
    full_got.sort();
    let mut full_want =
        vec![((1, (Some("A"), None)), 1), ((2, (Some("B"), Some("X"))), 1), ((3, (None, Some("Y"))), 1)];
    full_want.sort();
    assert_eq!(full_got, full_want);

    assert_eq!(consolidated(&anti_seen), vec![((1, ("A", None)), 1)]);
}

/// S4 — several batches pushed to one side before a single `run()` must
/// still join against the fully consolidated state, not just one batch.
#[test]
fn test_join_sees_all_batches_before_run() {
    let graph = Graph::new();
    let (input_a, a) = graph.input::<(i32, &'static str)>().unwrap();
    let (input_b, b) = graph.input::<(i32, &'static str)>().unwrap();
    let inner = a.inner_join(&b).unwrap();

    let (seen, cb) = collector();
    inner.output(cb).unwrap();
    graph.finalize();

    input_a.send_data(MultiSet::from_iter([((1, "A1"), 1)]));
    input_a.send_data(MultiSet::from_iter([((1, "A2"), 1)]));
    input_a.send_data(MultiSet::from_iter([((2, "B"), 1)]));
    input_b.send_data(MultiSet::from_iter([((1, "X"), 1)]));
    graph.run().unwrap();

    let mut got = consolidated(&seen);
    got.sort();
    let mut want = vec![((1, ("A1", "X")), 1), ((1, ("A2", "X")), 1)];
    want.sort();
    assert_eq!(got, want);
}

/// S5 — simultaneous delete on both sides of a matched key collapses to a
/// single net retraction once consolidated.
#[test]
fn test_join_simultaneous_delete_both_sides() {
    let graph = Graph::new();
    let (input_a, a) = graph.input::<(i32, &'static str)>().unwrap();
    let (input_b, b) = graph.input::<(i32, &'static str)>().unwrap();
    let inner = a.inner_join(&b).unwrap();

    let (seen, cb) = collector();
    inner.output(cb).unwrap();
    graph.finalize();

    input_a.send_data(MultiSet::from_iter([((1, "A"), 1)]));
    input_b.send_data(MultiSet::from_iter([((1, "X"), 1)]));
    graph.run().unwrap();
    assert_eq!(consolidated(&seen), vec![((1, ("A", "X")), 1)]);

    input_a.send_data(MultiSet::from_iter([((1, "A"), -1)]));
    input_b.send_data(MultiSet::from_iter([((1, "X"), -1)]));
    graph.run().unwrap();

    let got = consolidated(&seen);
    assert_eq!(got, vec![], "steady state after the matched delete must net to nothing");
}

/// Inner join is symmetric modulo tuple swap.
#[test]
fn test_inner_join_symmetry() {
    let graph = Graph::new();
    let (input_a, a) = graph.input::<(i32, &'static str)>().unwrap();
    let (input_b, b) = graph.input::<(i32, &'static str)>().unwrap();
    let ab = a.inner_join(&b).unwrap();
    let ba = b.inner_join(&a).unwrap();

    let (ab_seen, ab_cb) = collector();
    let (ba_seen, ba_cb) = collector();
    ab.output(ab_cb).unwrap();
    ba.output(ba_cb).unwrap();
    graph.finalize();

    input_a.send_data(MultiSet::from_iter([((1, "A"), 1), ((2, "B"), 1)]));
    input_b.send_data(MultiSet::from_iter([((1, "X"), 1)]));
    graph.run().unwrap();

    let ab_got: Vec<(i32, (&str, &str))> = consolidated(&ab_seen).into_iter().map(|(row, _)| row).collect();
    let ba_got: Vec<(i32, (&str, &str))> =
        consolidated(&ba_seen).into_iter().map(|(row, _)| row).collect();
    let ba_swapped: Vec<(i32, (&str, &str))> = ba_got.into_iter().map(|(k, (v2, v1))| (k, (v1, v2))).collect();
    assert_eq!(ab_got, ba_swapped);
}
