//! Keyed join: inner, left, right, full and anti variants.
//!
//! Rather than hand-maintaining the classical incremental bilinear join
//! formula (`ΔA ⋈ B_before ∪ A_after ⋈ ΔB`) independently for five join
//! kinds, every variant here recomputes the affected keys' full join rows
//! from the post-batch `indexA`/`indexB` state and diffs against what was
//! last emitted, using the same [`Index::reconcile`] primitive `reduce`
//! uses. It is simpler to get right and, because the indices already hold
//! the complete per-key state, exactly equivalent in the rows it produces.

use std::collections::HashSet;

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::index::Index;
use crate::multiset::{Multiplicity, MultiSet};
use crate::value::Value;

struct JoinNode<K, V1, V2, Row, B> {
    input_a: Edge<(K, V1)>,
    input_b: Edge<(K, V2)>,
    index_a: Index<K, V1>,
    index_b: Index<K, V2>,
    out_index: Index<K, Row>,
    output: Tap<(K, Row)>,
    build_rows: B,
}

impl<K, V1, V2, Row, B> OpNode for JoinNode<K, V1, V2, Row, B>
where
    K: Value,
    V1: Value,
    V2: Value,
    Row: Value,
    B: Fn(&Index<K, V1>, &Index<K, V2>, &K) -> Vec<(Row, Multiplicity)>,
{
    fn run_once(&mut self) {
        let mut touched: HashSet<K> = HashSet::new();
        for batch in drain_all(&self.input_a) {
            for ((k, v), m) in batch.into_inner() {
                self.index_a.add(k.clone(), v, m);
                touched.insert(k);
            }
        }
        for batch in drain_all(&self.input_b) {
            for ((k, v), m) in batch.into_inner() {
                self.index_b.add(k.clone(), v, m);
                touched.insert(k);
            }
        }
        if touched.is_empty() {
            return;
        }

        let mut out = MultiSet::new();
        for k in touched {
            let rows = (self.build_rows)(&self.index_a, &self.index_b, &k);
            for (row, delta) in self.out_index.reconcile(&k, rows) {
                out.push((k.clone(), row), delta);
            }
        }
        if !out.is_empty() {
            edge::broadcast(&self.output, out);
        }
    }
}

fn build_join<K, V1, V2, Row, B>(
    a: &Stream<(K, V1)>,
    b: &Stream<(K, V2)>,
    build_rows: B,
) -> Result<Stream<(K, Row)>>
where
    K: Value,
    V1: Value,
    V2: Value,
    Row: Value,
    B: Fn(&Index<K, V1>, &Index<K, V2>, &K) -> Vec<(Row, Multiplicity)> + 'static,
{
    a.graph.require_same_graph(&b.graph)?;
    let output: Tap<(K, Row)> = a.new_output_tap();
    a.graph.register_node(Box::new(JoinNode {
        input_a: a.subscribe(),
        input_b: b.subscribe(),
        index_a: Index::new(),
        index_b: Index::new(),
        out_index: Index::new(),
        output: output.clone(),
        build_rows,
    }))?;
    Ok(Stream { graph: a.graph.clone(), tap: output })
}

impl<K: Value, V1: Value> Stream<(K, V1)> {
    /// Emits `(k, (v1, v2))` for every pair sharing a key on both sides.
    /// `inner_join(a, b)` and `inner_join(b, a)` agree modulo tuple order.
    ///
    /// # Examples
    ///
    /// ```
    /// use diffkernel::graph::Graph;
    /// use diffkernel::multiset::MultiSet;
    ///
    /// let graph = Graph::new();
    /// let (input_a, a) = graph.input::<(i32, &'static str)>().unwrap();
    /// let (input_b, b) = graph.input::<(i32, &'static str)>().unwrap();
    /// let joined = a.inner_join(&b).unwrap();
    /// let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    /// let seen2 = seen.clone();
    /// joined.output(move |m| seen2.borrow_mut().extend(m.iter().cloned())).unwrap();
    /// graph.finalize();
    /// input_a.send_data(MultiSet::from_iter([((1, "A"), 1), ((2, "B"), 1)]));
    /// input_b.send_data(MultiSet::from_iter([((2, "X"), 1), ((3, "Y"), 1)]));
    /// graph.run().unwrap();
    /// assert_eq!(*seen.borrow(), vec![((2, ("B", "X")), 1)]);
    /// ```
    pub fn inner_join<V2: Value>(&self, other: &Stream<(K, V2)>) -> Result<Stream<(K, (V1, V2))>> {
        build_join(self, other, |a, b, k| {
            let mut rows = Vec::new();
            for (v1, m1) in a.entries(k) {
                for (v2, m2) in b.entries(k) {
                    rows.push(((v1.clone(), v2.clone()), m1 * m2));
                }
            }
            rows
        })
    }

    /// Inner-join rows, plus `(v1, None)` for every row on `self` whose key
    /// has no match at all on `other`.
    pub fn left_join<V2: Value>(&self, other: &Stream<(K, V2)>) -> Result<Stream<(K, (V1, Option<V2>))>> {
        build_join(self, other, |a, b, k| {
            let mut rows = Vec::new();
            if b.is_empty_key(k) {
                for (v1, m1) in a.entries(k) {
                    rows.push(((v1.clone(), None), m1));
                }
            } else {
                for (v1, m1) in a.entries(k) {
                    for (v2, m2) in b.entries(k) {
                        rows.push(((v1.clone(), Some(v2.clone())), m1 * m2));
                    }
                }
            }
            rows
        })
    }

    /// Inner-join rows, plus `(None, v2)` for every row on `other` whose key
    /// has no match at all on `self`.
    pub fn right_join<V2: Value>(&self, other: &Stream<(K, V2)>) -> Result<Stream<(K, (Option<V1>, V2))>> {
        build_join(self, other, |a, b, k| {
            let mut rows = Vec::new();
            if a.is_empty_key(k) {
                for (v2, m2) in b.entries(k) {
                    rows.push(((None, v2.clone()), m2));
                }
            } else {
                for (v1, m1) in a.entries(k) {
                    for (v2, m2) in b.entries(k) {
                        rows.push(((Some(v1.clone()), v2.clone()), m1 * m2));
                    }
                }
            }
            rows
        })
    }

    /// Inner-join rows, plus null-padded rows for keys unmatched on either
    /// side. Every key present on either side gets exactly one row shape.
    pub fn full_join<V2: Value>(
        &self,
        other: &Stream<(K, V2)>,
    ) -> Result<Stream<(K, (Option<V1>, Option<V2>))>> {
        build_join(self, other, |a, b, k| {
            let mut rows = Vec::new();
            if a.is_empty_key(k) {
                for (v2, m2) in b.entries(k) {
                    rows.push(((None, Some(v2.clone())), m2));
                }
            } else if b.is_empty_key(k) {
                for (v1, m1) in a.entries(k) {
                    rows.push(((Some(v1.clone()), None), m1));
                }
            } else {
                for (v1, m1) in a.entries(k) {
                    for (v2, m2) in b.entries(k) {
                        rows.push(((Some(v1.clone()), Some(v2.clone())), m1 * m2));
                    }
                }
            }
            rows
        })
    }

    /// Null-padded rows `(v1, None)` from `self` whose key has no match at
    /// all on `other`, matching the row shape `full_join`/`left_join` use
    /// for their unmatched side rather than dropping the B slot entirely.
    pub fn anti_join<V2: Value>(&self, other: &Stream<(K, V2)>) -> Result<Stream<(K, (V1, Option<V2>))>> {
        build_join(self, other, |a, b, k| {
            if b.is_empty_key(k) {
                a.entries(k).map(|(v1, m1)| ((v1.clone(), None), m1)).collect()
            } else {
                Vec::new()
            }
        })
    }
}
