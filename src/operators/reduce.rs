//! Keyed reduction with minimal delta emission, and the aggregators built
//! on top of it (count, sum, avg, min, max, median, mode).

use std::collections::HashSet;

use crate::error::Result;
use crate::graph::edge::{self, drain_all, Edge, Tap};
use crate::graph::{OpNode, Stream};
use crate::index::Index;
use crate::multiset::{Multiplicity, MultiSet};
use crate::value::{Quotient, Value};

struct ReduceNode<K, V1, V2, F> {
    input: Edge<(K, V1)>,
    output: Tap<(K, V2)>,
    in_index: Index<K, V1>,
    out_index: Index<K, V2>,
    f: F,
}

impl<K, V1, V2, F> OpNode for ReduceNode<K, V1, V2, F>
where
    K: Value,
    V1: Value,
    V2: Value,
    F: FnMut(Vec<(V1, Multiplicity)>) -> Vec<(V2, Multiplicity)>,
{
    fn run_once(&mut self) {
        let mut touched: HashSet<K> = HashSet::new();
        for batch in drain_all(&self.input) {
            for ((k, v), m) in batch.into_inner() {
                self.in_index.add(k.clone(), v, m);
                touched.insert(k);
            }
        }
        if touched.is_empty() {
            return;
        }

        let mut out = MultiSet::new();
        for k in touched {
            let current: Vec<(V1, Multiplicity)> = self.in_index.entries(&k).map(|(v, m)| (v.clone(), m)).collect();
            let new_out = (self.f)(current);
            for (v, delta) in self.out_index.reconcile(&k, new_out) {
                out.push((k.clone(), v), delta);
            }
        }
        if !out.is_empty() {
            edge::broadcast(&self.output, out);
        }
    }
}

impl<K: Value, V1: Value> Stream<(K, V1)> {
    /// Keyed reduction: `f` maps the *current* full per-key input multiset
    /// to the desired output multiset, and only the minimal delta against
    /// what was last emitted is sent downstream. When a key's input
    /// becomes empty its output group disappears entirely (no ghost
    /// zero-count groups).
    pub fn reduce<V2, F>(&self, f: F) -> Result<Stream<(K, V2)>>
    where
        V2: Value,
        F: FnMut(Vec<(V1, Multiplicity)>) -> Vec<(V2, Multiplicity)> + 'static,
    {
        let output: Tap<(K, V2)> = self.new_output_tap();
        self.graph.register_node(Box::new(ReduceNode {
            input: self.subscribe(),
            output: output.clone(),
            in_index: Index::new(),
            out_index: Index::new(),
            f,
        }))?;
        Ok(Stream { graph: self.graph.clone(), tap: output })
    }

    /// Number of rows currently present per key (sum of multiplicities).
    ///
    /// # Examples
    ///
    /// ```
    /// use diffkernel::graph::Graph;
    /// use diffkernel::multiset::MultiSet;
    ///
    /// let graph = Graph::new();
    /// let (input, stream) = graph.input::<(&'static str, i32)>().unwrap();
    /// let counted = stream.count().unwrap();
    /// let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    /// let seen2 = seen.clone();
    /// counted.output(move |b| seen2.borrow_mut().extend(b.iter().cloned())).unwrap();
    /// graph.finalize();
    /// input.send_data(MultiSet::from_iter([(("a", 1), 1), (("a", 2), 1)]));
    /// graph.run().unwrap();
    /// assert_eq!(*seen.borrow(), vec![(("a", 2i64), 1)]);
    /// ```
    pub fn count(&self) -> Result<Stream<(K, i64)>> {
        self.reduce(|entries| {
            if entries.is_empty() {
                return vec![];
            }
            let total: Multiplicity = entries.iter().map(|(_, m)| m).sum();
            vec![(total, 1)]
        })
    }

    /// Sums `project(value) * multiplicity` over the current per-key rows.
    /// Emits nothing once the key has no rows left (see `count`'s
    /// no-ghost-group invariant, which every aggregator here shares).
    pub fn sum<F>(&self, mut project: F) -> Result<Stream<(K, i64)>>
    where
        F: FnMut(&V1) -> i64 + 'static,
    {
        self.reduce(move |entries| {
            if entries.is_empty() {
                return vec![];
            }
            let total: i64 = entries.iter().map(|(v, m)| project(v) * m).sum();
            vec![(total, 1)]
        })
    }

    /// Mean of `project(value)` weighted by multiplicity, as `sum / count`.
    /// Emits nothing while the key has no rows. The quotient is wrapped in
    /// [`Quotient`] (a plain `f64` underneath — see `.0` or `f64::from`)
    /// since the reduce family's per-key output must satisfy [`Value`],
    /// which `f64` itself does not.
    pub fn avg<F>(&self, mut project: F) -> Result<Stream<(K, Quotient)>>
    where
        F: FnMut(&V1) -> f64 + 'static,
    {
        self.reduce(move |entries| {
            let mut sum = 0.0;
            let mut count: Multiplicity = 0;
            for (v, m) in &entries {
                sum += project(v) * (*m as f64);
                count += m;
            }
            if count == 0 {
                vec![]
            } else {
                vec![(Quotient(sum / count as f64), 1)]
            }
        })
    }
}

impl<K: Value, V1: Value + Ord> Stream<(K, V1)> {
    /// Smallest value with positive multiplicity, per key.
    pub fn min(&self) -> Result<Stream<(K, V1)>> {
        self.reduce(|mut entries| {
            entries.retain(|(_, m)| *m > 0);
            match entries.iter().map(|(v, _)| v).min().cloned() {
                Some(v) => vec![(v, 1)],
                None => vec![],
            }
        })
    }

    /// Largest value with positive multiplicity, per key.
    pub fn max(&self) -> Result<Stream<(K, V1)>> {
        self.reduce(|mut entries| {
            entries.retain(|(_, m)| *m > 0);
            match entries.iter().map(|(v, _)| v).max().cloned() {
                Some(v) => vec![(v, 1)],
                None => vec![],
            }
        })
    }

    /// Middle value by natural order, per key; the mean of the two middle
    /// values when the (multiplicity-expanded) count is even. Multiplicities
    /// greater than one repeat the value that many times in the ordering.
    /// See [`avg`](Self::avg) for why the result is a [`Quotient`] rather
    /// than a bare `f64`.
    pub fn median(&self) -> Result<Stream<(K, Quotient)>>
    where
        V1: Into<f64>,
    {
        self.reduce(|entries| {
            let mut expanded: Vec<f64> = Vec::new();
            for (v, m) in entries {
                if m > 0 {
                    let value: f64 = v.into();
                    for _ in 0..m {
                        expanded.push(value);
                    }
                }
            }
            if expanded.is_empty() {
                return vec![];
            }
            expanded.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let n = expanded.len();
            let median = if n % 2 == 1 {
                expanded[n / 2]
            } else {
                (expanded[n / 2 - 1] + expanded[n / 2]) / 2.0
            };
            vec![(Quotient(median), 1)]
        })
    }

    /// Value with the greatest multiplicity, per key; ties broken by
    /// first-encountered order.
    pub fn mode(&self) -> Result<Stream<(K, V1)>> {
        self.reduce(|entries| {
            // `entries` is already in first-insertion order (see `Index`);
            // keep the first value seen at the current-best multiplicity
            // rather than `Iterator::max_by_key`, which prefers the last.
            let mut best: Option<(V1, Multiplicity)> = None;
            for (v, m) in entries {
                match &best {
                    Some((_, best_m)) if m <= *best_m => {}
                    _ => best = Some((v, m)),
                }
            }
            best.map(|(v, _)| vec![(v, 1)]).unwrap_or_default()
        })
    }
}
