//! A synchronous, single-threaded incremental view maintenance kernel.
//!
//! Collections are represented as [`multiset::MultiSet`]s: sequences of
//! `(value, signed multiplicity)` pairs. A [`graph::Graph`] wires together
//! [`graph::Input`]s, operators ([`graph::Stream::map`], [`graph::Stream::filter`],
//! [`graph::Stream::reduce`], [`graph::Stream::inner_join`], [`graph::Stream::topk`],
//! and friends), and output callbacks; [`graph::Graph::run`] drains every
//! pending batch to quiescence, invoking output callbacks synchronously
//! along the way.
//!
//! There is no distributed coordination, no timestamps, and no persistence
//! here — a graph is a plain in-process value, and advancing it is just a
//! function call. See the crate's design notes for the reasoning behind
//! that scope.
//!
//! # Examples
//!
//! ```
//! use diffkernel::graph::Graph;
//! use diffkernel::multiset::MultiSet;
//!
//! let graph = Graph::new();
//! let (input, numbers) = graph.input::<i32>().unwrap();
//! let evens = numbers.filter(|n| n % 2 == 0).unwrap();
//!
//! let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
//! let seen2 = seen.clone();
//! evens.output(move |batch| seen2.borrow_mut().extend(batch.iter().cloned())).unwrap();
//!
//! graph.finalize();
//! input.send_data(MultiSet::from_iter([(1, 1), (2, 1), (3, 1), (4, 1)]));
//! graph.run().unwrap();
//!
//! let mut got = seen.borrow().clone();
//! got.sort();
//! assert_eq!(got, vec![(2, 1), (4, 1)]);
//! ```

pub mod error;
pub mod fractional;
pub mod graph;
pub mod index;
pub mod multiset;
mod operators;
pub mod value;

pub use error::{KernelError, Result};
pub use graph::{Graph, Input, Stream};
pub use multiset::MultiSet;
pub use operators::TopKOptions;
