//! Operators: methods attached directly to [`crate::graph::Stream`], the
//! same "extension trait on a stream handle" shape the upstream dataflow
//! engine uses, collapsed here to inherent `impl` blocks since this kernel
//! has only one stream type to extend.

mod concat;
mod consolidate;
mod distinct;
mod filter;
mod join;
mod map;
mod negate;
mod reduce;
mod topk;

pub use topk::TopKOptions;
