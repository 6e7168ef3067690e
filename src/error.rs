//! Errors surfaced while building or configuring a graph.
//!
//! The kernel never fails mid-`run()` on well-formed input (see the crate's
//! top-level documentation); every variant here is raised at build time, by
//! a builder method, before the offending call's effects are observed.

use thiserror::Error;

/// Failures a graph builder call can return.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum KernelError {
    /// Two streams passed to the same operator (e.g. `concat`, `join`)
    /// originate from different [`crate::graph::Graph`] instances.
    #[error("streams belong to different graphs")]
    GraphMismatch,

    /// A build-time operation was attempted on a graph in the wrong phase:
    /// adding an operator after [`crate::graph::Graph::finalize`], or
    /// calling [`crate::graph::Graph::run`] before it.
    #[error("structural error: {0}")]
    StructuralError(&'static str),

    /// An operator option was outside its valid domain, e.g. a `topk`
    /// window with a negative limit.
    #[error("invalid configuration: {0}")]
    ConfigurationError(&'static str),

    /// An internal invariant was violated. Recovery is undefined; this
    /// indicates a bug in the kernel rather than misuse by a caller.
    #[error("internal invariant violated: {0}")]
    AssertionViolation(&'static str),
}

/// Convenience alias for builder results.
pub type Result<T> = std::result::Result<T, KernelError>;
