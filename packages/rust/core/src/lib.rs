//! Run orchestration for docweave.
//!
//! This crate ties discovery, transformation, chunking, graph building,
//! indexing, and validation into one run (see [`pipeline::run`]) and writes
//! the results to the output directory.

pub mod assembler;
pub mod identity;
pub mod pipeline;

pub use identity::assign_identities;
pub use pipeline::{ProgressReporter, RunConfig, RunSummary, SilentProgress, run};
