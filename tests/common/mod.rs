//! Shared test utilities for logbridge integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Every harness sink writes into a [`MemoryLogger`] so
//! emitted records can be inspected synchronously.
//!
//! [`MemoryLogger`]: logbridge::backends::MemoryLogger

pub mod assertions;
pub mod builders;

pub use assertions::*;
pub use builders::*;
