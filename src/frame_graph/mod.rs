//! Frame Graph System
//!
//! A declarative system for defining render passes as a directed acyclic
//! graph (DAG). Passes declare which resources they read and write; the
//! compiler derives a deterministic execution order, flags double-buffering
//! hazards, and plans lazy resource allocation.

pub mod executor;
pub mod graph;
pub mod pass;
pub mod resource;

pub use executor::*;
pub use graph::*;
pub use pass::*;
pub use resource::*;
