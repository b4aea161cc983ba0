//! Device-loss recovery
//!
//! When the GPU context is lost and later restored, every component owning
//! GPU objects must drop its dead handles and rebuild them against the new
//! context. The coordinator runs that protocol in two phases (invalidate
//! everything, then reinitialize in priority order), tolerating per-owner
//! failure so partial recovery beats total failure.

pub mod coordinator;
pub mod events;

pub use coordinator::*;
pub use events::*;
