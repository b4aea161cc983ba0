//! Polyframe - frame execution and GPU resource lifecycle runtime
//!
//! The scheduling core of a real-time visualizer for high-dimensional
//! geometry. Rendering itself (what passes draw, how geometry is generated,
//! shader text) lives in out-of-scope collaborators; this crate owns how
//! passes, resources, and device-loss recovery are ordered and sequenced:
//!
//! - **Frame graph** ([`frame_graph`]): passes declare resource reads and
//!   writes; `compile()` derives a deterministic execution order, flags
//!   resources needing double-buffering, and plans lazy allocation.
//! - **External resource registry** ([`external`]): snapshots externally
//!   owned mutable state once per frame so every pass observes one value.
//! - **Temporal resources** ([`temporal`]): generic N-frame ring buffers
//!   with explicit history-validity tracking.
//! - **Recovery** ([`recovery`]): two-phase, priority-ordered rebuild of
//!   GPU resource owners after device loss, tolerating per-owner failure.
//! - **Context state** ([`context`]): loss/restore state machine with an
//!   exponential-backoff retry budget.
//!
//! # Frame protocol
//!
//! Per displayed frame, in order: [`ExternalResourceRegistry::capture_all`]
//! → execute the compiled pass sequence → advance temporal resources and
//! the registry. All of it is synchronous and single-threaded; the only
//! suspension point in the crate is recovery's sequential reinitialization.
//!
//! Construct one set of these structures per rendering surface; nothing
//! here is a process-wide singleton.

pub mod context;
pub mod external;
pub mod frame_graph;
pub mod recovery;
pub mod temporal;

pub use context::{ContextState, ContextStatus, DeadlinePoll, RetryPolicy};
pub use external::ExternalResourceRegistry;
pub use frame_graph::{
    AccessMode, CompiledGraph, ExecuteError, FrameGraph, GraphError, GraphExecutor,
    PassExecuteContext, PassSetupContext, RenderPass, ResourceDesc, ResourceHandle, ResourceKind,
    ResourceSize,
};
pub use recovery::{
    ListenerId, RecoveryCoordinator, RecoveryError, RecoveryEvent, RecoveryManager,
    RecoveryReport, ReinitFuture,
};
pub use temporal::TemporalResource;
