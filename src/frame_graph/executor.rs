//! Frame graph executor

use crate::frame_graph::graph::*;
use crate::frame_graph::pass::*;
use crate::frame_graph::resource::*;
use std::collections::HashMap;
use thiserror::Error;

/// Executor error type
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("Compiled graph is stale; the graph changed after compile()")]
    StaleGraph,
}

/// Executes a compiled pass sequence against caller-allocated resources.
///
/// The executor owns no GPU objects; callers hand it opaque handles keyed
/// by resource name. Resources flagged for ping-pong get a handle pair and
/// the executor alternates the write side by frame parity.
pub struct GraphExecutor {
    handles: HashMap<String, ResourceHandle>,
    ping_pong: HashMap<String, [ResourceHandle; 2]>,
}

impl GraphExecutor {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
            ping_pong: HashMap::new(),
        }
    }

    /// Bind a single physical handle to a resource name.
    pub fn set_handle(&mut self, resource: impl Into<String>, handle: ResourceHandle) {
        self.handles.insert(resource.into(), handle);
    }

    /// Bind a double-buffer pair to a ping-pong resource name.
    pub fn set_ping_pong(&mut self, resource: impl Into<String>, pair: [ResourceHandle; 2]) {
        self.ping_pong.insert(resource.into(), pair);
    }

    /// Drop all handle bindings (device loss: the objects are gone).
    pub fn clear_handles(&mut self) {
        self.handles.clear();
        self.ping_pong.clear();
    }

    /// Execute the compiled pass sequence for one frame.
    ///
    /// Refuses to run a plan compiled from an older graph revision.
    pub fn execute(
        &mut self,
        graph: &mut FrameGraph,
        compiled: &CompiledGraph,
        frame_index: u64,
        width: u32,
        height: u32,
    ) -> Result<(), ExecuteError> {
        if !graph.is_current(compiled) {
            return Err(ExecuteError::StaleGraph);
        }

        for name in &compiled.pass_order {
            let Some(pass) = graph.pass_mut(name) else {
                log::debug!("compiled pass '{name}' no longer in graph, skipping");
                continue;
            };
            let mut ctx = PassExecuteContext {
                frame_index,
                width,
                height,
                handles: &self.handles,
                ping_pong: &self.ping_pong,
            };
            pass.execute(&mut ctx);
        }

        Ok(())
    }
}

impl Default for GraphExecutor {
    fn default() -> Self {
        Self::new()
    }
}
