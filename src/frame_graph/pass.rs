//! Render pass declarations for the frame graph

use crate::frame_graph::resource::*;
use std::collections::HashMap;

/// Context for declaring a pass's resource accesses.
///
/// Handed to [`RenderPass::setup`] when the pass is added to the graph.
pub struct PassSetupContext<'a> {
    pub(crate) inputs: &'a mut Vec<ResourceAccess>,
    pub(crate) outputs: &'a mut Vec<ResourceAccess>,
    pub(crate) priority: &'a mut i32,
    pub(crate) screen_width: u32,
    pub(crate) screen_height: u32,
}

impl<'a> PassSetupContext<'a> {
    /// Declare that this pass reads from a resource
    pub fn read(&mut self, resource: impl Into<String>) {
        self.inputs.push(ResourceAccess {
            resource: resource.into(),
            mode: AccessMode::Read,
        });
    }

    /// Declare that this pass writes to a resource
    pub fn write(&mut self, resource: impl Into<String>) {
        self.outputs.push(ResourceAccess {
            resource: resource.into(),
            mode: AccessMode::Write,
        });
    }

    /// Declare that this pass both reads and writes a resource.
    ///
    /// The compiler adds the resource to the compiled graph's ping-pong set;
    /// the caller must back it with two physical buffers.
    pub fn read_write(&mut self, resource: impl Into<String>) {
        let resource = resource.into();
        self.inputs.push(ResourceAccess {
            resource: resource.clone(),
            mode: AccessMode::ReadWrite,
        });
        self.outputs.push(ResourceAccess {
            resource,
            mode: AccessMode::ReadWrite,
        });
    }

    /// Set the scheduling priority. Lower values run earlier among
    /// otherwise-unordered passes. Defaults to 0.
    pub fn set_priority(&mut self, priority: i32) {
        *self.priority = priority;
    }

    /// Get screen dimensions
    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }
}

/// Context for executing a render pass
pub struct PassExecuteContext<'a> {
    pub(crate) frame_index: u64,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) handles: &'a HashMap<String, ResourceHandle>,
    pub(crate) ping_pong: &'a HashMap<String, [ResourceHandle; 2]>,
}

impl<'a> PassExecuteContext<'a> {
    /// Index of the frame being executed.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Current screen dimensions.
    pub fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Handle to read from for a resource this frame.
    ///
    /// For ping-pong resources this is last frame's write side.
    pub fn read_handle(&self, resource: &str) -> Option<ResourceHandle> {
        if let Some(pair) = self.ping_pong.get(resource) {
            return Some(pair[((self.frame_index + 1) % 2) as usize]);
        }
        self.handles.get(resource).copied()
    }

    /// Handle to write to for a resource this frame.
    ///
    /// For ping-pong resources the write side alternates by frame parity.
    pub fn write_handle(&self, resource: &str) -> Option<ResourceHandle> {
        if let Some(pair) = self.ping_pong.get(resource) {
            return Some(pair[(self.frame_index % 2) as usize]);
        }
        self.handles.get(resource).copied()
    }
}

/// Trait for render passes
pub trait RenderPass {
    /// Pass identity. Must be unique within one graph.
    fn name(&self) -> &str;

    /// Setup phase - declare resource accesses and priority
    fn setup(&mut self, ctx: &mut PassSetupContext);

    /// Execute phase - record work against resolved resource handles
    fn execute(&mut self, ctx: &mut PassExecuteContext);
}

/// Metadata about a pass in the graph
#[derive(Debug)]
pub struct PassNode {
    pub name: String,
    pub priority: i32,
    pub inputs: Vec<ResourceAccess>,
    pub outputs: Vec<ResourceAccess>,
}

impl PassNode {
    pub fn reads_resource(&self, resource: &str) -> bool {
        self.inputs
            .iter()
            .any(|a| a.resource == resource && a.is_read())
    }

    pub fn writes_resource(&self, resource: &str) -> bool {
        self.outputs
            .iter()
            .any(|a| a.resource == resource && a.is_write())
    }
}
