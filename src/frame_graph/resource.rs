//! Resource definitions for the frame graph

/// Opaque handle to a GPU object allocated outside the frame graph.
///
/// The graph never dereferences handles; it only routes them to passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u64);

/// Kind tag for a resource definition.
///
/// Opaque to the compiler: it never branches on the kind, callers use it
/// when allocating the physical object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Texture,
    Buffer,
    /// Owned and sized elsewhere (swapchain image, canvas backbuffer).
    External,
}

/// Describes resource dimensions that can be relative to screen size
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceSize {
    /// Absolute size in pixels
    Fixed { width: u32, height: u32 },
    /// Relative to screen size (1.0 = full screen)
    ScreenRelative { scale: f32 },
}

impl Default for ResourceSize {
    fn default() -> Self {
        ResourceSize::ScreenRelative { scale: 1.0 }
    }
}

impl ResourceSize {
    pub fn resolve(&self, screen_width: u32, screen_height: u32) -> (u32, u32) {
        match self {
            ResourceSize::Fixed { width, height } => (*width, *height),
            ResourceSize::ScreenRelative { scale } => (
                ((screen_width as f32) * scale) as u32,
                ((screen_height as f32) * scale) as u32,
            ),
        }
    }
}

/// A named resource registered with the frame graph.
#[derive(Debug, Clone)]
pub struct ResourceDesc {
    pub name: String,
    pub kind: ResourceKind,
    pub size: ResourceSize,
}

impl ResourceDesc {
    pub fn new(name: impl Into<String>, kind: ResourceKind, size: ResourceSize) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
        }
    }
}

/// How a pass accesses a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    /// Read and write within the same pass. The resource must be
    /// double-buffered by the caller; the compiler flags it.
    ReadWrite,
}

/// Resource access declaration for a pass
#[derive(Debug, Clone)]
pub struct ResourceAccess {
    pub resource: String,
    pub mode: AccessMode,
}

impl ResourceAccess {
    pub fn is_read(&self) -> bool {
        matches!(self.mode, AccessMode::Read | AccessMode::ReadWrite)
    }

    pub fn is_write(&self) -> bool {
        matches!(self.mode, AccessMode::Write | AccessMode::ReadWrite)
    }
}
