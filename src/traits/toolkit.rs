use crate::error::ToolkitError;
use crate::types::{CanvasId, ContextId, SurfaceParams};

/// GUI toolkit boundary for GL contexts
///
/// Implementations resolve canvas handles against their own live-object
/// table on every call. A handle for a destroyed canvas must fail with
/// `ToolkitError::CanvasDestroyed`; it must never reach freed state.
pub trait GlToolkit: Send + Sync {
    /// Bind `context` to the calling thread, drawing to `canvas`
    fn make_current(&self, canvas: CanvasId, context: ContextId) -> Result<(), ToolkitError>;

    /// Create a new rendering context for a canvas that has none yet
    ///
    /// Returned ids must be unique for the lifetime of the process.
    fn create_context(
        &self,
        canvas: CanvasId,
        surface: &SurfaceParams,
    ) -> Result<ContextId, ToolkitError>;

    /// Release a context previously returned by `create_context`
    fn release_context(&self, context: ContextId) -> Result<(), ToolkitError>;
}
