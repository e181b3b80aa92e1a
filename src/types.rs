use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying the thread or process that issued a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallerId(pub u64);

/// Stable handle for a toolkit canvas
///
/// Handles are issued by the toolkit and never reused, so a stale handle can
/// only ever fail to resolve. It never aliases a newer canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanvasId(pub u64);

/// Handle for a rendering context, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caller#{}", self.0)
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "canvas#{}", self.0)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Surface attributes used when bootstrapping a context for a canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    pub rgba: bool,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    pub double_buffer: bool,
    /// Multisample count (0 = no multisampling)
    pub samples: u8,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            rgba: true,
            depth_bits: 24,
            stencil_bits: 0,
            double_buffer: true,
            samples: 0,
        }
    }
}
