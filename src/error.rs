use crate::types::{CallerId, CanvasId, ContextId};

/// Failures reported by the GUI toolkit boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolkitError {
    /// Native surface not created yet; retry once the toolkit realizes it
    #[error("{0} is not realized yet")]
    NotRealized(CanvasId),
    #[error("{0} has been destroyed")]
    CanvasDestroyed(CanvasId),
    #[error("{context} does not belong to {canvas}")]
    ForeignContext { canvas: CanvasId, context: ContextId },
    #[error("unknown context {0}")]
    UnknownContext(ContextId),
    #[error("context creation failed for {canvas}: {reason}")]
    ContextCreation { canvas: CanvasId, reason: String },
}

/// Failure of a single opcode inside the command table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),
    #[error("opcode {op}: bad payload ({reason})")]
    BadPayload { op: u32, reason: String },
}

/// Errors surfaced to the dispatch boundary
///
/// None of these are process-level faults: the triggering command fails and
/// the caller thread keeps serving.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlError {
    #[error("{0} has no active canvas")]
    NoActiveCanvas(CallerId),
    #[error("could not make {canvas} current for {caller}")]
    ContextActivationFailed {
        caller: CallerId,
        canvas: CanvasId,
        #[source]
        source: ToolkitError,
    },
    #[error("could not create a context for {canvas}")]
    ContextInitFailed {
        canvas: CanvasId,
        #[source]
        source: ToolkitError,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl GlError {
    /// Whether retrying the same command later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GlError::ContextActivationFailed {
                source: ToolkitError::NotRealized(_),
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, GlError>;
