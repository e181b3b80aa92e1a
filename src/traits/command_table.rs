use crate::core::activator::Activation;
use crate::error::CommandError;
use serde::Serialize;

/// Result value of a single command, handed back to the serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Reply {
    Ok,
    Int(i64),
    Bytes(Vec<u8>),
}

/// Opcode table - executes a decoded command against the active context
///
/// `execute` is only called after the target context has been made current
/// on the calling thread.
pub trait CommandTable: Send + Sync {
    fn execute(
        &self,
        op: u32,
        payload: &[u8],
        buffers: &[&[u8]],
        target: &Activation,
    ) -> Result<Reply, CommandError>;
}
