pub mod cli;
pub mod config;
pub mod core;
pub mod demo;
pub mod error;
pub mod traits;
pub mod types;

pub use crate::config::DriverConfig;
pub use crate::core::{
    Activation, CanvasRegistry, ContextActivator, GlDriver, HeadlessToolkit, LifecycleReconciler,
};
pub use crate::error::{CommandError, GlError, Result, ToolkitError};
pub use crate::traits::{CommandTable, GlToolkit, Reply};
pub use crate::types::{CallerId, CanvasId, ContextId, SurfaceParams};
