use super::registry::CanvasRegistry;
use crate::traits::GlToolkit;
use crate::types::{CallerId, CanvasId, ContextId};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// What a canvas destruction cleaned up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    pub canvas: CanvasId,
    pub unbound: Vec<CallerId>,
    /// Context released by this call, if one had been created
    pub released: Option<ContextId>,
}

/// Scrubs a destroyed canvas from the registry and frees its context
pub struct LifecycleReconciler {
    registry: Arc<CanvasRegistry>,
    toolkit: Arc<dyn GlToolkit>,
}

impl LifecycleReconciler {
    pub fn new(registry: Arc<CanvasRegistry>, toolkit: Arc<dyn GlToolkit>) -> Self {
        Self { registry, toolkit }
    }

    /// Run from the toolkit's destroy hook, before the canvas resources go away
    ///
    /// Never fails. Unknown canvases and release errors are logged and ignored.
    pub fn on_canvas_destroyed(&self, canvas: CanvasId) -> Reconciled {
        let retired = self.registry.retire(canvas);

        let released = retired.context.and_then(|context| {
            match self.toolkit.release_context(context) {
                Ok(()) => Some(context),
                Err(e) => {
                    warn!("{canvas}: could not release {context}: {e}");
                    None
                }
            }
        });

        if !retired.unbound.is_empty() || released.is_some() {
            info!(
                "{canvas} destroyed: unbound {} caller(s), released {:?}",
                retired.unbound.len(),
                released
            );
        }

        Reconciled {
            canvas,
            unbound: retired.unbound,
            released,
        }
    }
}
