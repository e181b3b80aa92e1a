use super::activator::{Activation, ContextActivator};
use super::reconciler::{LifecycleReconciler, Reconciled};
use super::registry::{Attach, CanvasRegistry};
use crate::config::DriverConfig;
use crate::error::{GlError, Result};
use crate::traits::{CommandTable, GlToolkit, Reply};
use crate::types::{CallerId, CanvasId, ContextId, SurfaceParams};
use log::{debug, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub dispatched: u64,
    pub failed: u64,
    pub switches: u64,
}

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicU64,
    failed: AtomicU64,
    switches: AtomicU64,
}

/// Entry point for incoming GL commands
///
/// Every command first activates its caller's context on the running
/// thread, then goes to the opcode table. Errors fail the one command.
pub struct GlDriver<T: CommandTable> {
    registry: Arc<CanvasRegistry>,
    toolkit: Arc<dyn GlToolkit>,
    activator: ContextActivator,
    reconciler: LifecycleReconciler,
    table: T,
    config: DriverConfig,
    counters: Counters,
}

impl<T: CommandTable> GlDriver<T> {
    pub fn new(toolkit: Arc<dyn GlToolkit>, table: T, config: DriverConfig) -> Self {
        let registry = Arc::new(CanvasRegistry::new());
        Self::with_registry(registry, toolkit, table, config)
    }

    /// Build around a registry owned elsewhere
    pub fn with_registry(
        registry: Arc<CanvasRegistry>,
        toolkit: Arc<dyn GlToolkit>,
        table: T,
        config: DriverConfig,
    ) -> Self {
        let activator = ContextActivator::new(registry.clone(), toolkit.clone(), config.surface);
        let reconciler = LifecycleReconciler::new(registry.clone(), toolkit.clone());
        Self {
            registry,
            toolkit,
            activator,
            reconciler,
            table,
            config,
            counters: Counters::default(),
        }
    }

    pub fn registry(&self) -> &Arc<CanvasRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Make `canvas` the target of all later commands from `caller`
    pub fn bind(&self, caller: CallerId, canvas: CanvasId) {
        if let Some(previous) = self.registry.set_active(caller, canvas) {
            if previous != canvas {
                debug!("{caller}: rebound {previous} -> {canvas}");
            }
        } else {
            debug!("{caller}: bound to {canvas}");
        }
    }

    pub fn unbind(&self, caller: CallerId) -> Option<CanvasId> {
        self.activator.deactivate(caller)
    }

    /// Activate the caller's context on this thread, retrying surfaces that
    /// are not realized yet as configured
    pub fn activate(&self, caller: CallerId) -> Result<Activation> {
        let mut attempt = 0;
        loop {
            match self.activator.activate(caller) {
                Ok(activation) => {
                    if activation.switched {
                        self.counters.switches.fetch_add(1, Ordering::Relaxed);
                    }
                    return Ok(activation);
                }
                Err(e) if e.is_transient() && attempt < self.config.activation_retries => {
                    attempt += 1;
                    debug!("{caller}: {e}, retry {attempt}/{}", self.config.activation_retries);
                    thread::sleep(self.config.retry_backoff());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run one command for `caller` against its bound canvas
    pub fn dispatch(
        &self,
        op: u32,
        payload: &[u8],
        caller: CallerId,
        buffers: &[&[u8]],
    ) -> Result<Reply> {
        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);

        let result = self
            .activate(caller)
            .and_then(|activation| {
                self.table
                    .execute(op, payload, buffers, &activation)
                    .map_err(GlError::from)
            });

        if let Err(e) = &result {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!("{caller}: opcode {op} failed: {e}");
        }
        result
    }

    /// Create a canvas's context ahead of first use, from the GUI side
    pub fn init_opengl(&self, canvas: CanvasId, surface: &SurfaceParams) -> Result<ContextId> {
        if let Some(context) = self.registry.context_for(canvas) {
            return Ok(context);
        }

        let context = self
            .toolkit
            .create_context(canvas, surface)
            .map_err(|source| GlError::ContextInitFailed { canvas, source })?;

        match self.registry.adopt_context(canvas, context) {
            Attach::Existing(winner) => {
                if let Err(e) = self.toolkit.release_context(context) {
                    warn!("failed to release unused {context}: {e}");
                }
                Ok(winner)
            }
            _ => {
                debug!("{canvas}: initialised {context}");
                Ok(context)
            }
        }
    }

    /// Destroy hook target; see `LifecycleReconciler::on_canvas_destroyed`
    pub fn on_canvas_destroyed(&self, canvas: CanvasId) -> Reconciled {
        self.reconciler.on_canvas_destroyed(canvas)
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            switches: self.counters.switches.load(Ordering::Relaxed),
        }
    }
}
