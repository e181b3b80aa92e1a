use crate::error::ToolkitError;
use crate::traits::GlToolkit;
use crate::types::{CanvasId, ContextId, SurfaceParams};
use log::trace;
use parking_lot::{Mutex, RwLock};
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// Process-wide so handles stay unique across toolkit instances
static NEXT_CANVAS: AtomicU64 = AtomicU64::new(1);
static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static BOUND: Cell<Option<ContextId>> = const { Cell::new(None) };
}

type DestroyHook = Box<dyn Fn(CanvasId) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct CanvasState {
    realized: bool,
    surface: SurfaceParams,
}

#[derive(Debug, Default)]
struct State {
    canvases: HashMap<CanvasId, CanvasState>,
    contexts: HashMap<ContextId, CanvasId>,
}

/// In-process toolkit with no native windows
///
/// Keeps a live-canvas table and a per-thread bound context, and enforces
/// the same rules a real toolkit would: no binding to destroyed or
/// unrealized canvases, no binding a context to a canvas it wasn't made for.
pub struct HeadlessToolkit {
    state: Mutex<State>,
    destroy_hook: RwLock<Option<DestroyHook>>,
    make_current_calls: AtomicUsize,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            destroy_hook: RwLock::new(None),
            make_current_calls: AtomicUsize::new(0),
        }
    }

    /// Context the toolkit has bound on the calling thread
    pub fn current_context() -> Option<ContextId> {
        BOUND.with(|bound| bound.get())
    }

    /// Called with the canvas handle before a destroyed canvas leaves the live table
    pub fn set_destroy_hook<F>(&self, hook: F)
    where
        F: Fn(CanvasId) + Send + Sync + 'static,
    {
        *self.destroy_hook.write() = Some(Box::new(hook));
    }

    /// New, not yet realized canvas
    pub fn create_canvas(&self, surface: SurfaceParams) -> CanvasId {
        let canvas = CanvasId(NEXT_CANVAS.fetch_add(1, Ordering::Relaxed));
        self.state.lock().canvases.insert(
            canvas,
            CanvasState {
                realized: false,
                surface,
            },
        );
        trace!("created {canvas}");
        canvas
    }

    /// Give the canvas its native surface; false if it is not live
    pub fn realize(&self, canvas: CanvasId) -> bool {
        match self.state.lock().canvases.get_mut(&canvas) {
            Some(state) => {
                state.realized = true;
                true
            }
            None => false,
        }
    }

    /// Destroy a canvas; false if it was not live
    pub fn destroy(&self, canvas: CanvasId) -> bool {
        if !self.is_live(canvas) {
            return false;
        }

        // Hook runs while the canvas is still live and without our lock held
        if let Some(hook) = self.destroy_hook.read().as_ref() {
            hook(canvas);
        }

        let mut state = self.state.lock();
        let removed = state.canvases.remove(&canvas).is_some();
        state.contexts.retain(|_, owner| *owner != canvas);
        trace!("destroyed {canvas}");
        removed
    }

    pub fn is_live(&self, canvas: CanvasId) -> bool {
        self.state.lock().canvases.contains_key(&canvas)
    }

    pub fn is_realized(&self, canvas: CanvasId) -> bool {
        self.state
            .lock()
            .canvases
            .get(&canvas)
            .is_some_and(|state| state.realized)
    }

    pub fn surface(&self, canvas: CanvasId) -> Option<SurfaceParams> {
        self.state.lock().canvases.get(&canvas).map(|state| state.surface)
    }

    pub fn live_contexts(&self) -> usize {
        self.state.lock().contexts.len()
    }

    pub fn make_current_calls(&self) -> usize {
        self.make_current_calls.load(Ordering::SeqCst)
    }
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl GlToolkit for HeadlessToolkit {
    fn make_current(&self, canvas: CanvasId, context: ContextId) -> Result<(), ToolkitError> {
        let state = self.state.lock();
        self.make_current_calls.fetch_add(1, Ordering::SeqCst);

        let canvas_state = state
            .canvases
            .get(&canvas)
            .ok_or(ToolkitError::CanvasDestroyed(canvas))?;
        if !canvas_state.realized {
            return Err(ToolkitError::NotRealized(canvas));
        }

        match state.contexts.get(&context) {
            Some(owner) if *owner == canvas => {
                BOUND.with(|bound| bound.set(Some(context)));
                Ok(())
            }
            Some(_) => Err(ToolkitError::ForeignContext { canvas, context }),
            None => Err(ToolkitError::UnknownContext(context)),
        }
    }

    fn create_context(
        &self,
        canvas: CanvasId,
        surface: &SurfaceParams,
    ) -> Result<ContextId, ToolkitError> {
        let mut state = self.state.lock();
        if !state.canvases.contains_key(&canvas) {
            return Err(ToolkitError::CanvasDestroyed(canvas));
        }
        if surface.samples > 16 {
            return Err(ToolkitError::ContextCreation {
                canvas,
                reason: format!("{} samples not supported", surface.samples),
            });
        }

        let context = ContextId(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed));
        state.contexts.insert(context, canvas);
        Ok(context)
    }

    fn release_context(&self, context: ContextId) -> Result<(), ToolkitError> {
        if self.state.lock().contexts.remove(&context).is_none() {
            return Err(ToolkitError::UnknownContext(context));
        }
        BOUND.with(|bound| {
            if bound.get() == Some(context) {
                bound.set(None);
            }
        });
        Ok(())
    }
}
