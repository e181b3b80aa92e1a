use crate::types::{CallerId, CanvasId, ContextId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Outcome of recording a freshly created context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// Our context is now the canvas's context
    Attached(ContextId),
    /// Another thread attached first; use this one and release ours
    Existing(ContextId),
    /// The caller no longer points at the canvas (unbound or destroyed)
    Unbound,
}

/// Everything detached from a canvas by `retire`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retired {
    pub unbound: Vec<CallerId>,
    pub context: Option<ContextId>,
}

#[derive(Debug, Default)]
struct Inner {
    bindings: HashMap<CallerId, CanvasId>,
    contexts: HashMap<CanvasId, ContextId>,
}

/// Caller to canvas bindings, plus the contexts this core created per canvas
///
/// Both maps sit behind one lock so a canvas retirement is a single atomic
/// step for every concurrent lookup. Several callers may share one canvas;
/// each caller keeps only its most recent binding.
#[derive(Debug, Default)]
pub struct CanvasRegistry {
    inner: RwLock<Inner>,
}

impl CanvasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `caller` to `canvas`, replacing any previous binding
    pub fn set_active(&self, caller: CallerId, canvas: CanvasId) -> Option<CanvasId> {
        self.inner.write().bindings.insert(caller, canvas)
    }

    pub fn lookup_active(&self, caller: CallerId) -> Option<CanvasId> {
        self.inner.read().bindings.get(&caller).copied()
    }

    /// The caller's canvas and that canvas's context, read in one snapshot
    pub fn resolve(&self, caller: CallerId) -> Option<(CanvasId, Option<ContextId>)> {
        let inner = self.inner.read();
        let canvas = *inner.bindings.get(&caller)?;
        Some((canvas, inner.contexts.get(&canvas).copied()))
    }

    /// Drop the binding of a single caller
    pub fn clear(&self, caller: CallerId) -> Option<CanvasId> {
        self.inner.write().bindings.remove(&caller)
    }

    /// Remove every binding pointing at `canvas`, returning the affected callers
    pub fn remove_all(&self, canvas: CanvasId) -> Vec<CallerId> {
        let mut inner = self.inner.write();
        Self::unbind_canvas(&mut inner, canvas)
    }

    pub fn context_for(&self, canvas: CanvasId) -> Option<ContextId> {
        self.inner.read().contexts.get(&canvas).copied()
    }

    /// Record `context` for `canvas`, provided `caller` is still bound to it
    pub fn attach_context(&self, caller: CallerId, canvas: CanvasId, context: ContextId) -> Attach {
        let mut inner = self.inner.write();

        if inner.bindings.get(&caller) != Some(&canvas) {
            return Attach::Unbound;
        }

        match inner.contexts.get(&canvas) {
            Some(&existing) => Attach::Existing(existing),
            None => {
                inner.contexts.insert(canvas, context);
                Attach::Attached(context)
            }
        }
    }

    /// Record a context created from the GUI side, without a bound caller
    pub fn adopt_context(&self, canvas: CanvasId, context: ContextId) -> Attach {
        let mut inner = self.inner.write();
        match inner.contexts.get(&canvas) {
            Some(&existing) => Attach::Existing(existing),
            None => {
                inner.contexts.insert(canvas, context);
                Attach::Attached(context)
            }
        }
    }

    /// Unbind all callers of `canvas` and detach its context in one step
    pub fn retire(&self, canvas: CanvasId) -> Retired {
        let mut inner = self.inner.write();
        let unbound = Self::unbind_canvas(&mut inner, canvas);
        let context = inner.contexts.remove(&canvas);
        Retired { unbound, context }
    }

    pub fn bound_callers(&self, canvas: CanvasId) -> Vec<CallerId> {
        let mut callers: Vec<_> = self
            .inner
            .read()
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == canvas)
            .map(|(caller, _)| *caller)
            .collect();
        callers.sort();
        callers
    }

    /// Number of bound callers
    pub fn len(&self) -> usize {
        self.inner.read().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unbind_canvas(inner: &mut Inner, canvas: CanvasId) -> Vec<CallerId> {
        let mut unbound = Vec::new();
        inner.bindings.retain(|caller, bound| {
            if *bound == canvas {
                unbound.push(*caller);
                false
            } else {
                true
            }
        });
        unbound.sort();
        unbound
    }
}
