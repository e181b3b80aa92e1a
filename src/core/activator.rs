use super::current;
use super::registry::{Attach, CanvasRegistry};
use crate::error::{GlError, Result, ToolkitError};
use crate::traits::GlToolkit;
use crate::types::{CallerId, CanvasId, ContextId, SurfaceParams};
use log::{debug, trace, warn};
use serde::Serialize;
use std::sync::Arc;

/// The context a command is about to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub caller: CallerId,
    pub canvas: CanvasId,
    pub context: ContextId,
    /// A make-current call was issued (false on the fast path)
    pub switched: bool,
    /// The context was created by this activation
    pub bootstrapped: bool,
}

/// Makes the bound canvas's context current on the calling thread
pub struct ContextActivator {
    registry: Arc<CanvasRegistry>,
    toolkit: Arc<dyn GlToolkit>,
    surface: SurfaceParams,
}

impl ContextActivator {
    pub fn new(
        registry: Arc<CanvasRegistry>,
        toolkit: Arc<dyn GlToolkit>,
        surface: SurfaceParams,
    ) -> Self {
        Self {
            registry,
            toolkit,
            surface,
        }
    }

    /// Ensure `caller`'s canvas context is current on this thread
    ///
    /// Returns only once the context is current or the attempt has failed, so
    /// the command that follows never runs against another context.
    pub fn activate(&self, caller: CallerId) -> Result<Activation> {
        loop {
            let (canvas, attached) = self
                .registry
                .resolve(caller)
                .ok_or(GlError::NoActiveCanvas(caller))?;

            let (context, bootstrapped) = match attached {
                Some(context) => (context, false),
                None => match self.bootstrap(caller, canvas)? {
                    Some(context) => (context, true),
                    // Rebound while bootstrapping; start over from the new binding
                    None => continue,
                },
            };

            if current::is_current(context) {
                trace!("{caller}: {context} already current");
                return Ok(Activation {
                    caller,
                    canvas,
                    context,
                    switched: false,
                    bootstrapped,
                });
            }

            if let Err(source) = self.toolkit.make_current(canvas, context) {
                current::forget();
                warn!("{caller}: make current failed on {canvas}: {source}");
                return Err(self.failed(caller, canvas, source));
            }

            current::mark_current(context);
            debug!("{caller}: switched to {context} on {canvas}");

            return Ok(Activation {
                caller,
                canvas,
                context,
                switched: true,
                bootstrapped,
            });
        }
    }

    /// Drop the caller's binding; the canvas and its context stay alive
    pub fn deactivate(&self, caller: CallerId) -> Option<CanvasId> {
        let previous = self.registry.clear(caller);
        if let Some(canvas) = previous {
            debug!("{caller}: unbound from {canvas}");
        }
        previous
    }

    /// First use of a canvas: create its context and record it
    ///
    /// `Ok(None)` means the caller was rebound to another canvas meanwhile.
    fn bootstrap(&self, caller: CallerId, canvas: CanvasId) -> Result<Option<ContextId>> {
        let context = self
            .toolkit
            .create_context(canvas, &self.surface)
            .map_err(|source| self.failed(caller, canvas, source))?;

        match self.registry.attach_context(caller, canvas, context) {
            Attach::Attached(context) => {
                debug!("{caller}: created {context} for {canvas}");
                Ok(Some(context))
            }
            Attach::Existing(winner) => {
                trace!("{caller}: lost bootstrap race on {canvas}, using {winner}");
                self.release_quietly(context);
                Ok(Some(winner))
            }
            Attach::Unbound => {
                self.release_quietly(context);
                match self.registry.lookup_active(caller) {
                    None => Err(GlError::NoActiveCanvas(caller)),
                    Some(rebound) => {
                        trace!("{caller}: rebound {canvas} -> {rebound} during bootstrap");
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Build the activation error; a canvas the toolkit reports dead is
    /// dropped from the registry so no binding keeps pointing at it
    fn failed(&self, caller: CallerId, canvas: CanvasId, source: ToolkitError) -> GlError {
        if source == ToolkitError::CanvasDestroyed(canvas) {
            let retired = self.registry.retire(canvas);
            if let Some(context) = retired.context {
                self.release_quietly(context);
            }
            debug!("{canvas} is gone, unbound {} caller(s)", retired.unbound.len());
        }
        GlError::ContextActivationFailed {
            caller,
            canvas,
            source,
        }
    }

    fn release_quietly(&self, context: ContextId) {
        if let Err(e) = self.toolkit.release_context(context) {
            warn!("failed to release unused {context}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1_000_000);

    /// Toolkit that accepts everything and counts calls
    #[derive(Default)]
    struct CountingToolkit {
        make_current_calls: AtomicUsize,
        created: AtomicUsize,
        released: Mutex<Vec<ContextId>>,
        refuse: Mutex<Option<ToolkitError>>,
        /// Runs inside `create_context`, to interleave registry changes
        during_create: Mutex<Option<Box<dyn Fn() + Send>>>,
    }

    impl GlToolkit for CountingToolkit {
        fn make_current(
            &self,
            _canvas: CanvasId,
            _context: ContextId,
        ) -> std::result::Result<(), ToolkitError> {
            self.make_current_calls.fetch_add(1, Ordering::SeqCst);
            match self.refuse.lock().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn create_context(
            &self,
            _canvas: CanvasId,
            _surface: &SurfaceParams,
        ) -> std::result::Result<ContextId, ToolkitError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            if let Some(interleave) = self.during_create.lock().as_ref() {
                interleave();
            }
            Ok(ContextId(NEXT_CONTEXT.fetch_add(1, Ordering::SeqCst)))
        }

        fn release_context(&self, context: ContextId) -> std::result::Result<(), ToolkitError> {
            self.released.lock().push(context);
            Ok(())
        }
    }

    fn setup() -> (Arc<CanvasRegistry>, Arc<CountingToolkit>, ContextActivator) {
        current::forget();
        let registry = Arc::new(CanvasRegistry::new());
        let toolkit = Arc::new(CountingToolkit::default());
        let activator = ContextActivator::new(
            registry.clone(),
            toolkit.clone(),
            SurfaceParams::default(),
        );
        (registry, toolkit, activator)
    }

    #[test]
    fn test_unbound_caller_is_no_active_canvas() {
        let (_, toolkit, activator) = setup();
        let err = activator.activate(CallerId(1)).unwrap_err();
        assert_eq!(err, GlError::NoActiveCanvas(CallerId(1)));
        assert_eq!(toolkit.make_current_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_activation_bootstraps_and_switches() {
        let (registry, toolkit, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));

        let activation = activator.activate(CallerId(1)).unwrap();

        assert!(activation.bootstrapped);
        assert!(activation.switched);
        assert_eq!(registry.context_for(CanvasId(1)), Some(activation.context));
        assert_eq!(toolkit.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_activation_takes_fast_path() {
        let (registry, toolkit, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));

        activator.activate(CallerId(1)).unwrap();
        let again = activator.activate(CallerId(1)).unwrap();

        assert!(!again.switched);
        assert!(!again.bootstrapped);
        assert_eq!(toolkit.make_current_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_switch_clears_slot() {
        let (registry, toolkit, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));
        activator.activate(CallerId(1)).unwrap();

        registry.set_active(CallerId(1), CanvasId(2));
        *toolkit.refuse.lock() = Some(ToolkitError::NotRealized(CanvasId(2)));
        let err = activator.activate(CallerId(1)).unwrap_err();

        assert!(err.is_transient());
        assert_eq!(current::current(), None);
    }

    #[test]
    fn test_activate_after_retire_skips_bootstrap() {
        let (registry, toolkit, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));
        registry.retire(CanvasId(1));

        assert_eq!(
            activator.activate(CallerId(1)).unwrap_err(),
            GlError::NoActiveCanvas(CallerId(1))
        );
        assert_eq!(toolkit.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_retire_during_bootstrap_releases_new_context() {
        let (registry, toolkit, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));
        let retiring = registry.clone();
        *toolkit.during_create.lock() = Some(Box::new(move || {
            retiring.retire(CanvasId(1));
        }));

        let err = activator.activate(CallerId(1)).unwrap_err();

        assert_eq!(err, GlError::NoActiveCanvas(CallerId(1)));
        assert_eq!(toolkit.created.load(Ordering::SeqCst), 1);
        assert_eq!(toolkit.released.lock().len(), 1);
        assert_eq!(registry.context_for(CanvasId(1)), None);
        assert_eq!(toolkit.make_current_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rebind_during_bootstrap_follows_new_canvas() {
        let (registry, toolkit, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));
        let rebinding = registry.clone();
        *toolkit.during_create.lock() = Some(Box::new(move || {
            rebinding.set_active(CallerId(1), CanvasId(2));
        }));

        let activation = activator.activate(CallerId(1)).unwrap();

        assert_eq!(activation.canvas, CanvasId(2));
        assert!(activation.bootstrapped);
        assert!(activation.switched);
        assert_eq!(toolkit.created.load(Ordering::SeqCst), 2);
        // Only the context built for the abandoned canvas is released
        assert_eq!(toolkit.released.lock().len(), 1);
        assert_eq!(registry.context_for(CanvasId(1)), None);
        assert_eq!(registry.context_for(CanvasId(2)), Some(activation.context));
    }

    #[test]
    fn test_dead_canvas_on_switch_drops_binding() {
        let (registry, toolkit, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));
        registry.set_active(CallerId(2), CanvasId(1));
        *toolkit.refuse.lock() = Some(ToolkitError::CanvasDestroyed(CanvasId(1)));

        let err = activator.activate(CallerId(1)).unwrap_err();

        assert!(!err.is_transient());
        assert!(registry.is_empty());
        assert_eq!(registry.context_for(CanvasId(1)), None);
        assert_eq!(toolkit.released.lock().len(), 1);
        assert_eq!(
            activator.activate(CallerId(2)).unwrap_err(),
            GlError::NoActiveCanvas(CallerId(2))
        );
    }

    #[test]
    fn test_deactivate() {
        let (registry, _, activator) = setup();
        registry.set_active(CallerId(1), CanvasId(1));

        assert_eq!(activator.deactivate(CallerId(1)), Some(CanvasId(1)));
        assert_eq!(activator.deactivate(CallerId(1)), None);
        assert!(activator.activate(CallerId(1)).is_err());
    }
}
