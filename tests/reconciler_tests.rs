use canvas_gl::core::{current, GuiThread};
use canvas_gl::demo::DemoCommands;
use canvas_gl::{CallerId, DriverConfig, GlDriver, HeadlessToolkit, SurfaceParams};
use std::sync::Arc;

fn driver_with_toolkit() -> (Arc<HeadlessToolkit>, Arc<GlDriver<DemoCommands>>) {
    current::forget();
    let toolkit = Arc::new(HeadlessToolkit::new());
    let driver = Arc::new(GlDriver::new(
        toolkit.clone(),
        DemoCommands,
        DriverConfig::default(),
    ));
    let weak = Arc::downgrade(&driver);
    toolkit.set_destroy_hook(move |canvas| {
        if let Some(driver) = weak.upgrade() {
            driver.on_canvas_destroyed(canvas);
        }
    });
    (toolkit, driver)
}

#[test]
fn test_destroy_releases_context_and_all_bindings() {
    let (toolkit, driver) = driver_with_toolkit();
    let canvas = toolkit.create_canvas(SurfaceParams::default());
    let other = toolkit.create_canvas(SurfaceParams::default());
    toolkit.realize(canvas);
    toolkit.realize(other);

    driver.bind(CallerId(1), canvas);
    driver.bind(CallerId(2), canvas);
    driver.bind(CallerId(3), other);
    let context = driver.activate(CallerId(1)).unwrap().context;

    let reconciled = driver.on_canvas_destroyed(canvas);

    assert_eq!(reconciled.canvas, canvas);
    assert_eq!(reconciled.unbound, vec![CallerId(1), CallerId(2)]);
    assert_eq!(reconciled.released, Some(context));
    assert_eq!(driver.registry().lookup_active(CallerId(3)), Some(other));
    assert_eq!(driver.registry().context_for(canvas), None);
}

#[test]
fn test_reconcile_twice_is_noop() {
    let (toolkit, driver) = driver_with_toolkit();
    let canvas = toolkit.create_canvas(SurfaceParams::default());
    toolkit.realize(canvas);
    driver.bind(CallerId(1), canvas);
    driver.activate(CallerId(1)).unwrap();

    driver.on_canvas_destroyed(canvas);
    let second = driver.on_canvas_destroyed(canvas);

    assert!(second.unbound.is_empty());
    assert_eq!(second.released, None);
}

#[test]
fn test_canvas_without_context_reconciles() {
    let (toolkit, driver) = driver_with_toolkit();
    let canvas = toolkit.create_canvas(SurfaceParams::default());
    driver.bind(CallerId(1), canvas);

    let reconciled = driver.on_canvas_destroyed(canvas);

    assert_eq!(reconciled.unbound, vec![CallerId(1)]);
    assert_eq!(reconciled.released, None);
}

#[test]
fn test_gui_side_destroy_runs_reconciliation() {
    let (toolkit, driver) = driver_with_toolkit();
    let gui = GuiThread::spawn(toolkit.clone()).unwrap();
    let canvas = gui.create_canvas(SurfaceParams::default()).unwrap();
    gui.realize(canvas).unwrap();

    let context = driver.init_opengl(canvas, &SurfaceParams::default()).unwrap();
    driver.bind(CallerId(9), canvas);
    assert_eq!(driver.activate(CallerId(9)).unwrap().context, context);

    assert_eq!(gui.destroy(canvas), Ok(true));

    assert!(driver.registry().is_empty());
    assert_eq!(driver.registry().context_for(canvas), None);
    assert_eq!(toolkit.live_contexts(), 0);
    gui.shutdown();
}
