pub mod activator;
pub mod current;
pub mod driver;
pub mod gui_thread;
pub mod headless;
pub mod reconciler;
pub mod registry;

pub use activator::{Activation, ContextActivator};
pub use driver::{DriverStats, GlDriver};
pub use gui_thread::{GuiClosed, GuiThread};
pub use headless::HeadlessToolkit;
pub use reconciler::{LifecycleReconciler, Reconciled};
pub use registry::{Attach, CanvasRegistry, Retired};
