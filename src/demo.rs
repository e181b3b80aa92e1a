use crate::config::DriverConfig;
use crate::core::activator::Activation;
use crate::core::driver::{DriverStats, GlDriver};
use crate::core::gui_thread::GuiThread;
use crate::core::headless::HeadlessToolkit;
use crate::error::{CommandError, GlError};
use crate::traits::{CommandTable, Reply};
use crate::types::{CallerId, CanvasId};
use anyhow::{anyhow, Context, Result};
use log::info;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// Demo opcode table
// ============================================================================

pub const OP_NOOP: u32 = 0;
/// Returns the context the toolkit really has bound on this thread
pub const OP_CONTEXT_MARKER: u32 = 1;
/// Payload: 4 bytes RGBA
pub const OP_CLEAR: u32 = 2;
/// Echoes the attached buffers back, concatenated
pub const OP_READ_BUFFERS: u32 = 3;

/// Small opcode table running on the headless toolkit
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoCommands;

impl CommandTable for DemoCommands {
    fn execute(
        &self,
        op: u32,
        payload: &[u8],
        buffers: &[&[u8]],
        _target: &Activation,
    ) -> std::result::Result<Reply, CommandError> {
        match op {
            OP_NOOP => Ok(Reply::Ok),
            OP_CONTEXT_MARKER => Ok(Reply::Int(
                HeadlessToolkit::current_context().map_or(-1, |context| context.0 as i64),
            )),
            OP_CLEAR if payload.len() == 4 => Ok(Reply::Ok),
            OP_CLEAR => Err(CommandError::BadPayload {
                op,
                reason: format!("expected 4 bytes, got {}", payload.len()),
            }),
            OP_READ_BUFFERS => Ok(Reply::Bytes(buffers.concat())),
            _ => Err(CommandError::UnknownOpcode(op)),
        }
    }
}

// ============================================================================
// Stress run - many callers, few canvases, optional mid-run destruction
// ============================================================================

#[derive(Debug, Clone)]
pub struct StressConfig {
    pub callers: usize,
    pub canvases: usize,
    pub commands_per_caller: usize,
    /// Destroy the first canvas once this many commands have run in total
    pub destroy_after: Option<u64>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            callers: 4,
            canvases: 2,
            commands_per_caller: 1000,
            destroy_after: None,
        }
    }
}

/// Per-caller outcome tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallerTally {
    pub executed: u64,
    pub no_active_canvas: u64,
    pub activation_failed: u64,
    /// Commands that ran against a context other than the caller's own
    pub stale: u64,
}

impl CallerTally {
    fn merge(self, other: CallerTally) -> CallerTally {
        CallerTally {
            executed: self.executed + other.executed,
            no_active_canvas: self.no_active_canvas + other.no_active_canvas,
            activation_failed: self.activation_failed + other.activation_failed,
            stale: self.stale + other.stale,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub started_at: String,
    pub elapsed_ms: u128,
    pub callers: usize,
    pub canvases: usize,
    pub destroyed: Vec<CanvasId>,
    pub totals: CallerTally,
    pub driver: DriverStats,
    pub make_current_calls: usize,
    pub live_contexts: usize,
}

/// Run `config.callers` threads dispatching against a headless toolkit
pub fn run_stress(config: &StressConfig, driver_config: DriverConfig) -> Result<StressReport> {
    if config.canvases == 0 {
        return Err(anyhow!("at least one canvas is required"));
    }

    let started_at = chrono::Local::now().to_rfc3339();
    let start = Instant::now();

    let toolkit = Arc::new(HeadlessToolkit::new());
    let driver = Arc::new(GlDriver::new(toolkit.clone(), DemoCommands, driver_config));

    let hook_driver = Arc::downgrade(&driver);
    toolkit.set_destroy_hook(move |canvas| {
        if let Some(driver) = hook_driver.upgrade() {
            driver.on_canvas_destroyed(canvas);
        }
    });

    let gui = GuiThread::spawn(toolkit.clone()).context("Failed to start GUI thread")?;
    let surface = driver.config().surface;
    let mut canvases = Vec::with_capacity(config.canvases);
    for _ in 0..config.canvases {
        let canvas = gui.create_canvas(surface)?;
        gui.realize(canvas)?;
        canvases.push(canvas);
    }

    let progress = Arc::new(AtomicU64::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.callers + 1));

    let workers = (0..config.callers)
        .map(|i| {
            let driver = driver.clone();
            let progress = progress.clone();
            let finished = finished.clone();
            let barrier = barrier.clone();
            let canvas = canvases[i % canvases.len()];
            let commands = config.commands_per_caller;

            thread::Builder::new()
                .name(format!("caller-{i}"))
                .spawn(move || {
                    let caller = CallerId(i as u64 + 1);
                    driver.bind(caller, canvas);
                    barrier.wait();

                    let tally = run_caller(&driver, caller, commands, &progress);
                    finished.fetch_add(1, Ordering::SeqCst);
                    tally
                })
                .context("Failed to spawn caller thread")
        })
        .collect::<Result<Vec<_>>>()?;

    barrier.wait();

    let mut destroyed = Vec::new();
    if let Some(threshold) = config.destroy_after {
        while progress.load(Ordering::SeqCst) < threshold
            && finished.load(Ordering::SeqCst) < config.callers
        {
            thread::sleep(Duration::from_millis(1));
        }
        if gui.destroy(canvases[0])? {
            destroyed.push(canvases[0]);
        }
    }

    let mut totals = CallerTally::default();
    for worker in workers {
        let tally = worker
            .join()
            .map_err(|_| anyhow!("caller thread panicked"))?;
        totals = totals.merge(tally);
    }

    gui.shutdown();

    let report = StressReport {
        started_at,
        elapsed_ms: start.elapsed().as_millis(),
        callers: config.callers,
        canvases: config.canvases,
        destroyed,
        totals,
        driver: driver.stats(),
        make_current_calls: toolkit.make_current_calls(),
        live_contexts: toolkit.live_contexts(),
    };
    info!(
        "stress run: {} executed, {} stale in {} ms",
        report.totals.executed, report.totals.stale, report.elapsed_ms
    );
    Ok(report)
}

fn run_caller(
    driver: &GlDriver<DemoCommands>,
    caller: CallerId,
    commands: usize,
    progress: &AtomicU64,
) -> CallerTally {
    let mut tally = CallerTally::default();
    let mut own_marker = None;

    for _ in 0..commands {
        match driver.dispatch(OP_CONTEXT_MARKER, &[], caller, &[]) {
            Ok(Reply::Int(marker)) => {
                tally.executed += 1;
                match own_marker {
                    None => own_marker = Some(marker),
                    Some(expected) if expected != marker => tally.stale += 1,
                    Some(_) => {}
                }
            }
            Ok(_) => tally.executed += 1,
            Err(GlError::NoActiveCanvas(_)) => tally.no_active_canvas += 1,
            Err(_) => tally.activation_failed += 1,
        }
        progress.fetch_add(1, Ordering::Relaxed);
    }
    tally
}
