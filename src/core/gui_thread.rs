use super::headless::HeadlessToolkit;
use crate::types::{CanvasId, SurfaceParams};
use log::{debug, info};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("GUI thread has shut down")]
pub struct GuiClosed;

enum GuiRequest {
    CreateCanvas {
        surface: SurfaceParams,
        reply: Sender<CanvasId>,
    },
    Realize {
        canvas: CanvasId,
        reply: Sender<bool>,
    },
    Destroy {
        canvas: CanvasId,
        reply: Sender<bool>,
    },
    Shutdown,
}

/// Dedicated toolkit event thread
///
/// All canvas creation, realization and destruction happens here; other
/// threads only post requests and wait for the answer.
pub struct GuiThread {
    sender: Sender<GuiRequest>,
    handle: Option<JoinHandle<()>>,
}

impl GuiThread {
    pub fn spawn(toolkit: Arc<HeadlessToolkit>) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("gui".to_owned())
            .spawn(move || Self::run(toolkit, receiver))?;

        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    fn run(toolkit: Arc<HeadlessToolkit>, receiver: Receiver<GuiRequest>) {
        debug!("gui thread started");
        for request in receiver {
            match request {
                GuiRequest::CreateCanvas { surface, reply } => {
                    reply.send(toolkit.create_canvas(surface)).ok();
                }
                GuiRequest::Realize { canvas, reply } => {
                    reply.send(toolkit.realize(canvas)).ok();
                }
                GuiRequest::Destroy { canvas, reply } => {
                    reply.send(toolkit.destroy(canvas)).ok();
                }
                GuiRequest::Shutdown => break,
            }
        }
        info!("gui thread stopped");
    }

    pub fn create_canvas(&self, surface: SurfaceParams) -> Result<CanvasId, GuiClosed> {
        self.request(|reply| GuiRequest::CreateCanvas { surface, reply })
    }

    pub fn realize(&self, canvas: CanvasId) -> Result<bool, GuiClosed> {
        self.request(|reply| GuiRequest::Realize { canvas, reply })
    }

    /// Destroy a canvas; returns once reconciliation has run
    pub fn destroy(&self, canvas: CanvasId) -> Result<bool, GuiClosed> {
        self.request(|reply| GuiRequest::Destroy { canvas, reply })
    }

    fn request<R>(&self, build: impl FnOnce(Sender<R>) -> GuiRequest) -> Result<R, GuiClosed> {
        let (reply, answer) = mpsc::channel();
        self.sender.send(build(reply)).map_err(|_| GuiClosed)?;
        answer.recv().map_err(|_| GuiClosed)
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.sender.send(GuiRequest::Shutdown).ok();
            handle.join().ok();
        }
    }
}

impl Drop for GuiThread {
    fn drop(&mut self) {
        self.stop();
    }
}
