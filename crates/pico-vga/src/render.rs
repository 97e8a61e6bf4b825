//! The render core: block on the request FIFO, draw the line, repeat.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::{LineReceiver, LineRequest, ScanlineBuffers, VgaError, VgaParams};

/// Draws one logical line into `out`, which is `h_virtual_pixels` long.
///
/// Implementations must finish within [`VgaParams::render_deadline`] or the
/// previous content of the buffer is shown instead.
pub trait ScanlineRenderer: Send {
    fn render_scanline(&mut self, line: u16, params: &VgaParams, out: &mut [u16]);
}

impl<F> ScanlineRenderer for F
where
    F: FnMut(u16, &VgaParams, &mut [u16]) + Send,
{
    fn render_scanline(&mut self, line: u16, params: &VgaParams, out: &mut [u16]) {
        self(line, params, out);
    }
}

pub struct RenderCore<R: ScanlineRenderer> {
    receiver: LineReceiver,
    buffers: Arc<ScanlineBuffers>,
    params: VgaParams,
    renderer: R,
    scratch: Vec<u16>,
    rendered: u64,
}

impl<R: ScanlineRenderer> RenderCore<R> {
    #[must_use]
    pub fn new(receiver: LineReceiver, buffers: Arc<ScanlineBuffers>, params: VgaParams, renderer: R) -> Self {
        let scratch = vec![0; buffers.width()];
        Self {
            receiver,
            buffers,
            params,
            renderer,
            scratch,
            rendered: 0,
        }
    }

    /// Block for one request and render it. Returns `false` once the
    /// sending side is gone.
    pub fn render_next(&mut self) -> bool {
        match self.receiver.recv() {
            Some(request) => {
                self.render(request);
                true
            }
            None => false,
        }
    }

    /// Render a request if one is waiting.
    pub fn try_render_next(&mut self) -> bool {
        match self.receiver.try_recv() {
            Some(request) => {
                self.render(request);
                true
            }
            None => false,
        }
    }

    fn render(&mut self, request: LineRequest) {
        self.renderer.render_scanline(request.line, &self.params, &mut self.scratch);
        self.buffers.publish(request.parity, &self.scratch);
        self.rendered += 1;
    }

    /// Serve requests until the sender is dropped.
    pub fn run(mut self) {
        log::debug!("render core started, {} pixels per line", self.scratch.len());
        while self.render_next() {}
        log::debug!("render core stopped after {} lines", self.rendered);
    }

    #[must_use]
    pub const fn rendered(&self) -> u64 {
        self.rendered
    }
}

/// Run `core` on its own thread.
pub fn spawn_render_core<R>(core: RenderCore<R>) -> Result<JoinHandle<()>, VgaError>
where
    R: ScanlineRenderer + 'static,
{
    let handle = thread::Builder::new()
        .name("render-core".into())
        .spawn(move || core.run())?;
    Ok(handle)
}
