//! VGA output from a timing state machine, two DMA channels and a second
//! core.
//!
//! One PIO program generates sync: it pulls one 32-bit command word per
//! horizontal phase (active, front porch, sync, back porch), drives the two
//! sync pins and waits the encoded number of clocks. A DMA channel feeds it
//! four words per line; its completion interrupt picks the next line's
//! sequence. A second program shifts pixels out of one of two row buffers,
//! fed by a second DMA channel whose completion interrupt re-arms it and
//! asks the render core for the next logical line.
//!
//! ```text
//!  IRQ context                              render core
//!  ───────────                              ───────────
//!  timing done → advance line, feed seq     loop {
//!  pixels done → arm buffer(parity) ──┐       line = recv()   (blocks)
//!              → try_send(line + 1) ──┼──►    render(line, buffer[line & 1])
//!                                     │     }
//!                     DMA reads ◄─────┘
//! ```
//!
//! Every piece of hardware sits behind [`ScanoutHardware`]; the
//! [`SimulatedScanout`] runs the same command words on the host.

mod buffers;
#[cfg(feature = "native")]
pub mod capture;
mod channel;
pub mod command;
mod error;
mod hardware;
pub mod mode;
mod render;
mod scanline;
mod sim;
mod timing;
mod vga;

pub use buffers::ScanlineBuffers;
pub use channel::{BufferParity, LineReceiver, LineRequest, LineSender, line_channel};
pub use command::{AuxInstruction, TimingCommand};
pub use error::VgaError;
pub use hardware::{DmaChannel, PixelConfig, ScanoutHardware, StateMachine};
pub use mode::{SyncParams, VgaMode, VgaParams};
pub use render::{RenderCore, ScanlineRenderer, spawn_render_core};
pub use scanline::ScanlinePipeline;
pub use sim::{Frame, ScannedLine, SimulatedScanout};
pub use timing::{HorizontalPhase, LineBand, LineBands, SequenceKind, SyncSequences, TimingGenerator, TimingStep};
pub use vga::{FrameHook, ScanlineHook, Vga, VgaInitParams, launch};

/// Depth of the inter-core FIFO (words).
pub const LINE_FIFO_DEPTH: usize = 8;
