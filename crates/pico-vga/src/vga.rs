//! Start-up and interrupt handling for the VGA output.
//!
//! [`Vga::new`] claims two state machines and two DMA channels, builds the
//! command sequences, primes the first two lines and starts scanout. After
//! that, everything happens in [`Vga::handle_irq`].

#![allow(clippy::cast_precision_loss)]

use std::sync::Arc;
use std::thread::JoinHandle;

use emu_core::{Observable, Value};

use crate::mode::RGB_LOOP_TICKS;
use crate::{
    BufferParity, DmaChannel, LINE_FIFO_DEPTH, LineBands, LineSender, PixelConfig, RenderCore, ScanlineBuffers,
    ScanlinePipeline, ScanlineRenderer, ScanoutHardware, SyncSequences, TimingGenerator, VgaError, VgaMode,
    VgaParams, line_channel, spawn_render_core,
};

/// Called from interrupt context when the timing counter wraps, with the
/// number of frames completed.
pub type FrameHook = Box<dyn FnMut(u64) + Send>;

/// Called from interrupt context on every timing completion.
pub type ScanlineHook = Box<dyn FnMut() + Send>;

/// What to put on screen and how fast the chip runs.
pub struct VgaInitParams {
    pub mode: VgaMode,
    /// Physical pixels per logical pixel, on both axes.
    pub pixel_scale: u32,
    pub sys_clock_khz: u32,
    pub end_of_frame: Option<FrameHook>,
    pub end_of_scanline: Option<ScanlineHook>,
}

impl Default for VgaInitParams {
    fn default() -> Self {
        Self {
            mode: VgaMode::default(),
            pixel_scale: 1,
            sys_clock_khz: 252_000,
            end_of_frame: None,
            end_of_scanline: None,
        }
    }
}

impl VgaInitParams {
    #[must_use]
    pub fn new(mode: VgaMode, pixel_scale: u32) -> Self {
        Self {
            mode,
            pixel_scale,
            ..Self::default()
        }
    }

    /// Derived video parameters, PIO clocking included.
    pub fn video_params(&self) -> Result<VgaParams, VgaError> {
        VgaParams::new(self.mode, self.pixel_scale).with_system_clock(self.sys_clock_khz)
    }
}

pub struct Vga<H: ScanoutHardware> {
    hw: H,
    params: VgaParams,
    sync_channel: DmaChannel,
    pixel_channel: DmaChannel,
    timing: TimingGenerator,
    scanline: ScanlinePipeline,
    sender: LineSender,
    buffers: Arc<ScanlineBuffers>,
    end_of_frame: Option<FrameHook>,
    end_of_scanline: Option<ScanlineHook>,
}

impl<H: ScanoutHardware> Vga<H> {
    /// Configure and start scanout.
    ///
    /// `buffers` must be `h_virtual_pixels` wide; `sender` feeds whatever
    /// render core serves those buffers.
    pub fn new(
        mut hw: H,
        init: VgaInitParams,
        mut sender: LineSender,
        buffers: Arc<ScanlineBuffers>,
    ) -> Result<Self, VgaError> {
        let params = init.video_params()?;
        let sequences = SyncSequences::build(&params)?;

        let sync_sm = hw.claim_state_machine().ok_or(VgaError::NoStateMachine("sync"))?;
        let rgb_sm = hw.claim_state_machine().ok_or(VgaError::NoStateMachine("rgb"))?;
        let sync_channel = hw.claim_dma_channel().ok_or(VgaError::NoDmaChannel("sync commands"))?;
        let pixel_channel = hw.claim_dma_channel().ok_or(VgaError::NoDmaChannel("pixels"))?;

        hw.configure_sync(sync_sm, sync_channel, params.pio_divider, &sequences);
        let pixel_config = PixelConfig {
            divider: params.pio_divider,
            delay: (params.pio_clocks_per_scaled_pixel.round() as u32).saturating_sub(RGB_LOOP_TICKS),
            width: params.h_virtual_pixels,
            repeat: params.h_pixel_scale,
            initial: BufferParity::Even,
        };
        hw.configure_pixels(rgb_sm, pixel_channel, &pixel_config, Arc::clone(&buffers));

        let timing = TimingGenerator::new(LineBands::new(&params.v_sync));
        hw.feed_sync(sync_channel, timing.initial_sequence());
        hw.feed_pixels(pixel_channel, pixel_config.initial);

        let mut scanline = ScanlinePipeline::new(&params);
        scanline.start_frame(&mut sender);

        hw.start();
        log::info!(
            "VGA {}x{} @ {:.2} Hz, {}x{} logical, PIO /{} ({:.1} clocks per pixel)",
            params.h_sync.display_pixels,
            params.v_sync.display_pixels,
            params.v_sync.freq_hz,
            params.h_virtual_pixels,
            params.v_virtual_pixels,
            params.pio_divider,
            params.pio_clocks_per_pixel
        );

        Ok(Self {
            hw,
            params,
            sync_channel,
            pixel_channel,
            timing,
            scanline,
            sender,
            buffers,
            end_of_frame: init.end_of_frame,
            end_of_scanline: init.end_of_scanline,
        })
    }

    /// Service both DMA completions. Never blocks.
    pub fn handle_irq(&mut self) {
        if self.hw.take_irq(self.sync_channel) {
            let step = self.timing.advance();
            self.hw.feed_sync(self.sync_channel, step.sequence);

            if let Some(hook) = self.end_of_scanline.as_mut() {
                hook();
            }
            if step.frame_started {
                if let Some(hook) = self.end_of_frame.as_mut() {
                    hook(self.timing.frame());
                }
                if let Some(parity) = self.scanline.start_frame(&mut self.sender) {
                    self.hw.feed_pixels(self.pixel_channel, parity);
                }
            }
        }

        if self.hw.take_irq(self.pixel_channel) {
            let parity = self.scanline.on_line_complete(&mut self.sender);
            self.hw.feed_pixels(self.pixel_channel, parity);
        }
    }

    #[must_use]
    pub const fn params(&self) -> &VgaParams {
        &self.params
    }

    #[must_use]
    pub const fn timing(&self) -> &TimingGenerator {
        &self.timing
    }

    #[must_use]
    pub const fn scanline(&self) -> &ScanlinePipeline {
        &self.scanline
    }

    #[must_use]
    pub const fn sender(&self) -> &LineSender {
        &self.sender
    }

    #[must_use]
    pub const fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn set_end_of_frame(&mut self, hook: FrameHook) {
        self.end_of_frame = Some(hook);
    }

    pub fn set_end_of_scanline(&mut self, hook: ScanlineHook) {
        self.end_of_scanline = Some(hook);
    }
}

const QUERY_PATHS: &[&str] = &[
    "timing.line",
    "timing.frame",
    "scanline.display_line",
    "scanline.armed",
    "requests.sent",
    "requests.dropped",
    "render.lines",
];

impl<H: ScanoutHardware> Observable for Vga<H> {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "timing.line" => Some(self.timing.line().into()),
            "timing.frame" => Some(self.timing.frame().into()),
            "scanline.display_line" => Some(self.scanline.display_line().into()),
            "scanline.armed" => Some(Value::U8(self.scanline.armed().index() as u8)),
            "requests.sent" => Some(self.sender.sent().into()),
            "requests.dropped" => Some(self.sender.dropped().into()),
            "render.lines" => Some(self.buffers.published().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}

/// Start scanout on `hw` with `renderer` running on its own thread.
pub fn launch<H, R>(hw: H, init: VgaInitParams, renderer: R) -> Result<(Vga<H>, JoinHandle<()>), VgaError>
where
    H: ScanoutHardware,
    R: ScanlineRenderer + 'static,
{
    let params = init.video_params()?;
    let buffers = Arc::new(ScanlineBuffers::new(params.h_virtual_pixels as usize));
    let (sender, receiver) = line_channel(LINE_FIFO_DEPTH);
    let vga = Vga::new(hw, init, sender, Arc::clone(&buffers))?;
    let handle = spawn_render_core(RenderCore::new(receiver, buffers, params, renderer))?;
    Ok((vga, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SequenceKind, SimulatedScanout};

    fn start(hw: SimulatedScanout, scale: u32) -> Result<Vga<SimulatedScanout>, VgaError> {
        let init = VgaInitParams::new(VgaMode::Vga640x480At60, scale);
        let (tx, _rx) = line_channel(LINE_FIFO_DEPTH);
        let buffers = Arc::new(ScanlineBuffers::new(320));
        Vga::new(hw, init, tx, buffers)
    }

    #[test]
    fn missing_state_machine_is_fatal() {
        let err = start(SimulatedScanout::with_limits(1, 12), 2).err();
        assert!(matches!(err, Some(VgaError::NoStateMachine("rgb"))));
    }

    #[test]
    fn missing_dma_channel_is_fatal() {
        let err = start(SimulatedScanout::with_limits(4, 1), 2).err();
        assert!(matches!(err, Some(VgaError::NoDmaChannel("pixels"))));
    }

    #[test]
    fn starts_on_vsync_with_even_buffer() {
        let vga = start(SimulatedScanout::new(), 2).unwrap();
        assert!(vga.hardware().is_running());
        assert_eq!(vga.hardware().armed_sequence(), SequenceKind::VSync);
        assert_eq!(vga.hardware().armed_parity(), BufferParity::Even);
        assert_eq!(vga.query("requests.sent"), Some(Value::U64(2)));
        assert_eq!(vga.query("timing.line"), Some(Value::U32(0)));
        assert_eq!(vga.query("no.such.path"), None);
    }

    #[test]
    fn irq_without_completion_does_nothing() {
        let mut vga = start(SimulatedScanout::new(), 2).unwrap();
        vga.handle_irq();
        assert_eq!(vga.timing().line(), 0);
    }

    #[test]
    fn sequence_follows_line_band() {
        let mut vga = start(SimulatedScanout::new(), 2).unwrap();
        let mut kinds = Vec::new();
        for _ in 0..525 {
            let line = vga.hardware_mut().scan_line().unwrap();
            kinds.push(line.sequence);
            vga.handle_irq();
        }
        assert_eq!(kinds[0], SequenceKind::VSync);
        assert_eq!(kinds[1], SequenceKind::VSync);
        assert_eq!(kinds[2], SequenceKind::Porch);
        assert_eq!(kinds[35], SequenceKind::Active);
        assert_eq!(kinds[514], SequenceKind::Active);
        assert_eq!(kinds[515], SequenceKind::Porch);
        assert_eq!(kinds.iter().filter(|k| **k == SequenceKind::Active).count(), 480);
        assert_eq!(vga.hardware().armed_sequence(), SequenceKind::VSync);
        assert_eq!(vga.timing().frame(), 1);
    }
}
