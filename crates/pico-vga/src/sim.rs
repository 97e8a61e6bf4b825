//! Host-side stand-in for the PIO and DMA blocks.
//!
//! Each [`SimulatedScanout::scan_line`] plays one line: it reads the armed
//! sync sequence, copies the armed row buffer out if the sequence releases
//! pixels, and raises the completion flags the interrupt handler polls.
//! Visible rows are collected into a [`Frame`] that is closed on the next
//! vertical sync line.

use std::sync::Arc;

use crate::command::{AuxInstruction, TimingCommand};
use crate::{
    BufferParity, DmaChannel, HorizontalPhase, PixelConfig, ScanlineBuffers, ScanoutHardware, SequenceKind,
    StateMachine, SyncSequences,
};

const STATE_MACHINES: u8 = 4;
const DMA_CHANNELS: u8 = 12;

/// One completed picture, RGB444 per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u16>,
}

impl Frame {
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// What one simulated line did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLine {
    pub sequence: SequenceKind,
    pub words: [u32; 4],
    /// Buffer shifted out, if the line carried pixels.
    pub pixels: Option<BufferParity>,
}

impl ScannedLine {
    #[must_use]
    pub fn command(&self, phase: HorizontalPhase) -> Option<TimingCommand> {
        TimingCommand::from_word(self.words[phase as usize])
    }
}

struct SyncSetup {
    channel: DmaChannel,
    sequences: SyncSequences,
}

struct PixelSetup {
    channel: DmaChannel,
    width: usize,
    repeat: usize,
    buffers: Arc<ScanlineBuffers>,
}

pub struct SimulatedScanout {
    free_state_machines: u8,
    free_channels: u8,
    claimed_state_machines: u8,
    claimed_channels: u8,
    sync: Option<SyncSetup>,
    pixels: Option<PixelSetup>,
    running: bool,
    armed_sequence: SequenceKind,
    armed_parity: BufferParity,
    sync_pending: bool,
    pixel_pending: bool,
    row: Vec<u16>,
    frame: Vec<u16>,
    frame_rows: u32,
    last_frame: Option<Frame>,
    frames: u64,
    lines: u64,
}

impl Default for SimulatedScanout {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedScanout {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(STATE_MACHINES, DMA_CHANNELS)
    }

    /// A scanout with only `state_machines` and `channels` free.
    #[must_use]
    pub fn with_limits(state_machines: u8, channels: u8) -> Self {
        Self {
            free_state_machines: state_machines,
            free_channels: channels,
            claimed_state_machines: 0,
            claimed_channels: 0,
            sync: None,
            pixels: None,
            running: false,
            armed_sequence: SequenceKind::VSync,
            armed_parity: BufferParity::Even,
            sync_pending: false,
            pixel_pending: false,
            row: Vec::new(),
            frame: Vec::new(),
            frame_rows: 0,
            last_frame: None,
            frames: 0,
            lines: 0,
        }
    }

    /// Play one line. Returns `None` until both programs are configured and
    /// started.
    pub fn scan_line(&mut self) -> Option<ScannedLine> {
        if !self.running {
            return None;
        }
        let words = *self.sync.as_ref()?.sequences.get(self.armed_sequence);
        let sequence = self.armed_sequence;

        if sequence == SequenceKind::VSync && self.frame_rows > 0 {
            self.close_frame();
        }

        let starts_pixels = TimingCommand::from_word(words[HorizontalPhase::Active as usize])
            .is_some_and(|cmd| cmd.exec == AuxInstruction::StartPixels);
        let pixels = if starts_pixels {
            let parity = self.armed_parity;
            self.shift_out(parity);
            self.pixel_pending = true;
            Some(parity)
        } else {
            None
        };

        self.sync_pending = true;
        self.lines += 1;
        Some(ScannedLine {
            sequence,
            words,
            pixels,
        })
    }

    fn shift_out(&mut self, parity: BufferParity) {
        let Some(setup) = &self.pixels else {
            return;
        };
        self.row.resize(setup.width, 0);
        setup.buffers.copy_out(parity, &mut self.row);
        for &px in &self.row {
            self.frame.extend(std::iter::repeat_n(px, setup.repeat));
        }
        self.frame_rows += 1;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn close_frame(&mut self) {
        let width = self.pixels.as_ref().map_or(0, |p| p.width * p.repeat) as u32;
        self.last_frame = Some(Frame {
            width,
            height: self.frame_rows,
            pixels: std::mem::take(&mut self.frame),
        });
        self.frame_rows = 0;
        self.frames += 1;
        log::trace!("frame {} captured", self.frames);
    }

    /// The most recently completed frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn lines(&self) -> u64 {
        self.lines
    }

    #[must_use]
    pub const fn armed_parity(&self) -> BufferParity {
        self.armed_parity
    }

    #[must_use]
    pub const fn armed_sequence(&self) -> SequenceKind {
        self.armed_sequence
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}

impl ScanoutHardware for SimulatedScanout {
    fn claim_state_machine(&mut self) -> Option<StateMachine> {
        if self.claimed_state_machines >= self.free_state_machines {
            return None;
        }
        let sm = StateMachine(self.claimed_state_machines);
        self.claimed_state_machines += 1;
        Some(sm)
    }

    fn claim_dma_channel(&mut self) -> Option<DmaChannel> {
        if self.claimed_channels >= self.free_channels {
            return None;
        }
        let ch = DmaChannel(self.claimed_channels);
        self.claimed_channels += 1;
        Some(ch)
    }

    fn configure_sync(&mut self, _sm: StateMachine, channel: DmaChannel, _divider: f32, sequences: &SyncSequences) {
        self.sync = Some(SyncSetup {
            channel,
            sequences: sequences.clone(),
        });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn configure_pixels(
        &mut self,
        _sm: StateMachine,
        channel: DmaChannel,
        config: &PixelConfig,
        buffers: Arc<ScanlineBuffers>,
    ) {
        self.armed_parity = config.initial;
        self.pixels = Some(PixelSetup {
            channel,
            width: config.width as usize,
            repeat: config.repeat.max(1) as usize,
            buffers,
        });
    }

    fn start(&mut self) {
        self.running = self.sync.is_some() && self.pixels.is_some();
        if !self.running {
            log::warn!("scanout started before both programs were configured");
        }
    }

    fn take_irq(&mut self, channel: DmaChannel) -> bool {
        let pending = if self.sync.as_ref().is_some_and(|s| s.channel == channel) {
            &mut self.sync_pending
        } else if self.pixels.as_ref().is_some_and(|p| p.channel == channel) {
            &mut self.pixel_pending
        } else {
            return false;
        };
        std::mem::take(pending)
    }

    fn feed_sync(&mut self, _channel: DmaChannel, sequence: SequenceKind) {
        self.armed_sequence = sequence;
    }

    fn feed_pixels(&mut self, _channel: DmaChannel, parity: BufferParity) {
        self.armed_parity = parity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pools_are_finite() {
        let mut hw = SimulatedScanout::with_limits(1, 2);
        assert_eq!(hw.claim_state_machine(), Some(StateMachine(0)));
        assert_eq!(hw.claim_state_machine(), None);
        assert_eq!(hw.claim_dma_channel(), Some(DmaChannel(0)));
        assert_eq!(hw.claim_dma_channel(), Some(DmaChannel(1)));
        assert_eq!(hw.claim_dma_channel(), None);
    }

    #[test]
    fn idle_until_started() {
        let mut hw = SimulatedScanout::new();
        assert_eq!(hw.scan_line(), None);
        hw.start();
        assert!(!hw.is_running());
        assert_eq!(hw.scan_line(), None);
    }

    #[test]
    fn unknown_channel_has_no_irq() {
        let mut hw = SimulatedScanout::new();
        assert!(!hw.take_irq(DmaChannel(7)));
    }
}
