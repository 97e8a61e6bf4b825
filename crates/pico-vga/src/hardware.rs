use std::sync::Arc;

use crate::{BufferParity, ScanlineBuffers, SequenceKind, SyncSequences};

/// A claimed PIO state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateMachine(pub u8);

/// A claimed DMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DmaChannel(pub u8);

/// How the RGB program is clocked and fed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelConfig {
    pub divider: f32,
    /// Delay slot per scaled pixel, in PIO clocks.
    pub delay: u32,
    /// Logical pixels per line.
    pub width: u32,
    /// Physical pixels each logical pixel is held for.
    pub repeat: u32,
    /// Buffer the pixel DMA reads first.
    pub initial: BufferParity,
}

/// The programmable I/O and DMA blocks the output runs on.
///
/// Claims hand out exclusive resources and return `None` when the pool is
/// exhausted. Feeds are called from interrupt context and must not block.
pub trait ScanoutHardware {
    fn claim_state_machine(&mut self) -> Option<StateMachine>;
    fn claim_dma_channel(&mut self) -> Option<DmaChannel>;

    /// Load the sync program and point `channel` at its TX FIFO, four words
    /// per transfer.
    fn configure_sync(&mut self, sm: StateMachine, channel: DmaChannel, divider: f32, sequences: &SyncSequences);

    /// Load the RGB program and point `channel` at the row buffers.
    fn configure_pixels(
        &mut self,
        sm: StateMachine,
        channel: DmaChannel,
        config: &PixelConfig,
        buffers: Arc<ScanlineBuffers>,
    );

    /// Start both programs and enable the completion interrupts.
    fn start(&mut self);

    /// Check and acknowledge the completion flag of `channel`.
    fn take_irq(&mut self, channel: DmaChannel) -> bool;

    /// Re-arm the sync channel with a sequence.
    fn feed_sync(&mut self, channel: DmaChannel, sequence: SequenceKind);

    /// Re-arm the pixel channel with a row buffer.
    fn feed_pixels(&mut self, channel: DmaChannel, parity: BufferParity);
}
