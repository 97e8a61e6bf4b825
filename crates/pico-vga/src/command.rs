//! Sync program command words.
//!
//! The sync state machine autopulls one 32-bit word per horizontal phase:
//!
//! | Bits   | Field                                               |
//! |--------|-----------------------------------------------------|
//! | 0-13   | clocks to hold the pins, less the setup overhead    |
//! | 14     | hsync pin level                                     |
//! | 15     | vsync pin level                                     |
//! | 16-31  | instruction executed at the start of the phase      |
//!
//! The instruction is a no-op except on the active phase of a visible line,
//! where it raises the IRQ that releases the RGB program.

/// Width of the clock-count field.
pub const WORD_TICKS_BITS: u32 = 14;

/// Largest clock count a word can carry.
pub const MAX_PHASE_TICKS: u32 = (1 << WORD_TICKS_BITS) - 1;

/// Bit offset of the two sync pin levels.
pub const WORD_SYNC_OFFSET: u32 = 14;

/// Bit offset of the executed instruction.
pub const WORD_EXEC_OFFSET: u32 = 16;

/// Clocks the sync program spends per phase pulling and decoding a word.
pub const SETUP_OVERHEAD: u32 = 5;

/// PIO IRQ flag the RGB program waits on.
pub const RGB_IRQ: u8 = 4;

/// `mov y, y`
const PIO_NOP: u16 = 0xA042;

/// `irq nowait <n>`
const PIO_IRQ_SET: u16 = 0xC000;

/// Instruction a command word executes when its phase starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxInstruction {
    Nop,
    /// Release the RGB program for this line.
    StartPixels,
}

impl AuxInstruction {
    #[must_use]
    pub const fn encode(self) -> u16 {
        match self {
            Self::Nop => PIO_NOP,
            Self::StartPixels => PIO_IRQ_SET | RGB_IRQ as u16,
        }
    }

    #[must_use]
    pub const fn decode(opcode: u16) -> Option<Self> {
        if opcode == PIO_NOP {
            Some(Self::Nop)
        } else if opcode == PIO_IRQ_SET | RGB_IRQ as u16 {
            Some(Self::StartPixels)
        } else {
            None
        }
    }
}

/// One horizontal phase as the sync program sees it.
///
/// `hsync` and `vsync` are pin levels, already corrected for polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimingCommand {
    pub ticks: u32,
    pub hsync: bool,
    pub vsync: bool,
    pub exec: AuxInstruction,
}

impl TimingCommand {
    /// Pack into the wire word. `ticks` is truncated to the field width.
    #[must_use]
    pub fn to_word(self) -> u32 {
        let pins = u32::from(self.hsync) | (u32::from(self.vsync) << 1);
        (u32::from(self.exec.encode()) << WORD_EXEC_OFFSET)
            | (pins << WORD_SYNC_OFFSET)
            | (self.ticks & MAX_PHASE_TICKS)
    }

    /// Unpack a wire word. Returns `None` for an unknown instruction.
    #[must_use]
    pub fn from_word(word: u32) -> Option<Self> {
        let exec = AuxInstruction::decode((word >> WORD_EXEC_OFFSET) as u16)?;
        let pins = (word >> WORD_SYNC_OFFSET) & 0b11;
        Some(Self {
            ticks: word & MAX_PHASE_TICKS,
            hsync: pins & 0b01 != 0,
            vsync: pins & 0b10 != 0,
            exec,
        })
    }
}

/// Pin level for a sync signal given whether the pulse is asserted and
/// the mode's polarity.
#[must_use]
pub const fn sync_level(asserted: bool, sync_high: bool) -> bool {
    asserted == sync_high
}
