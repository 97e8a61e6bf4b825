//! Machine configuration and the fixed memory map.

use std::time::Duration;

use emu_core::CpuClock;

use crate::MachineError;

/// CPU clock: half of a 7.3728 MHz crystal.
pub const CPU_CLOCK_HZ: u64 = 3_686_400;

/// Wall-clock length of one scheduler quantum.
pub const QUANTUM: Duration = Duration::from_micros(50);

/// 65C02 `WAI`.
pub const WAI_OPCODE: u8 = 0xCB;

/// First address past RAM.
pub const RAM_END: u16 = 0x7F00;
pub const IO_START: u16 = 0x7F00;
pub const IO_END: u16 = 0x7FFF;
pub const ROM_START: u16 = 0x8000;
pub const MAX_ROM_SIZE: usize = 0x8000;

/// I/O port offsets (low byte of the address within the I/O window).
pub mod port {
    pub const VDP_DATA: u8 = 0x10;
    pub const VDP_CONTROL: u8 = 0x11;
    pub const UART_CONTROL: u8 = 0x20;
    pub const UART_DATA: u8 = 0x21;
    pub const FILE_DATA: u8 = 0x30;
    pub const FILE_CONTROL: u8 = 0x31;
    pub const PSG_A: u8 = 0x40;
    pub const PSG_B: u8 = 0x44;
    pub const KEYBOARD_DATA: u8 = 0x80;
    pub const KEYBOARD_STATUS: u8 = 0x81;
    pub const CONTROLLER_1: u8 = 0x82;
    pub const CONTROLLER_2: u8 = 0x83;
    pub const IRQ_STATUS: u8 = 0xDF;
    /// The timer chip answers on `0xF0..=0xFF`.
    pub const VIA: u8 = 0xF0;
    pub const VIA_MASK: u8 = 0xF0;

    /// Offsets within a sound chip's block.
    pub const PSG_LATCH: u8 = 0x00;
    pub const PSG_WRITE: u8 = 0x01;
    pub const PSG_READ: u8 = 0x02;
}

/// Machine configuration.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// ROM image, mapped at `0x8000`. Its size must be a power of two no
    /// larger than 32 KiB; smaller images are mirrored.
    pub rom: Vec<u8>,
    pub clock: CpuClock,
    pub quantum: Duration,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            rom: vec![0xFF; MAX_ROM_SIZE],
            clock: CpuClock::new(CPU_CLOCK_HZ),
            quantum: QUANTUM,
        }
    }
}

impl MachineConfig {
    #[must_use]
    pub fn with_rom(rom: Vec<u8>) -> Self {
        Self {
            rom,
            ..Self::default()
        }
    }

    /// Check the ROM image fits the memory map.
    pub fn validate(&self) -> Result<(), MachineError> {
        let size = self.rom.len();
        if size == 0 || size > MAX_ROM_SIZE || !size.is_power_of_two() {
            return Err(MachineError::InvalidRom { size });
        }
        Ok(())
    }
}
