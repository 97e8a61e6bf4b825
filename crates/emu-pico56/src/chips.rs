//! Handles for the chips emulated outside this crate.
//!
//! The timer (VIA), video (TMS9918) and sound (AY-3-8910) chips are driven
//! through these traits; their internals live with whoever implements them.

use emu_core::Tickable;

use crate::config::port;

/// VIA-style timer and I/O chip. Registers are `0x0..=0xF`.
pub trait TimerChip: Tickable {
    fn read(&mut self, register: u8) -> u8;
    fn write(&mut self, register: u8, value: u8);

    /// Level of the chip's IRQ output.
    fn irq_active(&self) -> bool;
}

/// TMS9918-style video display processor.
pub trait VideoChip {
    fn write_data(&mut self, value: u8);
    fn write_address(&mut self, value: u8);
    fn read_data(&mut self) -> u8;

    /// Read the status register. Clears the frame flag.
    fn read_status(&mut self) -> u8;

    /// The chip has a frame interrupt pending.
    fn interrupt_pending(&self) -> bool;
}

/// AY-3-8910-style sound chip register file.
pub trait SoundChip {
    fn write_register(&mut self, register: u8, value: u8);
    fn read_register(&mut self, register: u8) -> u8;
}

/// A sound chip behind its three ports: register latch, write, read.
pub struct PsgPort {
    chip: Box<dyn SoundChip>,
    latch: u8,
}

impl PsgPort {
    #[must_use]
    pub fn new(chip: Box<dyn SoundChip>) -> Self {
        Self { chip, latch: 0 }
    }

    /// Write at `offset` within the port block.
    pub fn write(&mut self, offset: u8, value: u8) {
        match offset {
            port::PSG_LATCH => self.latch = value,
            port::PSG_WRITE => self.chip.write_register(self.latch, value),
            _ => {}
        }
    }

    /// Read at `offset` within the port block.
    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            port::PSG_READ => self.chip.read_register(self.latch),
            _ => 0,
        }
    }

    #[must_use]
    pub const fn latch(&self) -> u8 {
        self.latch
    }
}

/// Stands in for a chip or device that is not fitted. Reads 0, ignores
/// writes, never interrupts, never produces input.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Tickable for Detached {
    fn tick(&mut self) {}

    fn tick_n(&mut self, _count: emu_core::Cycles) {}
}

impl TimerChip for Detached {
    fn read(&mut self, _register: u8) -> u8 {
        0
    }

    fn write(&mut self, _register: u8, _value: u8) {}

    fn irq_active(&self) -> bool {
        false
    }
}

impl VideoChip for Detached {
    fn write_data(&mut self, _value: u8) {}

    fn write_address(&mut self, _value: u8) {}

    fn read_data(&mut self) -> u8 {
        0
    }

    fn read_status(&mut self) -> u8 {
        0
    }

    fn interrupt_pending(&self) -> bool {
        false
    }
}

impl SoundChip for Detached {
    fn write_register(&mut self, _register: u8, _value: u8) {}

    fn read_register(&mut self, _register: u8) -> u8 {
        0
    }
}

impl crate::Ps2Device for Detached {
    fn read_frame(&mut self) -> Option<u32> {
        None
    }

    fn write_frame(&mut self, _frame: u32) {}
}

impl crate::ControllerDevice for Detached {
    fn read(&mut self) -> Option<u16> {
        None
    }
}

impl crate::SerialDevice for Detached {
    fn read_byte(&mut self) -> Option<u8> {
        None
    }

    fn write_byte(&mut self, _byte: u8) {}
}

impl crate::FileSource for Detached {
    fn open(&mut self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Registers([u8; 16]);

    impl SoundChip for Registers {
        fn write_register(&mut self, register: u8, value: u8) {
            self.0[usize::from(register & 0x0F)] = value;
        }

        fn read_register(&mut self, register: u8) -> u8 {
            self.0[usize::from(register & 0x0F)]
        }
    }

    #[test]
    fn psg_latch_selects_register() {
        let mut psg = PsgPort::new(Box::new(Registers::default()));
        psg.write(port::PSG_LATCH, 7);
        psg.write(port::PSG_WRITE, 0x38);
        psg.write(port::PSG_LATCH, 8);
        psg.write(port::PSG_WRITE, 0x0F);

        psg.write(port::PSG_LATCH, 7);
        assert_eq!(psg.read(port::PSG_READ), 0x38);
        assert_eq!(psg.read(port::PSG_LATCH), 0);
        assert_eq!(psg.latch(), 7);
    }
}
