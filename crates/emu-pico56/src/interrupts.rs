//! The interrupt register: one bit per device, CPU IRQ asserted while any
//! bit is set.

/// Devices that can request an interrupt, by bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqLine {
    Vdp = 0,
    Keyboard = 1,
    Uart = 2,
    Via = 3,
}

impl IrqLine {
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptRegister(u8);

impl InterruptRegister {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn raise(&mut self, line: IrqLine) {
        self.0 |= line.mask();
    }

    pub fn release(&mut self, line: IrqLine) {
        self.0 &= !line.mask();
    }

    pub fn set_or_clear(&mut self, line: IrqLine, pending: bool) {
        if pending {
            self.raise(line);
        } else {
            self.release(line);
        }
    }

    #[must_use]
    pub const fn current(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_pending(self, line: IrqLine) -> bool {
        self.0 & line.mask() != 0
    }

    /// Level of the CPU's IRQ input.
    #[must_use]
    pub const fn asserted(self) -> bool {
        self.0 != 0
    }
}
