//! Memory and I/O bus interface.

/// The 16-bit system bus seen by the CPU.
///
/// Address decoding, port routing and any device side effects (interrupt
/// lines, queue pops) happen behind `read` and `write`. Neither can fail: an
/// address nothing answers reads as a fixed default and swallows writes.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte without side effects.
    ///
    /// Used by debuggers and observers. Ports whose reads have side effects
    /// return their current value without consuming anything.
    fn peek(&self, address: u16) -> u8;
}
