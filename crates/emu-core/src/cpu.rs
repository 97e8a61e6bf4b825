//! CPU core trait.

use crate::Bus;

/// An instruction-stepped CPU core.
///
/// The core is an opaque state machine: the scheduler only steps it, reads
/// back the opcode it is sitting on and drives its interrupt input. The bus
/// is passed in per step so it stays owned by the machine.
pub trait Cpu<B: Bus> {
    /// Execute one instruction. Returns cycles consumed.
    fn step(&mut self, bus: &mut B) -> u32;

    /// Opcode of the instruction the core is currently executing.
    ///
    /// The scheduler watches this for wait-for-interrupt so it can skip the
    /// rest of a burst instead of spinning the core on a no-op.
    fn current_opcode(&self) -> u8;

    /// Reset the CPU, loading the reset vector through the bus.
    fn reset(&mut self, bus: &mut B);

    /// Drive the level-sensitive IRQ input.
    fn set_irq(&mut self, asserted: bool);

    /// Current program counter.
    fn pc(&self) -> u16;
}
