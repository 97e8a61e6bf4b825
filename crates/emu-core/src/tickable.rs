//! Trait for components clocked by the CPU clock.

use crate::Cycles;

/// A component that advances in CPU clock cycles.
///
/// The timer chip is driven this way: the scheduler runs the CPU for a
/// quantum, then catches the chip up by the same number of cycles.
pub trait Tickable {
    /// Advance the component by one cycle.
    fn tick(&mut self);

    /// Advance the component by `count` cycles.
    ///
    /// Default implementation calls `tick()` in a loop. Components with
    /// closed-form counters should override it.
    fn tick_n(&mut self, count: Cycles) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
