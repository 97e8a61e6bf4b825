//! CPU clock configuration.

use std::time::Duration;

use crate::Cycles;

/// The emulated CPU clock.
///
/// The scheduler runs the CPU in wall-clock quanta; this converts a quantum
/// into the number of CPU cycles it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuClock {
    /// Clock frequency in Hz (e.g., `3_686_400`, half of a 7.3728 MHz crystal).
    pub frequency_hz: u64,
}

impl CpuClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Whole cycles elapsed in `period` (truncating).
    #[must_use]
    pub fn cycles_in(&self, period: Duration) -> Cycles {
        let cycles = u128::from(self.frequency_hz) * period.as_nanos() / 1_000_000_000;
        Cycles::new(u64::try_from(cycles).unwrap_or(u64::MAX))
    }

    /// Wall-clock time taken by `cycles`.
    #[must_use]
    pub fn duration_of(&self, cycles: Cycles) -> Duration {
        if self.frequency_hz == 0 {
            return Duration::ZERO;
        }
        let nanos = u128::from(cycles.get()) * 1_000_000_000 / u128::from(self.frequency_hz);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}
