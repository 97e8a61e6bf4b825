//! Core traits and types for the pico56 firmware.
//!
//! The CPU runs in bursts measured in its own clock cycles. Everything that
//! needs to stay in step with it (the timer chip, the scheduler's budget)
//! counts in [`Cycles`] derived from a single [`CpuClock`].

mod bus;
mod clock;
mod cpu;
mod cycles;
mod observable;
mod tickable;

pub use bus::Bus;
pub use clock::CpuClock;
pub use cpu::Cpu;
pub use cycles::Cycles;
pub use observable::{Observable, Value, parse_address};
pub use tickable::Tickable;
