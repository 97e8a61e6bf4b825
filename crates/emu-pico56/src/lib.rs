//! pico56: a 65C02 machine with a VIA timer, a TMS9918 video chip and two
//! AY-3-8910 sound chips, run in real time.
//!
//! The CPU sees 64 KiB: RAM from `0x0000`, a 256-port I/O window at
//! `0x7F00` and ROM in the top half. Devices that can interrupt each own
//! one bit of a shared register; the CPU's IRQ input is asserted whenever
//! any bit is set.
//!
//! The CPU core and the chip internals live elsewhere and plug in through
//! [`emu_core::Cpu`] and the traits in [`chips`].

mod bus;
pub mod chips;
pub mod config;
mod controller;
mod error;
mod file_ports;
mod interrupts;
mod keyboard;
mod machine;
pub mod scheduler;
mod uart;

pub use bus::{BusContext, Devices};
pub use chips::{Detached, PsgPort, SoundChip, TimerChip, VideoChip};
pub use config::MachineConfig;
pub use controller::{ControllerDevice, DualController, deinterleave};
pub use error::MachineError;
pub use file_ports::{FilePorts, FileSource, HostDirectory, MemoryFiles};
pub use interrupts::{InterruptRegister, IrqLine};
pub use keyboard::{LockKeys, Ps2Device, Ps2Keyboard, ScancodeQueue, decode_frame, encode_frame};
pub use machine::{Pico56, Pico56Builder, QuantumReport, vector};
pub use scheduler::{FakeClock, MonotonicClock, Pacing, SchedulerState, SystemClock};
pub use uart::{SerialDevice, Uart};
