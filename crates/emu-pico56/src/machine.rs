//! Top-level pico56 system.
//!
//! The CPU runs at 3.6864 MHz in 50 µs quanta, i.e. 184 cycles per quantum.
//! After each burst the timer chip is caught up by the same budget, the
//! host devices are polled and the CPU's IRQ input is refreshed from the
//! interrupt register. Only then does the scheduler wait for wall-clock
//! time to catch up.

use emu_core::{Bus, Cpu, Cycles, Observable, Tickable, Value};

use crate::bus::{BusContext, Devices};
use crate::chips::Detached;
use crate::config::MachineConfig;
use crate::error::MachineError;
use crate::interrupts::IrqLine;
use crate::keyboard::{Ps2Device, Ps2Keyboard};
use crate::scheduler::{BurstBudget, MonotonicClock, Pacer, Pacing, SchedulerState, SystemClock};

/// What one quantum did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantumReport {
    pub steps: u32,
    /// Cycles charged to this quantum, including the carry it started with.
    pub cycles: Cycles,
    pub waited: bool,
    /// Overshoot charged to the next quantum.
    pub carry: Cycles,
    pub pacing: Pacing,
}

/// Assembles a [`Pico56`]. The CPU core is mandatory.
pub struct Pico56Builder<C> {
    config: MachineConfig,
    devices: Devices,
    keyboard: Box<dyn Ps2Device>,
    cpu: Option<C>,
}

impl<C: Cpu<BusContext>> Pico56Builder<C> {
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            devices: Devices::default(),
            keyboard: Box::new(Detached),
            cpu: None,
        }
    }

    #[must_use]
    pub fn cpu(mut self, cpu: C) -> Self {
        self.cpu = Some(cpu);
        self
    }

    #[must_use]
    pub fn devices(mut self, devices: Devices) -> Self {
        self.devices = devices;
        self
    }

    #[must_use]
    pub fn keyboard(mut self, keyboard: Box<dyn Ps2Device>) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Build a machine paced by the host clock.
    ///
    /// # Errors
    ///
    /// [`MachineError::MissingCpu`] without a CPU core,
    /// [`MachineError::InvalidRom`] for a bad ROM image.
    pub fn build(self) -> Result<Pico56<C, SystemClock>, MachineError> {
        self.build_with_clock(SystemClock::new())
    }

    /// Build a machine paced by `clock`.
    ///
    /// # Errors
    ///
    /// As [`Pico56Builder::build`].
    pub fn build_with_clock<K: MonotonicClock>(self, clock: K) -> Result<Pico56<C, K>, MachineError> {
        let cpu = self.cpu.ok_or(MachineError::MissingCpu)?;
        let bus = BusContext::new(&self.config, self.devices)?;
        let per_quantum = self.config.clock.cycles_in(self.config.quantum);
        log::info!(
            "pico56: {} byte ROM, {} Hz CPU, {} cycles per {:?} quantum",
            self.config.rom.len(),
            self.config.clock.frequency_hz,
            per_quantum.get(),
            self.config.quantum,
        );
        Ok(Pico56 {
            cpu,
            bus,
            keyboard: Ps2Keyboard::new(self.keyboard),
            budget: BurstBudget::new(per_quantum),
            pacer: Pacer::new(self.config.quantum),
            clock,
            state: SchedulerState::Reset,
            quanta: 0,
        })
    }
}

/// pico56 system.
pub struct Pico56<C, K> {
    cpu: C,
    bus: BusContext,
    keyboard: Ps2Keyboard<Box<dyn Ps2Device>>,
    budget: BurstBudget,
    pacer: Pacer,
    clock: K,
    state: SchedulerState,
    /// Completed quanta.
    quanta: u64,
}

impl<C: Cpu<BusContext>, K: MonotonicClock> Pico56<C, K> {
    /// Run one quantum. The first call resets the CPU and starts the
    /// real-time schedule.
    pub fn run_quantum(&mut self) -> QuantumReport {
        if self.state == SchedulerState::Reset {
            self.cpu.reset(&mut self.bus);
            self.pacer.start(self.clock.now());
            self.state = SchedulerState::Running;
            log::debug!("CPU reset, PC={:#06X}", self.cpu.pc());
        }

        let burst = self.budget.run(&mut self.cpu, &mut self.bus);

        let bus = &mut self.bus;
        bus.via.tick_n(self.budget.per_quantum());
        bus.irq.set_or_clear(IrqLine::Via, bus.via.irq_active());

        self.keyboard.poll(&mut bus.keyboard, &mut bus.irq);

        bus.controllers.poll();
        bus.uart.poll();
        bus.irq.set_or_clear(IrqLine::Uart, bus.uart.irq_active());

        if bus.vdp.interrupt_pending() {
            bus.irq.raise(IrqLine::Vdp);
        }
        self.cpu.set_irq(bus.irq.asserted());

        let pacing = self.pacer.pace(&mut self.clock);
        self.quanta += 1;

        QuantumReport {
            steps: burst.steps,
            cycles: burst.cycles,
            waited: burst.waited,
            carry: self.budget.carry(),
            pacing,
        }
    }

    /// Run `count` quanta.
    pub fn run_quanta(&mut self, count: u64) {
        for _ in 0..count {
            self.run_quantum();
        }
    }

    /// Run forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_quantum();
        }
    }

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &BusContext {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut BusContext {
        &mut self.bus
    }

    #[must_use]
    pub fn keyboard(&self) -> &Ps2Keyboard<Box<dyn Ps2Device>> {
        &self.keyboard
    }

    #[must_use]
    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut K {
        &mut self.clock
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[must_use]
    pub fn quanta(&self) -> u64 {
        self.quanta
    }

    #[must_use]
    pub fn overruns(&self) -> u64 {
        self.pacer.overruns()
    }
}

const QUERY_PATHS: &[&str] = &[
    "cpu.pc",
    "scheduler.running",
    "scheduler.quanta",
    "scheduler.carry",
    "scheduler.overruns",
    "irq",
    "irq.asserted",
    "mem.<addr>",
    "keyboard.pending",
    "keyboard.status",
    "controllers",
    "uart.status",
    "file.status",
];

impl<C: Cpu<BusContext>, K: MonotonicClock> Observable for Pico56<C, K> {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "cpu.pc" => Some(self.cpu.pc().into()),
            "scheduler.running" => Some((self.state == SchedulerState::Running).into()),
            "scheduler.quanta" => Some(self.quanta.into()),
            "scheduler.carry" => Some(self.budget.carry().get().into()),
            "scheduler.overruns" => Some(self.pacer.overruns().into()),
            _ => self.bus.query(path),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}

/// Read a little-endian vector through the bus without side effects.
#[must_use]
pub fn vector(bus: &BusContext, address: u16) -> u16 {
    u16::from_le_bytes([bus.peek(address), bus.peek(address.wrapping_add(1))])
}
