//! Real-time pacing of CPU bursts.
//!
//! The CPU runs in fixed wall-clock quanta. Each quantum it is stepped until
//! it has used the quantum's cycle budget; whatever the last instruction ran
//! over is charged to the next quantum. The loop then waits for the
//! quantum's deadline, or gives up on it if the deadline has already passed.

use std::time::{Duration, Instant};

use emu_core::{Bus, Cpu, Cycles};

use crate::config::WAI_OPCODE;

/// Wall-clock time source.
pub trait MonotonicClock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Wait until `now() >= deadline`.
    fn sleep_until(&mut self, deadline: Duration);
}

/// The host's monotonic clock, waiting with `spin_sleep` for sub-millisecond
/// accuracy.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&mut self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            spin_sleep::sleep(deadline - now);
        }
    }
}

/// Manually driven clock for tests. Sleeping jumps straight to the deadline.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeClock {
    now: Duration,
    slept: Duration,
}

impl FakeClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            slept: Duration::ZERO,
        }
    }

    /// Let `elapsed` pass, as if the host had been busy.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now += elapsed;
    }

    /// Total time spent in `sleep_until`.
    #[must_use]
    pub const fn slept(&self) -> Duration {
        self.slept
    }
}

impl MonotonicClock for FakeClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep_until(&mut self, deadline: Duration) {
        if deadline > self.now {
            self.slept += deadline - self.now;
            self.now = deadline;
        }
    }
}

/// Outcome of waiting for a quantum's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Waited for the deadline.
    OnTime,
    /// The deadline had already passed; the schedule restarts from now.
    Overrun,
}

/// Deadline tracking for fixed quanta.
#[derive(Debug, Clone)]
pub struct Pacer {
    quantum: Duration,
    deadline: Duration,
    overruns: u64,
}

impl Pacer {
    #[must_use]
    pub const fn new(quantum: Duration) -> Self {
        Self {
            quantum,
            deadline: Duration::ZERO,
            overruns: 0,
        }
    }

    /// Start the schedule at `now`.
    pub fn start(&mut self, now: Duration) {
        self.deadline = now;
    }

    /// Advance the deadline by one quantum and wait for it.
    pub fn pace<C: MonotonicClock>(&mut self, clock: &mut C) -> Pacing {
        self.deadline += self.quantum;
        let now = clock.now();
        if self.deadline < now {
            self.deadline = now;
            self.overruns += 1;
            if self.overruns.is_power_of_two() {
                log::warn!("scheduler behind real time ({} overruns)", self.overruns);
            }
            Pacing::Overrun
        } else {
            clock.sleep_until(self.deadline);
            Pacing::OnTime
        }
    }

    #[must_use]
    pub const fn overruns(&self) -> u64 {
        self.overruns
    }

    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Result of one CPU burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    /// Instructions executed.
    pub steps: u32,
    /// Cycles executed, including the carried overshoot.
    pub cycles: Cycles,
    /// The burst ended on wait-for-interrupt.
    pub waited: bool,
}

/// Cycle budget per quantum with overshoot carry.
#[derive(Debug, Clone, Copy)]
pub struct BurstBudget {
    per_quantum: Cycles,
    carry: Cycles,
}

impl BurstBudget {
    #[must_use]
    pub const fn new(per_quantum: Cycles) -> Self {
        Self {
            per_quantum,
            carry: Cycles::ZERO,
        }
    }

    /// Step `cpu` until the budget is used. Wait-for-interrupt ends the
    /// burst at once and clears the carry.
    pub fn run<B: Bus, C: Cpu<B> + ?Sized>(&mut self, cpu: &mut C, bus: &mut B) -> Burst {
        let mut spent = self.carry;
        let mut steps = 0;
        let mut waited = false;
        while spent < self.per_quantum {
            let cycles = cpu.step(bus);
            steps += 1;
            if cpu.current_opcode() == WAI_OPCODE {
                waited = true;
                spent = self.per_quantum;
                break;
            }
            spent += Cycles::from(cycles);
        }
        self.carry = spent - self.per_quantum;
        Burst {
            steps,
            cycles: spent,
            waited,
        }
    }

    #[must_use]
    pub const fn carry(&self) -> Cycles {
        self.carry
    }

    #[must_use]
    pub const fn per_quantum(&self) -> Cycles {
        self.per_quantum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// The CPU has not been reset yet.
    Reset,
    Running,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Executes `cycles` per step, reporting `opcode` after the `wai_at`th.
    struct StubCpu {
        cycles: u32,
        steps: u32,
        wai_at: Option<u32>,
    }

    impl StubCpu {
        fn new(cycles: u32) -> Self {
            Self {
                cycles,
                steps: 0,
                wai_at: None,
            }
        }
    }

    struct NoBus;

    impl Bus for NoBus {
        fn read(&mut self, _address: u16) -> u8 {
            0
        }
        fn write(&mut self, _address: u16, _value: u8) {}
        fn peek(&self, _address: u16) -> u8 {
            0
        }
    }

    impl Cpu<NoBus> for StubCpu {
        fn step(&mut self, _bus: &mut NoBus) -> u32 {
            self.steps += 1;
            self.cycles
        }
        fn current_opcode(&self) -> u8 {
            if self.wai_at == Some(self.steps) { WAI_OPCODE } else { 0xEA }
        }
        fn reset(&mut self, _bus: &mut NoBus) {}
        fn set_irq(&mut self, _asserted: bool) {}
        fn pc(&self) -> u16 {
            0
        }
    }

    #[test]
    fn one_cycle_instructions_fill_the_budget_exactly() {
        let mut budget = BurstBudget::new(Cycles::new(184));
        let mut cpu = StubCpu::new(1);
        let burst = budget.run(&mut cpu, &mut NoBus);
        assert_eq!(burst.steps, 184);
        assert_eq!(budget.carry(), Cycles::ZERO);
    }

    #[test]
    fn overshoot_carries_into_next_burst() {
        let mut budget = BurstBudget::new(Cycles::new(184));
        let mut cpu = StubCpu::new(3);

        let first = budget.run(&mut cpu, &mut NoBus);
        assert_eq!(first.steps, 62);
        assert_eq!(first.cycles, Cycles::new(186));
        assert_eq!(budget.carry(), Cycles::new(2));

        let second = budget.run(&mut cpu, &mut NoBus);
        assert_eq!(second.steps, 61);
        assert_eq!(budget.carry(), Cycles::new(1));
    }

    #[test]
    fn wait_for_interrupt_ends_burst() {
        let mut budget = BurstBudget::new(Cycles::new(184));
        let mut cpu = StubCpu::new(4);
        cpu.wai_at = Some(10);
        let burst = budget.run(&mut cpu, &mut NoBus);
        assert!(burst.waited);
        assert_eq!(burst.steps, 10);
        assert_eq!(budget.carry(), Cycles::ZERO);
    }

    #[test]
    fn pacer_waits_when_ahead() {
        let mut clock = FakeClock::new();
        let mut pacer = Pacer::new(Duration::from_micros(50));
        pacer.start(clock.now());

        clock.advance(Duration::from_micros(20));
        assert_eq!(pacer.pace(&mut clock), Pacing::OnTime);
        assert_eq!(clock.now(), Duration::from_micros(50));
        assert_eq!(clock.slept(), Duration::from_micros(30));
    }

    #[test]
    fn pacer_resets_deadline_when_behind() {
        let mut clock = FakeClock::new();
        let mut pacer = Pacer::new(Duration::from_micros(50));
        pacer.start(clock.now());

        clock.advance(Duration::from_micros(180));
        assert_eq!(pacer.pace(&mut clock), Pacing::Overrun);
        assert_eq!(pacer.deadline(), Duration::from_micros(180));
        assert_eq!(pacer.overruns(), 1);

        // no catch-up burst: the next deadline is one quantum after now
        assert_eq!(pacer.pace(&mut clock), Pacing::OnTime);
        assert_eq!(clock.now(), Duration::from_micros(230));
    }
}
