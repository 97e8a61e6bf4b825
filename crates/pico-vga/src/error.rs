use thiserror::Error;

/// Start-up failures. Each one halts initialisation; nothing is retried.
#[derive(Debug, Error)]
pub enum VgaError {
    #[error("no free PIO state machine for the {0} program")]
    NoStateMachine(&'static str),

    #[error("no free DMA channel for {0}")]
    NoDmaChannel(&'static str),

    #[error("{phase} phase is {ticks} PIO clocks, below the {overhead}-clock setup overhead")]
    PhaseTooShort {
        phase: &'static str,
        ticks: u32,
        overhead: u32,
    },

    #[error("{phase} phase needs {ticks} PIO clocks, more than a command word holds ({max})")]
    PhaseTooLong {
        phase: &'static str,
        ticks: u32,
        max: u32,
    },

    #[error("system clock of {available_khz} kHz is below the {required_khz} kHz this mode needs")]
    ClockTooSlow {
        required_khz: u32,
        available_khz: u32,
    },

    #[error("failed to start the render core: {0}")]
    RenderCore(#[from] std::io::Error),
}
