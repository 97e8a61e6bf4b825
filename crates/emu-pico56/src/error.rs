use thiserror::Error;

/// Start-up failures.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("no CPU core attached")]
    MissingCpu,

    #[error("ROM image of {size} bytes is not a power of two up to 32 KiB")]
    InvalidRom { size: usize },
}
