use embedded_hal::digital;

/// Conditions surfaced by the measurement engine.
///
/// None of these are fatal. They are reported on the report channel and the measurement cycle
/// continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("No response before timeout")]
    Timeout,
    #[error("Spurious capture")]
    SpuriousCapture,
    #[error("Invalid profile selection: {0}")]
    InvalidProfileSelection(u8),
    #[error("Invalid profile: timeout {timeout_ticks} must precede fire {fire_tick}")]
    InvalidProfile { timeout_ticks: u8, fire_tick: u8 },
    #[error("Invalid board: {0}")]
    InvalidBoard(u8),
    #[error("Measurement running")]
    Busy,
    #[error("Pin: {0:?}")]
    Pin(digital::ErrorKind),
}

impl Error {
    pub(crate) fn pin<E: digital::Error>(err: E) -> Self {
        Self::Pin(err.kind())
    }
}
