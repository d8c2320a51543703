use core::fmt;

use crate::Error;

/// Everything emitted on the report channel. Each report renders as one text line, without the
/// line terminator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Report {
    /// Response latency in capture ticks.
    Latency(u16),
    Timeout,
    Spurious,
    /// Pulse width in capture ticks.
    Width(u16),
    Banner,
    Stopped,
    StartingLatency,
    StartingLevel,
    Resetting(u8),
    ProfileSelected { index: u8, name: &'static str },
    InvalidSetting,
    InvalidBoard(u8),
    Busy,
    PinFault,
}

impl From<Error> for Report {
    fn from(err: Error) -> Self {
        match err {
            Error::Timeout => Self::Timeout,
            Error::SpuriousCapture => Self::Spurious,
            Error::InvalidProfileSelection(_)
            | Error::InvalidProfile { .. } => Self::InvalidSetting,
            Error::InvalidBoard(board) => Self::InvalidBoard(board),
            Error::Busy => Self::Busy,
            Error::Pin(_) => Self::PinFault,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latency(ticks) | Self::Width(ticks) => write!(f, "{ticks}"),
            Self::Timeout => f.write_str("TO"),
            Self::Spurious => f.write_str("SP"),
            Self::Banner => {
                f.write_str("Interrupt response Latency Measurement Tool")
            }
            Self::Stopped => f.write_str("Stopped measurement..."),
            Self::StartingLatency => {
                f.write_str("Starting latency measurement...")
            }
            Self::StartingLevel => f.write_str("Starting level measurement..."),
            Self::Resetting(board) => write!(f, "Resetting board {board}"),
            Self::ProfileSelected { index, name } => {
                write!(f, "Setting {index} ({name})")
            }
            Self::InvalidSetting => f.write_str("Invalid setting"),
            Self::InvalidBoard(board) => write!(f, "Invalid board {board}"),
            Self::Busy => f.write_str("Busy"),
            Self::PinFault => f.write_str("Pin fault"),
        }
    }
}
