use num_enum::TryFromPrimitive;

#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
enum Key {
    Halt = b'h',
    Start = b's',
    Level = b'l',
    ResetBoard0 = b'r',
    ResetBoard1 = b't',
}

/// A single-byte command from the command channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Stop,
    StartLatency,
    StartLevel,
    ResetBoard(u8),
    SelectProfile(u8),
}

impl Command {
    /// Decode a received byte. Unrecognized bytes yield `None`.
    pub fn parse(byte: u8) -> Option<Self> {
        if byte.is_ascii_digit() {
            return Some(Self::SelectProfile(byte - b'0'));
        }
        let command = match Key::try_from(byte).ok()? {
            Key::Halt => Self::Stop,
            Key::Start => Self::StartLatency,
            Key::Level => Self::StartLevel,
            Key::ResetBoard0 => Self::ResetBoard(0),
            Key::ResetBoard1 => Self::ResetBoard(1),
        };
        Some(command)
    }
}
