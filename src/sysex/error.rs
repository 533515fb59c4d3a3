use crate::midi::PortError;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while loading, saving or transferring SysEx data
#[derive(Debug)]
pub enum SysexError {
    /// The buffer holds no bytes at all
    Empty,
    /// Fewer bytes than the two marker bytes
    TooShort(usize),
    /// First byte is not 0xF0
    MissingStart(u8),
    /// Last byte is not 0xF7
    MissingEnd(u8),
    /// Reading or writing a file failed
    Io { path: PathBuf, source: io::Error },
    /// The MIDI port refused an operation
    Port(PortError),
}

impl SysexError {
    /// True for the malformed-data variants
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SysexError::Empty
                | SysexError::TooShort(_)
                | SysexError::MissingStart(_)
                | SysexError::MissingEnd(_)
        )
    }
}

impl fmt::Display for SysexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SysexError::Empty => write!(f, "No SysEx data found"),
            SysexError::TooShort(len) => write!(f, "Invalid SysEx data: only {} byte(s)", len),
            SysexError::MissingStart(b) => {
                write!(f, "Invalid SysEx data: starts with {:02x} instead of f0", b)
            }
            SysexError::MissingEnd(b) => {
                write!(f, "Invalid SysEx data: ends with {:02x} instead of f7", b)
            }
            SysexError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            SysexError::Port(e) => write!(f, "{}", e),
        }
    }
}

impl Error for SysexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SysexError::Io { source, .. } => Some(source),
            SysexError::Port(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PortError> for SysexError {
    fn from(e: PortError) -> Self {
        SysexError::Port(e)
    }
}
