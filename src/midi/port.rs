use std::error::Error;
use std::fmt;

/// Custom error type for MIDI port operations
#[derive(Debug)]
pub enum PortError {
    /// The backend could not be initialized
    Init(String),
    /// Requested port index does not exist
    InvalidIndex { index: usize, available: usize },
    /// Operation needs a port that has not been opened
    NotOpen,
    /// Error when connecting to a MIDI port
    Connection(String),
    /// Error when sending bytes
    Send(String),
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortError::Init(msg) => write!(f, "MIDI backend error: {}", msg),
            PortError::InvalidIndex { index, available } => write!(
                f,
                "Invalid MIDI port ID {} ({} port(s) available)",
                index, available
            ),
            PortError::NotOpen => write!(f, "MIDI port not open"),
            PortError::Connection(msg) => write!(f, "MIDI connection error: {}", msg),
            PortError::Send(msg) => write!(f, "MIDI send error: {}", msg),
        }
    }
}

impl Error for PortError {}

/// Result type for port operations
pub type Result<T> = std::result::Result<T, PortError>;

/// Capability set every MIDI backend provides.
///
/// One value owns at most one input and one output connection. Ports are
/// addressed by their index in [`input_ports`](MidiPort::input_ports) /
/// [`output_ports`](MidiPort::output_ports).
pub trait MidiPort: Send {
    /// Short name of the backend library
    fn backend_name(&self) -> &'static str;

    /// Version string of the backend library
    fn backend_version(&self) -> String;

    /// Names of the available input ports, in index order
    fn input_ports(&self) -> Vec<String>;

    /// Names of the available output ports, in index order
    fn output_ports(&self) -> Vec<String>;

    /// Opens input `index`; succeeds without reopening when already open
    fn open_input(&mut self, index: usize) -> Result<()>;

    /// Opens output `index`; succeeds without reopening when already open
    fn open_output(&mut self, index: usize) -> Result<()>;

    fn close_input(&mut self);

    fn close_output(&mut self);

    fn input_port_name(&self) -> Option<String>;

    fn output_port_name(&self) -> Option<String>;

    /// Writes raw bytes to the open output
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Waits up to one poll interval for the next raw input message.
    ///
    /// `None` means nothing arrived (or no input is open); it is not an error.
    fn receive(&mut self) -> Option<Vec<u8>>;
}

impl<P: MidiPort + ?Sized> MidiPort for Box<P> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn backend_version(&self) -> String {
        (**self).backend_version()
    }

    fn input_ports(&self) -> Vec<String> {
        (**self).input_ports()
    }

    fn output_ports(&self) -> Vec<String> {
        (**self).output_ports()
    }

    fn open_input(&mut self, index: usize) -> Result<()> {
        (**self).open_input(index)
    }

    fn open_output(&mut self, index: usize) -> Result<()> {
        (**self).open_output(index)
    }

    fn close_input(&mut self) {
        (**self).close_input()
    }

    fn close_output(&mut self) {
        (**self).close_output()
    }

    fn input_port_name(&self) -> Option<String> {
        (**self).input_port_name()
    }

    fn output_port_name(&self) -> Option<String> {
        (**self).output_port_name()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        (**self).receive()
    }
}
