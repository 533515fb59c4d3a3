//! MIDI port access for sysex-io
//!
//! This module provides the port abstraction the transfer engine talks to:
//! - [`MidiPort`] trait with the capability set every backend offers
//! - [`MidirPort`] for real MIDI devices via midir
//! - [`MockPort`] for tests and dry runs
//!
//! The backend is chosen at startup from configuration and handed to
//! [`create_port`]; nothing else in the crate names a concrete backend.
//!
pub mod midir_port;
pub mod mock_port;
mod port;

pub use port::{MidiPort, PortError, Result};

pub use midir_port::MidirPort;
pub use mock_port::{MockPort, SentLog};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Available MIDI backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Midir,
    Mock,
}

impl Default for Backend {
    #[cfg(not(feature = "test-mock"))]
    fn default() -> Self {
        Backend::Midir
    }

    #[cfg(feature = "test-mock")]
    fn default() -> Self {
        Backend::Mock
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "midir" => Ok(Backend::Midir),
            "mock" => Ok(Backend::Mock),
            other => Err(format!(
                "Unknown MIDI backend '{}' (expected 'midir' or 'mock')",
                other
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Midir => write!(f, "midir"),
            Backend::Mock => write!(f, "mock"),
        }
    }
}

/// Creates a closed port for `backend`
pub fn create_port(
    backend: Backend,
    client_name: &str,
    poll_interval: Duration,
) -> Box<dyn MidiPort> {
    log::debug!("Creating {} MIDI port for client '{}'", backend, client_name);
    match backend {
        Backend::Midir => Box::new(MidirPort::new(client_name, poll_interval)),
        Backend::Mock => Box::new(MockPort::new().with_poll_interval(poll_interval)),
    }
}
