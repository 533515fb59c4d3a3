//! System Exclusive data handling
//!
//! This module knows what a SysEx message looks like on the wire:
//! - Byte timing of the MIDI serial line
//! - Framing of `0xF0 ... 0xF7` messages out of a larger buffer
//! - Loading, validating and saving `.syx` files
//!
//! The main components are:
//! - [`extract_next`] and [`SysexMessages`] for splitting a buffer into messages
//! - [`wire_time`] for pacing transmission
//! - [`load_sysex_file`] / [`save_sysex_file`] for file I/O
//!
mod error;
pub mod file;
pub mod framer;
pub mod timing;

pub use error::SysexError;
pub use file::{
    ensure_writable_destination, format_size, hex_dump, load_sysex_file, save_sysex_file,
    validate, SysexStats,
};
pub use framer::{count_messages, extract_next, SysexMessage, SysexMessages};
pub use timing::{wire_time, BYTE_TIME, BYTE_TIME_SECONDS, MIDI_BAUDRATE};

/// Start of System Exclusive
pub const SYSEX_START: u8 = 0xF0;

/// End of System Exclusive
pub const SYSEX_END: u8 = 0xF7;

/// Lower-case hex bytes separated by spaces
pub fn hex_line(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
