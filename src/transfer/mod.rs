//! SysEx transfer engine
//!
//! Moves SysEx buffers between memory and a [`MidiPort`](crate::midi::MidiPort):
//! - [`transmit`] sends a buffer message by message, paced to the MIDI bitrate
//! - [`receive`] collects messages until the device goes quiet
//! - [`TransferTask`] runs either one on its own thread and reports
//!   [`TransferEvent`]s through a channel
//!
mod receive;
mod task;
mod transmit;

pub use receive::{receive, ReceiveAccumulator, ReceiveEnd, ReceivedDump, DEFAULT_IDLE_TIMEOUT};
pub use task::{TransferEvent, TransferOutcome, TransferTask};
pub use transmit::transmit;

/// Running totals of a transfer, reset when a transfer starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransferProgress {
    /// Complete messages sent or received
    pub messages: usize,
    /// Bytes sent or received
    pub bytes: usize,
}
