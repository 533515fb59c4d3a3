use super::TransferProgress;
use crate::midi::{MidiPort, PortError};
use crate::sysex::{hex_line, SysexError, SYSEX_END, SYSEX_START};
use log::{debug, error, info};
use std::time::{Duration, Instant};

/// Quiet period after which a started receive session is complete
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Collects SysEx bytes out of raw port reads.
///
/// Bytes outside `0xF0 ... 0xF7` are dropped. Consecutive messages are
/// appended to the same buffer. The idle timer is armed by the first
/// accumulated byte and restarted by every `0xF7`; mid-message bytes leave it
/// alone.
#[derive(Debug)]
pub struct ReceiveAccumulator {
    data: Vec<u8>,
    in_message: bool,
    messages: usize,
    last_activity: Option<Instant>,
    idle_timeout: Duration,
}

impl ReceiveAccumulator {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            data: Vec::new(),
            in_message: false,
            messages: 0,
            last_activity: None,
            idle_timeout,
        }
    }

    /// Feeds one raw read received at `now`.
    ///
    /// Returns the running totals for every message completed by this chunk,
    /// in order.
    pub fn feed(&mut self, chunk: &[u8], now: Instant) -> Vec<TransferProgress> {
        let mut completed = Vec::new();

        for &b in chunk {
            if !self.in_message {
                if b != SYSEX_START {
                    continue;
                }
                self.in_message = true;
                if self.last_activity.is_none() {
                    self.last_activity = Some(now);
                }
            }

            self.data.push(b);

            if b == SYSEX_END {
                self.in_message = false;
                self.messages += 1;
                self.last_activity = Some(now);
                completed.push(self.progress());
            }
        }

        completed
    }

    /// True once data has started and nothing ended a message for longer
    /// than the idle timeout
    pub fn is_complete(&self, now: Instant) -> bool {
        match self.last_activity {
            Some(last) => now.saturating_duration_since(last) > self.idle_timeout,
            None => false,
        }
    }

    pub fn has_started(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn in_message(&self) -> bool {
        self.in_message
    }

    pub fn progress(&self) -> TransferProgress {
        TransferProgress {
            messages: self.messages,
            bytes: self.data.len(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Why a receive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveEnd {
    /// The device went quiet for the idle timeout
    Idle,
    /// `should_stop` asked for the session to end
    Stopped,
}

/// Bytes collected by one [`receive`] session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedDump {
    pub data: Vec<u8>,
    pub end: ReceiveEnd,
}

/// Receives SysEx messages from `port` until the device goes quiet.
///
/// Polls [`MidiPort::receive`] until either the idle timeout expires after
/// data started arriving or `should_stop` returns true. A session that never
/// sees any data only ends through `should_stop`. Whatever was accumulated
/// is returned in both cases.
///
/// The input of `port` must already be open.
pub fn receive<P, F, S>(
    port: &mut P,
    idle_timeout: Duration,
    mut on_progress: F,
    should_stop: S,
) -> Result<ReceivedDump, SysexError>
where
    P: MidiPort + ?Sized,
    F: FnMut(TransferProgress),
    S: Fn() -> bool,
{
    if port.input_port_name().is_none() {
        error!("Receive requested without an open MIDI input");
        return Err(PortError::NotOpen.into());
    }

    let mut acc = ReceiveAccumulator::new(idle_timeout);
    debug!("Receive started, idle timeout {:?}", idle_timeout);

    let end = loop {
        if should_stop() {
            info!("Receive stopped by request");
            break ReceiveEnd::Stopped;
        }

        if let Some(chunk) = port.receive() {
            debug!("RX ({}): {}", chunk.len(), hex_line(&chunk));
            for progress in acc.feed(&chunk, Instant::now()) {
                on_progress(progress);
            }
        }

        if acc.is_complete(Instant::now()) {
            info!("Receive idle for {:?}, session complete", idle_timeout);
            break ReceiveEnd::Idle;
        }
    };

    let progress = acc.progress();
    info!(
        "Received {} message(s), {} bytes",
        progress.messages, progress.bytes
    );
    Ok(ReceivedDump {
        data: acc.into_data(),
        end,
    })
}
