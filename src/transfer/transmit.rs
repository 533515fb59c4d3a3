use super::TransferProgress;
use crate::midi::MidiPort;
use crate::sysex::{extract_next, hex_line, wire_time, SysexError};
use log::{debug, info};
use std::thread;
use std::time::Instant;

/// Sends every complete message of `buffer` through `port`.
///
/// `should_abort` is checked before each message, never in the middle of
/// one. After each write the call sleeps for whatever is left of the
/// message's wire time, so a backend that queues writes cannot overrun the
/// receiving device. Returns `Ok(true)` once all messages went out and
/// `Ok(false)` when aborted.
pub fn transmit<P, F, A>(
    port: &mut P,
    buffer: &[u8],
    mut on_progress: F,
    should_abort: A,
) -> Result<bool, SysexError>
where
    P: MidiPort + ?Sized,
    F: FnMut(TransferProgress),
    A: Fn() -> bool,
{
    let mut offset = 0;
    let mut progress = TransferProgress::default();

    while let Some((next_offset, message)) = extract_next(buffer, offset) {
        if should_abort() {
            info!(
                "Transmit aborted after {} message(s), {} bytes",
                progress.messages, progress.bytes
            );
            return Ok(false);
        }

        debug!("TX ({}): {}", message.len(), hex_line(message.as_bytes()));

        let started = Instant::now();
        port.send(message.as_bytes())?;
        let expected = wire_time(message.len());
        let elapsed = started.elapsed();
        if elapsed < expected {
            thread::sleep(expected - elapsed);
        }

        progress.messages += 1;
        progress.bytes += message.len();
        on_progress(progress);

        offset = next_offset;
    }

    info!(
        "Transmit completed: {} message(s), {} bytes",
        progress.messages, progress.bytes
    );
    Ok(true)
}
