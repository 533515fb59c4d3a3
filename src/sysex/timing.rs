use std::time::Duration;

/// MIDI serial line speed in bits per second
pub const MIDI_BAUDRATE: u32 = 31_250;

/// Start bit, 8 data bits, stop bit
pub const BITS_PER_BYTE: u32 = 10;

/// Bytes per second that fit on a MIDI cable
pub const MIDI_BYTES_PER_SEC: u32 = MIDI_BAUDRATE / BITS_PER_BYTE;

/// Time one byte occupies on the wire (320µs)
pub const BYTE_TIME_SECONDS: f64 = BITS_PER_BYTE as f64 / MIDI_BAUDRATE as f64;

/// Same as [`BYTE_TIME_SECONDS`], as a `Duration`
pub const BYTE_TIME: Duration = Duration::from_micros(320);

/// Wall time needed to push `len` bytes through a MIDI cable
pub fn wire_time(len: usize) -> Duration {
    BYTE_TIME * len as u32
}
