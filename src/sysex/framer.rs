use super::{SYSEX_END, SYSEX_START};
use std::fmt;

/// One complete System Exclusive message, `0xF0 ... 0xF7`
#[derive(Clone, PartialEq, Eq)]
pub struct SysexMessage(Vec<u8>);

impl SysexMessage {
    /// Wraps `bytes` when they form a complete message
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.len() >= 2 && bytes[0] == SYSEX_START && bytes[bytes.len() - 1] == SYSEX_END {
            Some(SysexMessage(bytes))
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a message carries at least its two marker bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for SysexMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SysexMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SysexMessage({})", super::hex_line(&self.0))
    }
}

/// Extracts the next complete message at or after `offset`.
///
/// Bytes before the first `0xF0` are skipped. Returns the offset just past
/// the terminating `0xF7` together with the message, or `None` when the rest
/// of the buffer holds no complete message.
pub fn extract_next(buffer: &[u8], offset: usize) -> Option<(usize, SysexMessage)> {
    let mut message = Vec::new();
    let mut in_message = false;

    for (i, &b) in buffer.iter().enumerate().skip(offset) {
        if b == SYSEX_START {
            in_message = true;
        }
        if in_message {
            message.push(b);
            if b == SYSEX_END {
                return Some((i + 1, SysexMessage(message)));
            }
        }
    }

    None
}

/// Iterator over the complete messages of a buffer, in order
pub struct SysexMessages<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> SysexMessages<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Offset of the first byte not yet consumed
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for SysexMessages<'_> {
    type Item = SysexMessage;

    fn next(&mut self) -> Option<SysexMessage> {
        let (next_offset, message) = extract_next(self.buffer, self.offset)?;
        self.offset = next_offset;
        Some(message)
    }
}

pub fn count_messages(buffer: &[u8]) -> usize {
    SysexMessages::new(buffer).count()
}
