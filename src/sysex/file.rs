//! `.syx` file handling
//!
//! A `.syx` file is a raw dump of one or more concatenated SysEx messages,
//! without header or length prefix.

use super::framer::count_messages;
use super::timing::wire_time;
use super::{SysexError, SYSEX_END, SYSEX_START};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Checks that a buffer starts with 0xF0 and ends with 0xF7
pub fn validate(data: &[u8]) -> Result<(), SysexError> {
    match data {
        [] => Err(SysexError::Empty),
        [_] => Err(SysexError::TooShort(1)),
        [first, ..] if *first != SYSEX_START => Err(SysexError::MissingStart(*first)),
        [.., last] if *last != SYSEX_END => Err(SysexError::MissingEnd(*last)),
        _ => Ok(()),
    }
}

/// Reads and validates a SysEx file
pub fn load_sysex_file(path: &Path) -> Result<Vec<u8>, SysexError> {
    let data = fs::read(path).map_err(|source| SysexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&data)?;
    info!("Loaded {} from {}", format_size(data.len()), path.display());
    Ok(data)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Writes `data` to `path`.
///
/// The dump goes to a temporary file next to `path` which then replaces the
/// target, so a failed save leaves neither a partial file nor a damaged
/// previous one.
pub fn save_sysex_file(path: &Path, data: &[u8]) -> Result<(), SysexError> {
    let io_err = |source| SysexError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(io_err)?;
    tmp.write_all(data).map_err(io_err)?;
    if let Err(e) = tmp.persist(path) {
        warn!("Write to {} failed: {}", path.display(), e.error);
        return Err(io_err(e.error));
    }
    info!("Saved {} to {}", format_size(data.len()), path.display());
    Ok(())
}

/// Resolves `path` and checks that this process can create files in its
/// directory, by creating and dropping a temporary file there
pub fn ensure_writable_destination(path: &Path) -> Result<PathBuf, SysexError> {
    let io_err = |source| SysexError::Io {
        path: path.to_path_buf(),
        source,
    };

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_err(io_err)?.join(path)
    };
    let dir = parent_dir(&absolute);

    if !fs::metadata(dir).map_err(io_err)?.is_dir() {
        return Err(io_err(io::Error::new(
            io::ErrorKind::NotFound,
            "destination directory does not exist",
        )));
    }
    if let Err(e) = NamedTempFile::new_in(dir) {
        warn!("Cannot create files in {}: {}", dir.display(), e);
        return Err(io_err(io::Error::new(
            e.kind(),
            format!("destination directory is not writable: {}", e),
        )));
    }
    debug!("Destination {} is writable", absolute.display());
    Ok(absolute)
}

/// Human readable byte count: `"512 Bytes"`, `"1.5 kB"`, `"2.0 MB"`
pub fn format_size(num_bytes: usize) -> String {
    if num_bytes < 1024 {
        format!("{} Bytes", num_bytes)
    } else if num_bytes < 1024 * 1024 {
        format!("{:.1} kB", num_bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", num_bytes as f64 / (1024.0 * 1024.0))
    }
}

/// One hex line per message, as printed in verbose mode
pub fn hex_dump(data: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = Vec::new();
    for &b in data {
        line.push(b);
        if b == SYSEX_END {
            lines.push(super::hex_line(&line));
            line.clear();
        }
    }
    if !line.is_empty() {
        lines.push(super::hex_line(&line));
    }
    lines
}

/// Content markers of known instruments.
///
/// The first entry of each table identifies the device, the rest identify
/// sections of a memory dump.
const KNOWN_DEVICES: &[(&str, &[u8], &[(&str, &[u8])])] = &[(
    "Technics KN2000",
    &[0xF0, 0x50, 0x21, 0x01, 0x18, 0x10, 0xF7],
    &[
        ("Panel memory", &[0xF0, 0x50, 0x2D, 0x01, 0x18, 0x10, 0x40]),
        ("Sound memory", &[0xF0, 0x50, 0x2D, 0x01, 0x18, 0x10, 0x30]),
        ("Composer", &[0xF0, 0x50, 0x2D, 0x01, 0x18, 0x10, 0x50]),
        ("Sequencer", &[0xF0, 0x50, 0x2D, 0x01, 0x18, 0x10, 0x60]),
    ],
)];

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Summary of a SysEx buffer
#[derive(Debug, Clone, PartialEq)]
pub struct SysexStats {
    pub size: usize,
    pub messages: usize,
    pub wire_time: Duration,
    /// Recognized instrument and the dump sections found for it
    pub device: Option<(String, Vec<String>)>,
}

impl SysexStats {
    pub fn from_bytes(data: &[u8]) -> Self {
        let device = KNOWN_DEVICES
            .iter()
            .find(|(_, marker, _)| contains(data, marker))
            .map(|(name, _, sections)| {
                let found = sections
                    .iter()
                    .filter(|(_, marker)| contains(data, marker))
                    .map(|(section, _)| section.to_string())
                    .collect();
                (name.to_string(), found)
            });

        SysexStats {
            size: data.len(),
            messages: count_messages(data),
            wire_time: wire_time(data.len()),
            device,
        }
    }

    /// Lines printed by `--info`
    pub fn report(&self) -> Vec<String> {
        let mut lines = vec![
            format!("SysEx data: {}", format_size(self.size)),
            format!("Messages:   {}", self.messages),
            format!("Time:       {:.3}s", self.wire_time.as_secs_f64()),
        ];
        match &self.device {
            Some((name, sections)) => {
                lines.push(format!("Device:     {}", name));
                lines.extend(sections.iter().map(|s| format!(" - {}", s)));
            }
            None => lines.push("Device:     Unknown".to_string()),
        }
        lines
    }
}
