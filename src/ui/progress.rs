use crate::sysex::format_size;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Byte progress bar for a transmit of `total_bytes`
pub fn create_transmit_progress(total_bytes: usize) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(
        Some(total_bytes as u64),
        ProgressDrawTarget::stderr(),
    );
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {bytes}/{total_bytes} {msg}")
            .unwrap()
            .progress_chars("█▊ "),
    );
    pb.set_prefix("SYSEX TX");
    pb
}

/// Spinner showing the amount received so far
pub fn create_receive_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap(),
    );
    pb.set_prefix("SYSEX RX");
    pb.set_message("waiting for data...");
    pb
}

/// Message shown next to the receive spinner
pub fn receive_message(messages: usize, bytes: usize) -> String {
    format!("{} in {} message(s)", format_size(bytes), messages)
}
