//! Terminal progress display
//!
//! Progress bars for the command line front end, built on indicatif:
//! - Byte progress for transmit
//! - Spinner with the received size for receive

mod progress;

pub use progress::{create_receive_spinner, create_transmit_progress, receive_message};
