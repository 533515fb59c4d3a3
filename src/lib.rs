pub mod cli;
pub mod config;
pub mod logging;
pub mod midi;
pub mod sysex;
pub mod transfer;
pub mod ui;

pub use cli::{validate_args, Args, Command};
pub use config::Settings;
pub use midi::{Backend, MidiPort, PortError};
pub use sysex::{SysexError, SysexMessage};
pub use transfer::{TransferEvent, TransferOutcome, TransferProgress, TransferTask};

/// Creates a closed port for the backend chosen in `settings`
pub fn create_port(settings: &Settings) -> Box<dyn MidiPort> {
    midi::create_port(
        settings.backend,
        &settings.client_name,
        settings.poll_interval,
    )
}

/// Names of the input and output ports the configured backend sees
pub fn handle_device_list(settings: &Settings) -> (Vec<String>, Vec<String>) {
    let port = create_port(settings);
    (port.input_ports(), port.output_ports())
}
