use crate::midi::{MidiPort, PortError, Result};
use crossbeam::channel::{unbounded, Receiver};
use log::{debug, error, info};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::time::Duration;

const MIDIR_VERSION: &str = "0.9";

impl From<midir::InitError> for PortError {
    fn from(e: midir::InitError) -> Self {
        PortError::Init(e.to_string())
    }
}

impl<T> From<midir::ConnectError<T>> for PortError {
    fn from(e: midir::ConnectError<T>) -> Self {
        PortError::Connection(e.to_string())
    }
}

impl From<midir::SendError> for PortError {
    fn from(e: midir::SendError) -> Self {
        PortError::Send(e.to_string())
    }
}

struct OpenInput {
    index: usize,
    name: String,
    // Dropping the connection closes the port
    _connection: MidiInputConnection<()>,
    rx: Receiver<Vec<u8>>,
}

struct OpenOutput {
    index: usize,
    name: String,
    connection: MidiOutputConnection,
}

/// [`MidiPort`] backed by the system MIDI API through midir
pub struct MidirPort {
    client_name: String,
    poll_interval: Duration,
    input: Option<OpenInput>,
    output: Option<OpenOutput>,
}

impl MidirPort {
    pub fn new(client_name: &str, poll_interval: Duration) -> Self {
        MidirPort {
            client_name: client_name.to_string(),
            poll_interval,
            input: None,
            output: None,
        }
    }

    /// Shortens ALSA port names for display.
    ///
    /// `"UM-ONE:UM-ONE MIDI 1 20:0"` becomes `"UM-ONE MIDI 1"`.
    pub fn display_port_name(port_name: &str) -> String {
        if !cfg!(target_os = "linux") {
            return port_name.to_string();
        }
        shorten_alsa_name(port_name)
    }

    fn list_inputs(&self) -> Result<(MidiInput, Vec<midir::MidiInputPort>)> {
        let midi_in = MidiInput::new(&format!("{}-in", self.client_name))?;
        let ports = midi_in.ports();
        Ok((midi_in, ports))
    }

    fn list_outputs(&self) -> Result<(MidiOutput, Vec<midir::MidiOutputPort>)> {
        let midi_out = MidiOutput::new(&format!("{}-out", self.client_name))?;
        let ports = midi_out.ports();
        Ok((midi_out, ports))
    }
}

pub(crate) fn shorten_alsa_name(port_name: &str) -> String {
    let name = match port_name.split_once(':') {
        Some((_, rest)) => rest,
        None => port_name,
    };
    match name.rsplit_once(' ') {
        Some((head, _bus)) => head.to_string(),
        None => name.to_string(),
    }
}

impl MidiPort for MidirPort {
    fn backend_name(&self) -> &'static str {
        "midir"
    }

    fn backend_version(&self) -> String {
        MIDIR_VERSION.to_string()
    }

    fn input_ports(&self) -> Vec<String> {
        match self.list_inputs() {
            Ok((midi_in, ports)) => ports
                .iter()
                .map(|p| Self::display_port_name(&midi_in.port_name(p).unwrap_or_default()))
                .collect(),
            Err(e) => {
                error!("Failed to list MIDI input ports: {}", e);
                vec![]
            }
        }
    }

    fn output_ports(&self) -> Vec<String> {
        match self.list_outputs() {
            Ok((midi_out, ports)) => ports
                .iter()
                .map(|p| Self::display_port_name(&midi_out.port_name(p).unwrap_or_default()))
                .collect(),
            Err(e) => {
                error!("Failed to list MIDI output ports: {}", e);
                vec![]
            }
        }
    }

    fn open_input(&mut self, index: usize) -> Result<()> {
        if self.input.is_some() {
            return Ok(());
        }

        let (mut midi_in, ports) = self.list_inputs()?;
        let port = ports.get(index).ok_or(PortError::InvalidIndex {
            index,
            available: ports.len(),
        })?;
        let name = Self::display_port_name(&midi_in.port_name(port).unwrap_or_default());

        // SysEx is filtered out by default
        midi_in.ignore(Ignore::None);

        let (tx, rx) = unbounded();
        let connection = midi_in.connect(
            port,
            &format!("{}-input", self.client_name),
            move |_stamp, message, _| {
                let _ = tx.send(message.to_vec());
            },
            (),
        )?;

        info!("Opened MIDI input {}: {}", index, name);
        self.input = Some(OpenInput {
            index,
            name,
            _connection: connection,
            rx,
        });
        Ok(())
    }

    fn open_output(&mut self, index: usize) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }

        let (midi_out, ports) = self.list_outputs()?;
        let port = ports.get(index).ok_or(PortError::InvalidIndex {
            index,
            available: ports.len(),
        })?;
        let name = Self::display_port_name(&midi_out.port_name(port).unwrap_or_default());
        let connection = midi_out.connect(port, &format!("{}-output", self.client_name))?;

        info!("Opened MIDI output {}: {}", index, name);
        self.output = Some(OpenOutput {
            index,
            name,
            connection,
        });
        Ok(())
    }

    fn close_input(&mut self) {
        if let Some(input) = self.input.take() {
            debug!("Closing MIDI input {}: {}", input.index, input.name);
        }
    }

    fn close_output(&mut self) {
        if let Some(output) = self.output.take() {
            debug!("Closing MIDI output {}: {}", output.index, output.name);
            output.connection.close();
        }
    }

    fn input_port_name(&self) -> Option<String> {
        self.input.as_ref().map(|i| i.name.clone())
    }

    fn output_port_name(&self) -> Option<String> {
        self.output.as_ref().map(|o| o.name.clone())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let output = self.output.as_mut().ok_or(PortError::NotOpen)?;
        output.connection.send(bytes)?;
        Ok(())
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        let input = self.input.as_ref()?;
        input.rx.recv_timeout(self.poll_interval).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_alsa_name() {
        assert_eq!(shorten_alsa_name("UM-ONE:UM-ONE MIDI 1 20:0"), "UM-ONE MIDI 1");
        assert_eq!(
            shorten_alsa_name("Midi Through:Midi Through Port-0 14:0"),
            "Midi Through Port-0"
        );
        assert_eq!(shorten_alsa_name("Plain"), "Plain");
    }

    #[test]
    fn test_new_port_is_closed() {
        let port = MidirPort::new("sysex-io-test", Duration::from_millis(10));
        assert_eq!(port.backend_name(), "midir");
        assert!(port.input_port_name().is_none());
        assert!(port.output_port_name().is_none());
    }

    #[test]
    fn test_send_without_output_fails() {
        let mut port = MidirPort::new("sysex-io-test", Duration::from_millis(10));
        assert!(matches!(port.send(&[0xF0, 0xF7]), Err(PortError::NotOpen)));
        assert!(port.receive().is_none());
    }
}
