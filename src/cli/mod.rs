use crate::midi::Backend;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Print MIDI input and output ports
    #[arg(short = 'l', long)]
    pub list_midi_ports: bool,

    /// Transmit a SysEx file
    #[arg(short = 't', long, value_name = "FILE")]
    pub transmit: Option<PathBuf>,

    /// Receive SysEx and save it to a file
    #[arg(short = 'r', long, value_name = "FILE")]
    pub receive: Option<PathBuf>,

    /// MIDI port ID for --transmit or --receive
    #[arg(short = 'p', long, value_name = "INDEX")]
    pub port_id: Option<usize>,

    /// Print statistics of a SysEx file
    #[arg(short = 'i', long, value_name = "FILE")]
    pub info: Option<PathBuf>,

    /// Seconds of silence that end a receive
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// MIDI backend (midir, mock)
    #[arg(long, value_name = "NAME")]
    pub backend: Option<Backend>,

    /// Settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing receive file without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// What the command line asks for, in priority order
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ListPorts,
    Info(PathBuf),
    Transmit { file: PathBuf, port_id: usize },
    Receive { file: PathBuf, port_id: usize },
}

/// Checks cross-argument rules and picks the command to run
pub fn validate_args(args: &Args) -> Result<Command, String> {
    if (args.transmit.is_some() || args.receive.is_some()) && args.port_id.is_none() {
        return Err("Error: Missing argument -p or --port-id".to_string());
    }

    if args.list_midi_ports {
        return Ok(Command::ListPorts);
    }
    if let Some(file) = &args.info {
        return Ok(Command::Info(file.clone()));
    }

    match (&args.transmit, &args.receive, args.port_id) {
        (Some(file), _, Some(port_id)) => Ok(Command::Transmit {
            file: file.clone(),
            port_id,
        }),
        (None, Some(file), Some(port_id)) => Ok(Command::Receive {
            file: file.clone(),
            port_id,
        }),
        _ => Err(
            "Nothing to do: use --list-midi-ports, --info, --transmit or --receive (see --help)"
                .to_string(),
        ),
    }
}

/// Lines printed by `--list-midi-ports`
pub fn format_port_list(inputs: &[String], outputs: &[String]) -> Vec<String> {
    let mut lines = vec!["MIDI input ports:".to_string()];
    lines.extend(
        inputs
            .iter()
            .enumerate()
            .map(|(i, name)| format!("  {}: {}", i, name)),
    );
    lines.push("MIDI output ports:".to_string());
    lines.extend(
        outputs
            .iter()
            .enumerate()
            .map(|(i, name)| format!("  {}: {}", i, name)),
    );
    lines
}
