use clap::{CommandFactory, Parser};
use dialoguer::Confirm;
use log::{error, info, warn};
use std::error::Error;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysex_io::{
    cli::{format_port_list, validate_args, Args, Command},
    create_port, handle_device_list, logging,
    sysex::{self, ensure_writable_destination, format_size, load_sysex_file, save_sysex_file},
    ui::{create_receive_spinner, create_transmit_progress, receive_message},
    MidiPort, Settings, TransferEvent, TransferOutcome, TransferTask,
};

fn main() {
    let args = parse_command_line_arguments();
    initialize_logging(args.verbose);

    let command = match validate_args(&args) {
        Ok(command) => command,
        Err(msg) => {
            if args.transmit.is_none() && args.receive.is_none() {
                let _ = Args::command().print_help();
                println!();
            }
            exit_with_error(&msg);
        }
    };

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&format!("Error: Invalid settings: {}", e)),
    };

    if args.verbose {
        print_backend(&settings);
    }

    if let Err(e) = run(command, &settings, &args) {
        exit_with_error(&format!("Error: {}", e));
    }
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn initialize_logging(verbose: bool) {
    if let Err(e) = logging::init_logger(verbose) {
        eprintln!("Warning: file logging disabled: {}", e);
    }
    info!("Application starting");
}

fn load_settings(args: &Args) -> Result<Settings, Box<dyn Error>> {
    let settings = Settings::load(args.config.as_deref())?;
    Ok(settings.with_overrides(args.backend, args.timeout)?)
}

fn exit_with_error(msg: &str) -> ! {
    error!("{}", msg);
    eprintln!("{}", msg);
    std::process::exit(1);
}

/// Routes Ctrl-C to a transfer's cancel flag
fn cancel_on_ctrlc(flag: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Ctrl-C handler not installed: {}", e);
    }
}

fn print_backend(settings: &Settings) {
    let port = create_port(settings);
    println!(
        "Using {} MIDI v{}",
        port.backend_name(),
        port.backend_version()
    );
}

fn run(command: Command, settings: &Settings, args: &Args) -> Result<(), Box<dyn Error>> {
    match command {
        Command::ListPorts => {
            list_midi_ports(settings);
            Ok(())
        }
        Command::Info(file) => print_file_info(&file, args.verbose),
        Command::Transmit { file, port_id } => transmit_sysex_file(settings, &file, port_id),
        Command::Receive { file, port_id } => {
            receive_sysex_file(settings, &file, port_id, args.yes, args.verbose)
        }
    }
}

fn list_midi_ports(settings: &Settings) {
    let (inputs, outputs) = handle_device_list(settings);
    for line in format_port_list(&inputs, &outputs) {
        println!("{}", line);
    }
}

fn print_file_info(file: &Path, verbose: bool) -> Result<(), Box<dyn Error>> {
    let data = load_sysex_file(file)?;
    println!("File: {}", file.display());
    for line in sysex::SysexStats::from_bytes(&data).report() {
        println!("{}", line);
    }
    if verbose {
        for line in sysex::hex_dump(&data) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn transmit_sysex_file(
    settings: &Settings,
    file: &Path,
    port_id: usize,
) -> Result<(), Box<dyn Error>> {
    let data = load_sysex_file(file)?;

    let mut port = create_port(settings);
    port.open_output(port_id)?;

    println!("SYSEX transmit:");
    println!(
        "  File: {}",
        file.file_name().unwrap_or(file.as_os_str()).to_string_lossy()
    );
    println!("  Size: {}", format_size(data.len()));
    println!(
        "  Time: {:.03}s",
        sysex::wire_time(data.len()).as_secs_f64()
    );
    println!("  MIDI: {}", port.output_port_name().unwrap_or_default());

    let started = Instant::now();
    let pb = create_transmit_progress(data.len());
    let task = TransferTask::spawn_transmit(port, data);
    cancel_on_ctrlc(task.cancel_flag());

    for event in task.events().iter() {
        match &event {
            TransferEvent::Progress(progress) => {
                pb.set_position(progress.bytes as u64);
                pb.set_message(format!("{} msg", progress.messages));
            }
            TransferEvent::Completed => pb.finish(),
            TransferEvent::Aborted | TransferEvent::Failed(_) => pb.abandon(),
        }
        if event.is_terminal() {
            break;
        }
    }

    let (mut port, outcome) = task.join();
    port.close_output();

    match outcome? {
        TransferOutcome::Sent(progress) => {
            info!("Sent {} message(s) from {}", progress.messages, file.display());
            println!("Done ({:.03} s)", started.elapsed().as_secs_f64());
            Ok(())
        }
        TransferOutcome::Aborted(progress) => Err(format!(
            "Transmit cancelled after {} message(s), {}",
            progress.messages,
            format_size(progress.bytes)
        )
        .into()),
        other => Err(format!("Transmit did not complete: {:?}", other).into()),
    }
}

fn confirm_overwrite(file: &Path, assume_yes: bool) -> Result<bool, Box<dyn Error>> {
    if !file.exists() || assume_yes {
        return Ok(true);
    }
    let answer = Confirm::new()
        .with_prompt(format!("{} exists. Overwrite?", file.display()))
        .default(false)
        .interact()?;
    Ok(answer)
}

fn receive_sysex_file(
    settings: &Settings,
    file: &Path,
    port_id: usize,
    assume_yes: bool,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    let file = ensure_writable_destination(file)?;
    if !confirm_overwrite(&file, assume_yes)? {
        return Err("Receive cancelled, existing file kept".into());
    }

    let mut port = create_port(settings);
    if let Err(e) = port.open_input(port_id) {
        return Err(format!("Cannot open MIDI port: {}", e).into());
    }

    println!(
        "Receive SYSEX port \"{}\"... (Ctrl-C stops and saves)",
        port.input_port_name().unwrap_or_default()
    );

    let pb = create_receive_spinner();
    let task = TransferTask::spawn_receive(port, settings.idle_timeout);
    cancel_on_ctrlc(task.cancel_flag());

    loop {
        match task.events().recv_timeout(Duration::from_millis(100)) {
            Ok(TransferEvent::Progress(progress)) => {
                pb.set_message(receive_message(progress.messages, progress.bytes));
                if verbose {
                    pb.println(format!("SYSEX RX: {}", format_size(progress.bytes)));
                }
            }
            Ok(event) => {
                info!("Receive finished: {:?}", event);
                break;
            }
            Err(crossbeam::channel::RecvTimeoutError::Timeout) => pb.tick(),
            Err(crossbeam::channel::RecvTimeoutError::Disconnected) => {
                warn!("Receive thread stopped without a final event");
                break;
            }
        }
    }
    pb.finish();

    let (mut port, outcome) = task.join();
    port.close_input();

    let data = match outcome? {
        TransferOutcome::Received(data) => data,
        other => return Err(format!("Unexpected receive outcome: {:?}", other).into()),
    };
    if data.is_empty() {
        return Err("No SysEx data received, nothing saved".into());
    }

    println!("Saving to \"{}\"...", file.display());
    save_sysex_file(&file, &data)?;
    println!("Done ({})", format_size(data.len()));
    Ok(())
}
