use crate::config::APP_NAME;
use chrono::Local;
use simplelog::*;
use std::fs::{self, File, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Directory holding `app.log`
pub fn log_dir() -> Result<PathBuf, Error> {
    // Get user's home directory and construct log path
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join(APP_NAME)
        .join("logs"))
}

fn open_log_file() -> Result<File, Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))
}

/// Installs the global logger.
///
/// Everything at debug level goes to the log file; with `verbose` it is also
/// echoed to stderr. A log file that cannot be opened is reported as an
/// error, but terminal logging is still installed.
pub fn init_logger(verbose: bool) -> Result<(), Error> {
    let (log_file, file_error) = match open_log_file() {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };

    INIT.call_once(|| {
        let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
        if verbose {
            loggers.push(TermLogger::new(
                LevelFilter::Debug,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ));
        }
        if let Some(file) = log_file {
            loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
        }

        if CombinedLogger::init(loggers).is_ok() {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
            log::info!(
                "{} v{} session started {}",
                APP_NAME,
                env!("CARGO_PKG_VERSION"),
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
        }
    });

    if let Some(e) = file_error {
        return Err(e);
    }
    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}
