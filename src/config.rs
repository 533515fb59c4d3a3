// config.rs

use crate::midi::Backend;
use crate::transfer::DEFAULT_IDLE_TIMEOUT;
use config::{ConfigError, Environment, File};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "sysex-io";

/// Prefix of environment overrides, e.g. `SYSEX_IO_BACKEND=mock`
pub const ENV_PREFIX: &str = "SYSEX_IO";

/// How long a port read waits before reporting "nothing received"
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runtime settings, resolved once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend: Backend,
    pub client_name: String,
    pub idle_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            backend: Backend::default(),
            client_name: APP_NAME.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Settings {
    /// Default location of the settings file
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join(APP_NAME)
                .join("config.toml"),
        )
    }

    /// Loads settings from defaults, the settings file and the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let mut builder = config::Config::builder()
            .set_default("backend", defaults.backend.to_string())?
            .set_default("client_name", defaults.client_name.clone())?
            .set_default("idle_timeout_secs", defaults.idle_timeout.as_secs_f64())?
            .set_default("poll_interval_ms", defaults.poll_interval.as_millis() as i64)?;

        match path {
            Some(path) => {
                info!("Reading settings from {}", path.display());
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    debug!("Looking for optional settings in {}", path.display());
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        let raw = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let settings = Self::from_config(&raw)?;
        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    fn from_config(raw: &config::Config) -> Result<Self, ConfigError> {
        let backend = raw
            .get_string("backend")?
            .parse::<Backend>()
            .map_err(ConfigError::Message)?;

        let idle_timeout = raw.get_float("idle_timeout_secs")?;
        let idle_timeout = parse_timeout(idle_timeout).map_err(ConfigError::Message)?;

        let poll_interval = raw.get_int("poll_interval_ms")?;
        if poll_interval <= 0 {
            return Err(ConfigError::Message(format!(
                "poll_interval_ms must be positive, got {}",
                poll_interval
            )));
        }

        Ok(Settings {
            backend,
            client_name: raw.get_string("client_name")?,
            idle_timeout,
            poll_interval: Duration::from_millis(poll_interval as u64),
        })
    }

    /// Applies command line overrides on top of loaded settings
    pub fn with_overrides(
        mut self,
        backend: Option<Backend>,
        timeout_secs: Option<f64>,
    ) -> Result<Self, String> {
        if let Some(backend) = backend {
            info!("Backend overridden on command line: {}", backend);
            self.backend = backend;
        }
        if let Some(secs) = timeout_secs {
            self.idle_timeout = parse_timeout(secs)?;
            info!("Idle timeout overridden on command line: {:?}", self.idle_timeout);
        }
        Ok(self)
    }
}

fn parse_timeout(secs: f64) -> Result<Duration, String> {
    if secs.is_finite() && secs > 0.0 {
        Ok(Duration::from_secs_f64(secs))
    } else {
        Err(format!(
            "Idle timeout must be a positive number of seconds, got {}",
            secs
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.client_name, "sysex-io");
        assert_eq!(settings.idle_timeout, Duration::from_secs(2));
        assert_eq!(settings.poll_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "backend = \"mock\"").unwrap();
        writeln!(file, "idle_timeout_secs = 0.5").unwrap();
        writeln!(file, "client_name = \"bench\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.backend, Backend::Mock);
        assert_eq!(settings.idle_timeout, Duration::from_millis(500));
        assert_eq!(settings.client_name, "bench");
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/sysex-io.toml"))).is_err());
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "backend = \"pygame\"").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default()
            .with_overrides(Some(Backend::Mock), Some(0.25))
            .unwrap();
        assert_eq!(settings.backend, Backend::Mock);
        assert_eq!(settings.idle_timeout, Duration::from_millis(250));

        assert!(Settings::default().with_overrides(None, Some(0.0)).is_err());
        assert!(Settings::default().with_overrides(None, Some(-1.0)).is_err());
    }
}
