use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::config;
use crate::session::SessionConfig;

/// Command-line options for the model detector.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Identify the model behind a chat endpoint from its knowledge cutoff",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file (defaults to config.json beside the executable).
    #[arg(long = "config", value_name = "PATH", env = "MODEL_DETECTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Endpoint name to use instead of asking.
    #[arg(long = "api", value_name = "NAME", env = "MODEL_DETECTOR_API")]
    pub api: Option<String>,

    /// Run a single detection and exit instead of showing the menu.
    #[arg(long = "detect", action = ArgAction::SetTrue)]
    pub detect: bool,

    /// Overall timeout (seconds) for one request, streaming included.
    #[arg(long = "timeout", default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..=3600))]
    timeout_secs: u64,
}

impl CliArgs {
    /// Returns the configured network timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::default_path)
    }

    /// Convert CLI arguments into a session configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["model-detector"]).unwrap();
        assert_eq!(args.timeout(), Duration::from_secs(600));
        assert!(!args.detect);
    }

    #[test]
    fn explicit_flags() {
        let args = CliArgs::try_parse_from([
            "model-detector",
            "--config",
            "/etc/detector.json",
            "--api",
            "relay",
            "--detect",
            "--timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(args.config_path(), PathBuf::from("/etc/detector.json"));
        assert_eq!(args.api.as_deref(), Some("relay"));
        assert!(args.detect);
        assert_eq!(args.session_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(CliArgs::try_parse_from(["model-detector", "--timeout", "0"]).is_err());
    }
}
