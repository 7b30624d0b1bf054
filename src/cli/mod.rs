//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, Parser, Subcommand};
use indicatif::ProgressBar;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    /// Directory holding the history files
    #[arg(long, global = true, env = "GASCLIMATE_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, global = true, env = "GASCLIMATE_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect the AO, NAO and PNA ensemble forecasts
    Climate {},
    /// Collect the weekly heating degree day report
    Hdd {},
    /// Collect the weekly natural gas storage report
    Storage {},
    /// Run every collector
    All {},
    /// Print the latest row of each history file
    Summary {},
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub timeout: Duration,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            data_dir: self.data_dir.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_parse_defaults() {
        let cli = Cli::try_parse_from(["gasclimate", "hdd"]).unwrap();
        let settings = cli.settings();

        assert!(matches!(cli.command, Commands::Hdd {}));
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn should_accept_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gasclimate",
            "storage",
            "--data-dir",
            "/tmp/gas",
            "--timeout",
            "5",
        ])
        .unwrap();
        let settings = cli.settings();

        assert_eq!(settings.data_dir, PathBuf::from("/tmp/gas"));
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn should_reject_unknown_command() {
        assert!(Cli::try_parse_from(["gasclimate", "dashboard"]).is_err());
    }
}
