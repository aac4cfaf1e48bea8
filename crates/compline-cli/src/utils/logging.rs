//! Logging initialization and configuration.
//!
//! This module handles setting up the tracing subscriber and color control
//! based on CLI flags and environment variables.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Pick the log level for the global flags.
///
/// Machine-readable output drops to errors only unless verbose/debug was
/// explicitly requested.
pub(crate) const fn log_level(cli: &Cli, machine_output: bool) -> Level {
    if cli.verbose || cli.debug {
        Level::DEBUG
    } else if cli.quiet || machine_output {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Initialize the logging subsystem based on CLI flags.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli, machine_output: bool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli, machine_output))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Color control: disable when requested, NO_COLOR is set, or when emitting machine output
    let env_no_color = std::env::var_os("NO_COLOR").is_some();
    if cli.no_color || env_no_color || machine_output {
        color_control::set_override(false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_is_warn() {
        assert_eq!(log_level(&Cli::default(), false), Level::WARN);
    }

    #[test]
    fn test_machine_output_is_quiet_unless_verbose() {
        assert_eq!(log_level(&Cli::default(), true), Level::ERROR);
        let verbose = Cli {
            verbose: true,
            ..Cli::default()
        };
        assert_eq!(log_level(&verbose, true), Level::DEBUG);
    }

    #[test]
    fn test_quiet_and_debug() {
        let quiet = Cli {
            quiet: true,
            ..Cli::default()
        };
        assert_eq!(log_level(&quiet, false), Level::ERROR);
        let debug = Cli {
            debug: true,
            quiet: true,
            ..Cli::default()
        };
        assert_eq!(log_level(&debug, false), Level::DEBUG);
    }
}
