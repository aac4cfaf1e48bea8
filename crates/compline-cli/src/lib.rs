//! compline CLI - command registration and shell completion
//!
//! The entry point loads the configuration file, registers built-in and
//! declared commands, builds the parser from the registration and dispatches
//! to the command modules.
use anyhow::Result;
use clap::FromArgMatches;
use compline_core::{Config, ProcessEnv};
use tracing::{debug, warn};

mod cli;
mod commands;
pub mod error;
mod output;
mod registry;
mod utils;

use crate::cli::Cli;
use crate::registry::{Handler, Invocation};
use crate::utils::initialize_logging;
use compline_core::Registration;

/// Execute the compline CLI with the currently configured environment.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, registration
/// fails, or command execution fails.
pub async fn run() -> Result<()> {
    // Convert Broken pipe panics into a clean exit
    std::panic::set_hook(Box::new(|info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") || msg.contains("broken pipe") {
            // Exit silently for pipeline truncation
            std::process::exit(0);
        }
        // Default behavior: print to stderr
        eprintln!("{msg}");
    }));

    let config_path = Config::config_path(&ProcessEnv);
    let config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };
    let registration = registry::build(&config, config_path.as_deref())?;

    let mut root = registry::root_command(&registration);
    let matches = match root.try_get_matches_from_mut(std::env::args_os()) {
        Ok(matches) => matches,
        Err(err) => err.exit(),
    };
    let cli = Cli::from_arg_matches(&matches)?;
    let invocation = Invocation::from_matches(&registration, &matches)?;

    initialize_logging(&cli, invocation.is_machine_output())?;
    if let Some(path) = &config_path {
        debug!("configuration: {}", path.display());
    }
    for diagnostic in registration.diagnostics() {
        warn!("{}", diagnostic.message);
    }

    if invocation == Invocation::Help {
        root.print_help()?;
        return Ok(());
    }
    execute_command(invocation, &registration, &config, cli.quiet).await
}

async fn execute_command(
    invocation: Invocation,
    registration: &Registration<Handler>,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    match invocation {
        Invocation::Completion(command) => {
            let tree = registry::completion_tree(registration)?;
            commands::completion::execute(command, tree, config, quiet).await?;
        },
        Invocation::Hello(args) => commands::hello::execute(&args),
        Invocation::Version => commands::version::execute(),
        Invocation::Declared { name, message } => {
            commands::declared::execute(&name, message.as_deref());
        },
        Invocation::Help => {},
    }
    Ok(())
}
