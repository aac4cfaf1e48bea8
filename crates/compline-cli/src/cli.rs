//! # CLI Structure and Argument Parsing
//!
//! The top-level parser only knows the global flags. Subcommands are attached
//! at runtime from the command registry, so built-ins switched off in the
//! configuration file never reach the parser and commands declared in the
//! configuration file appear next to the built-ins.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Print a completion script
//! compline completion generate zsh
//!
//! # Install into the detected shell's profile
//! compline completion install
//!
//! # Inspect the installation
//! compline completion status --format json
//! ```
//!
//! ## Global Options
//!
//! - `--verbose` / `--debug`: debug logging; `--debug` also prints the full
//!   error chain on failure
//! - `--quiet`: errors only, no spinner
//! - `--no-color`: disable ANSI colors (also respects `NO_COLOR`)

use clap::{Args, Command, CommandFactory, Parser, Subcommand};
use compline_core::InstallationScope;

use crate::output::OutputFormat;

/// Global options for the `compline` command.
#[derive(Parser, Clone, Debug, Default)]
#[command(name = "compline")]
#[command(version)]
#[command(about = "compline - command registration and shell completion", long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Debug logging and full error chains
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

impl Cli {
    /// The root parser without any subcommands attached.
    pub fn root() -> Command {
        Self::command()
    }
}

/// Compiled-in commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// `completion`
    Completion,
    /// `hello`
    Hello,
    /// `version`
    Version,
}

impl Builtin {
    /// Every built-in in registration order.
    pub const ALL: [Self; 3] = [Self::Completion, Self::Hello, Self::Version];

    /// Command name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::Hello => "hello",
            Self::Version => "version",
        }
    }

    /// Whether the command is registered when the config file says nothing.
    pub const fn enabled_by_default(self) -> bool {
        matches!(self, Self::Completion)
    }

    /// The clap command used both for parsing and for describing the
    /// built-in to the completion generators.
    pub fn command(self) -> Command {
        match self {
            Self::Completion => CompletionArgs::augment_args(
                Command::new(self.name()).about("Generate, install and inspect shell completion"),
            ),
            Self::Hello => HelloArgs::augment_args(Command::new(self.name()).about("Print a greeting")),
            Self::Version => Command::new(self.name()).about("Print version information"),
        }
    }
}

/// Arguments of `completion`.
#[derive(Args, Clone, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommand,
}

/// `completion` subcommands.
#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum CompletionCommand {
    /// Print the raw completion script
    Generate {
        /// Shell to generate for (detected when omitted)
        #[arg(value_name = "SHELL")]
        shell: Option<String>,
    },

    /// Print the script framed exactly as it is installed
    Script {
        /// Shell to generate for (detected when omitted)
        #[arg(value_name = "SHELL")]
        shell: Option<String>,
    },

    /// Install completion into the shell profile
    Install {
        /// Target shell (detected when omitted)
        #[arg(long, value_name = "SHELL")]
        shell: Option<String>,

        /// Installation scope (defaults to the configured scope)
        #[arg(long, value_enum)]
        scope: Option<InstallationScope>,

        /// Replace an existing completion block
        #[arg(long)]
        force: bool,
    },

    /// Remove installed completion blocks
    Uninstall {
        /// Target shell (detected when omitted)
        #[arg(long, value_name = "SHELL")]
        shell: Option<String>,

        /// Installation scope (defaults to the configured scope)
        #[arg(long, value_enum)]
        scope: Option<InstallationScope>,
    },

    /// Show where completion is installed and whether it is active
    Status {
        /// Shell to inspect (detected when omitted)
        #[arg(long, value_name = "SHELL")]
        shell: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List supported shells
    Shells,
}

impl CompletionCommand {
    /// Whether the command writes machine-readable output to stdout.
    pub const fn is_machine_output(&self) -> bool {
        matches!(
            self,
            Self::Status {
                format: OutputFormat::Json,
                ..
            }
        )
    }
}

/// Arguments of `hello`.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct HelloArgs {
    /// Who to greet
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}
