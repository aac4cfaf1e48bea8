//! Assembling the live command set.
//!
//! Built-ins are described from their clap definitions; commands declared in
//! the config file are registered as discovered commands in file order. The
//! resulting registration drives both the parser and the completion tree.

use std::path::Path;

use anyhow::{Result, anyhow};
use clap::{ArgMatches, Command, FromArgMatches};
use compline_core::registry::clap_command;
use compline_core::{
    BuiltinCommand, CommandDescriptor, Config, DiscoveredCommand, Registration, TreeBuilder,
    register,
};

use crate::cli::{Builtin, Cli, CompletionArgs, CompletionCommand, HelloArgs};

/// What runs when a registered command is invoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handler {
    /// A compiled-in command.
    Builtin(Builtin),
    /// A config-declared command and the message it prints.
    Declared(Option<String>),
}

/// Register the built-ins and the commands declared in `config`.
///
/// `source` names the config file in diagnostics. The assembled tree is
/// validated as a whole, so a declared command that clashes with a global
/// flag fails here instead of inside the parser.
pub fn build(config: &Config, source: Option<&Path>) -> Result<Registration<Handler>> {
    let builtins = Builtin::ALL
        .into_iter()
        .map(|builtin| -> Result<BuiltinCommand<Handler>> {
            Ok(BuiltinCommand {
                descriptor: TreeBuilder::from_command(&builtin.command())?,
                enabled: config.builtin_enabled(builtin.name(), builtin.enabled_by_default()),
                handler: Handler::Builtin(builtin),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let source = source.map_or_else(|| "config".to_string(), |p| p.display().to_string());
    let discovered = config.commands.iter().map(|declared| DiscoveredCommand {
        descriptor: declared.descriptor.clone(),
        source: source.clone(),
        handler: Handler::Declared(declared.message.clone()),
    });

    let registration = register(builtins, discovered)?;
    completion_tree(&registration)?;
    Ok(registration)
}

/// The root parser with every registered command attached.
///
/// Built-ins keep their derived definitions so typed arguments survive;
/// declared commands are built from their descriptors.
pub fn root_command(registration: &Registration<Handler>) -> Command {
    registration
        .commands()
        .iter()
        .fold(Cli::root(), |root, command| {
            let sub = match &command.handler {
                Handler::Builtin(builtin) => builtin.command(),
                Handler::Declared(_) => clap_command(&command.descriptor),
            };
            root.subcommand(sub)
        })
}

/// The tree handed to the completion generators.
pub fn completion_tree(registration: &Registration<Handler>) -> Result<CommandDescriptor> {
    let root = TreeBuilder::from_command(&Cli::root())?;
    Ok(registration.tree(&root)?)
}

/// A parsed invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// `completion <command>`
    Completion(CompletionCommand),
    /// `hello [NAME]`
    Hello(HelloArgs),
    /// `version`
    Version,
    /// A config-declared command.
    Declared {
        /// Command name.
        name: String,
        /// Message to print.
        message: Option<String>,
    },
    /// No subcommand given.
    Help,
}

impl Invocation {
    /// Resolve parsed matches against the registration.
    pub fn from_matches(
        registration: &Registration<Handler>,
        matches: &ArgMatches,
    ) -> Result<Self> {
        let Some((name, sub)) = matches.subcommand() else {
            return Ok(Self::Help);
        };
        let command = registration
            .get(name)
            .ok_or_else(|| anyhow!("unknown command '{name}'"))?;
        Ok(match &command.handler {
            Handler::Builtin(Builtin::Completion) => {
                Self::Completion(CompletionArgs::from_arg_matches(sub)?.command)
            },
            Handler::Builtin(Builtin::Hello) => Self::Hello(HelloArgs::from_arg_matches(sub)?),
            Handler::Builtin(Builtin::Version) => Self::Version,
            Handler::Declared(message) => Self::Declared {
                name: name.to_string(),
                message: message.clone(),
            },
        })
    }

    /// Whether the invocation prints machine-readable output.
    pub const fn is_machine_output(&self) -> bool {
        match self {
            Self::Completion(command) => command.is_machine_output(),
            _ => false,
        }
    }
}
