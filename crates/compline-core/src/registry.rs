//! Command registration.
//!
//! A CLI's command set is the union of built-in commands compiled into the
//! binary and commands discovered at runtime (declared in configuration).
//! Registration resolves that union once, before parsing:
//!
//! - enabled built-ins always win; a discovered command with the same name is
//!   dropped and a [`Diagnostic`] explains why,
//! - two discovered commands with the same name are a structural error naming
//!   both sources,
//! - disabled built-ins do not claim their name.
//!
//! The result keeps a caller-defined handler `H` next to each descriptor so
//! the host can dispatch without a second lookup table.

use std::collections::{HashMap, HashSet};

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, Command};
use tracing::{debug, warn};

use crate::tree::{CommandDescriptor, OptionDescriptor, TreeBuilder};
use crate::{Error, Result};

/// A command compiled into the binary.
#[derive(Debug, Clone)]
pub struct BuiltinCommand<H> {
    /// Shape of the command.
    pub descriptor: CommandDescriptor,
    /// Whether the command is registered at all.
    pub enabled: bool,
    /// Host payload.
    pub handler: H,
}

/// A command found at runtime.
#[derive(Debug, Clone)]
pub struct DiscoveredCommand<H> {
    /// Shape of the command.
    pub descriptor: CommandDescriptor,
    /// Where it was found, for diagnostics (a file path or similar).
    pub source: String,
    /// Host payload.
    pub handler: H,
}

/// Where a registered command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOrigin {
    /// Compiled in.
    Builtin,
    /// Discovered at runtime.
    Discovered {
        /// Where it was found.
        source: String,
    },
}

/// A command that made it into the final set.
#[derive(Debug, Clone)]
pub struct RegisteredCommand<H> {
    /// Shape of the command.
    pub descriptor: CommandDescriptor,
    /// Where it came from.
    pub origin: CommandOrigin,
    /// Host payload.
    pub handler: H,
}

/// A non-fatal registration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Command name involved.
    pub command: String,
    /// Source of the command that was dropped.
    pub source: String,
    /// Human-readable explanation.
    pub message: String,
}

/// The resolved command set.
#[derive(Debug, Clone)]
pub struct Registration<H> {
    commands: Vec<RegisteredCommand<H>>,
    diagnostics: Vec<Diagnostic>,
}

/// Resolve built-in and discovered commands into one ordered set.
///
/// Enabled built-ins come first in the order given, followed by the surviving
/// discovered commands in discovery order.
///
/// # Errors
///
/// Returns [`Error::Structural`] when two enabled built-ins or two discovered
/// commands share a name, or when any descriptor fails validation.
pub fn register<H>(
    builtins: impl IntoIterator<Item = BuiltinCommand<H>>,
    discovered: impl IntoIterator<Item = DiscoveredCommand<H>>,
) -> Result<Registration<H>> {
    let mut commands: Vec<RegisteredCommand<H>> = Vec::new();
    let mut builtin_names = HashSet::new();

    for builtin in builtins {
        if !builtin.enabled {
            debug!("built-in '{}' is disabled", builtin.descriptor.name);
            continue;
        }
        TreeBuilder::validate_command(&builtin.descriptor)?;
        if !builtin_names.insert(builtin.descriptor.name.clone()) {
            return Err(Error::Structural(format!(
                "built-in command '{}' is registered twice",
                builtin.descriptor.name
            )));
        }
        commands.push(RegisteredCommand {
            descriptor: builtin.descriptor,
            origin: CommandOrigin::Builtin,
            handler: builtin.handler,
        });
    }

    let mut diagnostics = Vec::new();
    let mut discovered_sources: HashMap<String, String> = HashMap::new();
    for command in discovered {
        let name = command.descriptor.name.clone();
        TreeBuilder::validate_command(&command.descriptor)?;
        if builtin_names.contains(&name) {
            let message = format!(
                "'{name}' from {} is shadowed by the built-in command and was ignored",
                command.source
            );
            warn!("{message}");
            diagnostics.push(Diagnostic {
                command: name,
                source: command.source,
                message,
            });
            continue;
        }
        if let Some(first) = discovered_sources.get(&name) {
            return Err(Error::Structural(format!(
                "command '{name}' is defined by both {first} and {}",
                command.source
            )));
        }
        discovered_sources.insert(name, command.source.clone());
        commands.push(RegisteredCommand {
            descriptor: command.descriptor,
            origin: CommandOrigin::Discovered {
                source: command.source,
            },
            handler: command.handler,
        });
    }

    Ok(Registration {
        commands,
        diagnostics,
    })
}

impl<H> Registration<H> {
    /// Registered commands in order.
    pub fn commands(&self) -> &[RegisteredCommand<H>] {
        &self.commands
    }

    /// Problems that did not prevent registration.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Registered names in order.
    pub fn names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .map(|c| c.descriptor.name.as_str())
            .collect()
    }

    /// Look up a registered command by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredCommand<H>> {
        self.commands.iter().find(|c| c.descriptor.name == name)
    }

    /// The registered set as a descriptor tree rooted at `root`.
    ///
    /// The root's own options are kept; its subcommands are replaced. This is
    /// also where a command clashing with one of the root's global flags is
    /// caught, so hosts should call it before building their parser.
    pub fn tree(&self, root: &CommandDescriptor) -> Result<CommandDescriptor> {
        let tree = CommandDescriptor {
            subcommands: self
                .commands
                .iter()
                .map(|c| c.descriptor.clone())
                .collect(),
            ..root.clone()
        };
        TreeBuilder::validate(&tree)?;
        Ok(tree)
    }

    /// Attach every registered command to `root` as a clap subcommand built
    /// from its descriptor.
    pub fn apply(&self, root: Command) -> Command {
        self.commands
            .iter()
            .fold(root, |root, c| root.subcommand(clap_command(&c.descriptor)))
    }
}

/// Build a clap command from a descriptor.
///
/// Single-dash spellings longer than one character have no clap equivalent
/// and are left to completion only.
pub fn clap_command(descriptor: &CommandDescriptor) -> Command {
    let mut command = Command::new(descriptor.name.clone());
    if !descriptor.description.is_empty() {
        command = command.about(descriptor.description.clone());
    }
    for option in &descriptor.options {
        if let Some(arg) = clap_option(option) {
            command = command.arg(arg);
        }
    }
    for positional in &descriptor.positional_args {
        let mut arg = Arg::new(positional.name.clone())
            .value_name(positional.name.clone())
            .required(positional.required);
        if positional.variadic {
            arg = arg.num_args(1..).action(ArgAction::Append);
        }
        if !positional.description.is_empty() {
            arg = arg.help(positional.description.clone());
        }
        command = command.arg(arg);
    }
    for sub in &descriptor.subcommands {
        command = command.subcommand(clap_command(sub));
    }
    command
}

fn clap_option(option: &OptionDescriptor) -> Option<Arg> {
    let mut shorts = Vec::new();
    let mut longs = Vec::new();
    for flag in &option.flags {
        if let Some(long) = flag.strip_prefix("--") {
            longs.push(long.to_string());
        } else if let Some(short) = flag.strip_prefix('-') {
            let mut chars = short.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                shorts.push(c);
            }
        }
    }

    let mut arg = Arg::new(option.id()?).global(option.global);
    if let Some((first, rest)) = shorts.split_first() {
        arg = arg.short(*first).short_aliases(rest.to_vec());
    }
    if let Some((first, rest)) = longs.split_first() {
        arg = arg.long(first.clone()).aliases(rest.to_vec());
    }
    arg = if option.takes_value {
        arg.action(ArgAction::Set)
    } else {
        arg.action(ArgAction::SetTrue)
    };
    if option.takes_value && !option.possible_values.is_empty() {
        arg = arg.value_parser(PossibleValuesParser::new(option.possible_values.clone()));
    }
    if !option.description.is_empty() {
        arg = arg.help(option.description.clone());
    }
    Some(arg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn builtin(name: &str, enabled: bool) -> BuiltinCommand<&'static str> {
        BuiltinCommand {
            descriptor: CommandDescriptor::new(name),
            enabled,
            handler: "builtin",
        }
    }

    fn discovered(name: &str, source: &str) -> DiscoveredCommand<&'static str> {
        DiscoveredCommand {
            descriptor: CommandDescriptor::new(name),
            source: source.to_string(),
            handler: "discovered",
        }
    }

    #[test]
    fn test_builtins_win_over_discovered() {
        let reg = register(
            [builtin("completion", true)],
            [discovered("completion", "plugins/a.toml"), discovered("deploy", "plugins/b.toml")],
        )
        .unwrap();

        assert_eq!(reg.names(), vec!["completion", "deploy"]);
        assert_eq!(reg.get("completion").unwrap().handler, "builtin");
        assert_eq!(reg.diagnostics().len(), 1);
        assert_eq!(reg.diagnostics()[0].command, "completion");
        assert_eq!(reg.diagnostics()[0].source, "plugins/a.toml");
    }

    #[test]
    fn test_disabled_builtin_frees_its_name() {
        let reg = register([builtin("hello", false)], [discovered("hello", "cfg")]).unwrap();
        assert_eq!(reg.names(), vec!["hello"]);
        assert_eq!(
            reg.get("hello").unwrap().origin,
            CommandOrigin::Discovered { source: "cfg".into() }
        );
        assert!(reg.diagnostics().is_empty());
    }

    #[test]
    fn test_duplicate_discovered_names_both_sources() {
        let err = register(
            Vec::<BuiltinCommand<&str>>::new(),
            [discovered("deploy", "a.toml"), discovered("deploy", "b.toml")],
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a.toml") && msg.contains("b.toml"), "{msg}");
    }

    #[test]
    fn test_duplicate_builtins_are_rejected() {
        let err = register([builtin("x", true), builtin("x", true)], Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn test_tree_keeps_root_options() {
        let root = CommandDescriptor::new("compline")
            .with_option(OptionDescriptor::new(["-v", "--verbose"]));
        let reg = register([builtin("completion", true)], [discovered("deploy", "cfg")]).unwrap();
        let tree = reg.tree(&root).unwrap();
        assert_eq!(tree.options.len(), 1);
        assert_eq!(tree.subcommand_names(), vec!["completion", "deploy"]);
    }

    #[test]
    fn test_apply_builds_parseable_clap_commands() {
        let deploy = CommandDescriptor::new("deploy")
            .with_description("Deploy")
            .with_option(OptionDescriptor::new(["-e", "--env"]).taking_value())
            .with_option(OptionDescriptor::new(["--dry-run"]))
            .with_arg(crate::tree::ArgDescriptor::new("TARGET"));
        let reg = register(
            Vec::<BuiltinCommand<()>>::new(),
            [DiscoveredCommand {
                descriptor: deploy,
                source: "cfg".into(),
                handler: (),
            }],
        )
        .unwrap();

        let cli = reg.apply(Command::new("compline"));
        let matches = cli
            .try_get_matches_from(["compline", "deploy", "-e", "prod", "--dry-run", "web"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "deploy");
        assert_eq!(sub.get_one::<String>("env").map(String::as_str), Some("prod"));
        assert!(sub.get_flag("dry-run"));
        assert_eq!(sub.get_one::<String>("TARGET").map(String::as_str), Some("web"));
    }

    #[test]
    fn test_descriptor_survives_clap_round_trip() {
        let deploy = CommandDescriptor::new("deploy")
            .with_description("Deploy")
            .with_option(OptionDescriptor::new(["-e", "--env"]).taking_value());
        let cmd = Command::new("compline").subcommand(clap_command(&deploy));
        let tree = TreeBuilder::from_command(&cmd).unwrap();
        assert_eq!(tree.subcommands[0], deploy);
    }

    fn discovered_with(descriptor: CommandDescriptor) -> DiscoveredCommand<()> {
        DiscoveredCommand {
            descriptor,
            source: "cfg".into(),
            handler: (),
        }
    }

    #[test]
    fn test_conflicting_flags_are_rejected_before_reaching_clap() {
        let duplicate = CommandDescriptor::new("deploy")
            .with_option(OptionDescriptor::new(["-e", "--env"]).taking_value())
            .with_option(OptionDescriptor::new(["--env"]));
        let help = CommandDescriptor::new("deploy").with_option(OptionDescriptor::new(["-h", "--host"]));

        for descriptor in [duplicate, help] {
            let err = register(Vec::<BuiltinCommand<()>>::new(), [discovered_with(descriptor)])
                .unwrap_err();
            assert!(matches!(err, Error::Structural(_)), "{err}");
        }
    }

    #[test]
    fn test_tree_rejects_commands_clashing_with_global_flags() {
        let root = CommandDescriptor::new("compline")
            .with_option(OptionDescriptor::new(["-v", "--verbose"]).global());
        let deploy = CommandDescriptor::new("deploy").with_option(OptionDescriptor::new(["-v", "--version-tag"]));
        let reg = register(Vec::<BuiltinCommand<()>>::new(), [discovered_with(deploy)]).unwrap();
        assert!(matches!(reg.tree(&root), Err(Error::Structural(_))));
    }

    #[test]
    fn test_accepted_registration_builds_a_parser() {
        let root = CommandDescriptor::new("compline")
            .with_option(OptionDescriptor::new(["-v", "--verbose"]).global());
        let deploy = CommandDescriptor::new("deploy")
            .with_option(OptionDescriptor::new(["-e", "--env"]).taking_value())
            .with_option(OptionDescriptor::new(["--strategy"]).with_values(["rolling", "blue-green"]))
            .with_option(OptionDescriptor::new(["-V", "--version"]));
        let reg = register(Vec::<BuiltinCommand<()>>::new(), [discovered_with(deploy)]).unwrap();
        reg.tree(&root).unwrap();

        let cli = reg.apply(
            Command::new("compline").version("1.0").arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .global(true)
                    .action(ArgAction::SetTrue),
            ),
        );
        cli.clone().debug_assert();
        let matches = cli
            .clone()
            .try_get_matches_from(["compline", "deploy", "--strategy", "rolling", "-v"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<String>("strategy").map(String::as_str), Some("rolling"));
        assert!(
            cli.try_get_matches_from(["compline", "deploy", "--strategy", "big-bang"])
                .is_err()
        );
    }
}
