//! Command descriptor tree.
//!
//! A [`CommandDescriptor`] is an immutable snapshot of the registered command
//! set: the root is the CLI itself, each node lists its options, positional
//! arguments and subcommands in declaration order. Generators never look at
//! the live parser, only at this snapshot.
//!
//! [`TreeBuilder`] produces snapshots either from a `clap::Command` or from a
//! list of descriptors, and rejects trees that would render broken scripts.

use std::collections::HashSet;

use clap::ArgAction;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A command (or the root CLI) with everything completion needs to know.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Name, unique among siblings.
    pub name: String,
    /// One-line description shown by shells that support it.
    #[serde(default)]
    pub description: String,
    /// Options in declaration order.
    #[serde(default)]
    pub options: Vec<OptionDescriptor>,
    /// Positional arguments in declaration order.
    #[serde(default)]
    pub positional_args: Vec<ArgDescriptor>,
    /// Nested commands in declaration order.
    #[serde(default)]
    pub subcommands: Vec<CommandDescriptor>,
}

/// A flag or option such as `-o, --output <FILE>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    /// Every spelling of the option, short forms first, without duplicates.
    pub flags: Vec<String>,
    /// Whether the option consumes the following word.
    #[serde(default)]
    pub takes_value: bool,
    /// Whether the option is accepted by every descendant command too.
    #[serde(default)]
    pub global: bool,
    /// Fixed set of values, offered when completing the option's argument.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub possible_values: Vec<String>,
    /// One-line description.
    #[serde(default)]
    pub description: String,
}

/// A positional argument.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDescriptor {
    /// Value name, e.g. `FILE`.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Whether the argument must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Whether the argument accepts more than one value.
    #[serde(default)]
    pub variadic: bool,
}

impl CommandDescriptor {
    /// A command with no description, options or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an option.
    #[must_use]
    pub fn with_option(mut self, option: OptionDescriptor) -> Self {
        self.options.push(option);
        self
    }

    /// Append a positional argument.
    #[must_use]
    pub fn with_arg(mut self, arg: ArgDescriptor) -> Self {
        self.positional_args.push(arg);
        self
    }

    /// Append a subcommand.
    #[must_use]
    pub fn with_subcommand(mut self, subcommand: Self) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Look up a descendant by its name path (empty path is `self`).
    pub fn find(&self, path: &[&str]) -> Option<&Self> {
        let mut node = self;
        for name in path {
            node = node.subcommands.iter().find(|c| c.name == *name)?;
        }
        Some(node)
    }

    /// Total number of commands in the tree, root included.
    pub fn command_count(&self) -> usize {
        1 + self
            .subcommands
            .iter()
            .map(Self::command_count)
            .sum::<usize>()
    }

    /// Names of the direct subcommands, in order.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|c| c.name.as_str()).collect()
    }

    /// Flatten the tree into numbered command paths, in pre-order.
    ///
    /// The root is state `0`. Every entry records the state number of each
    /// child so generators can emit a transition table.
    pub fn paths(&self) -> Vec<CommandPath<'_>> {
        let mut out = Vec::with_capacity(self.command_count());
        collect_paths(self, Vec::new(), Vec::new(), &mut out);
        out
    }
}

fn collect_paths<'a>(
    node: &'a CommandDescriptor,
    path: Vec<&'a str>,
    inherited: Vec<&'a OptionDescriptor>,
    out: &mut Vec<CommandPath<'a>>,
) -> usize {
    let state = out.len();
    let mut passed_down = inherited.clone();
    passed_down.extend(node.options.iter().filter(|opt| opt.global));
    out.push(CommandPath {
        state,
        path: path.clone(),
        command: node,
        inherited,
        children: Vec::with_capacity(node.subcommands.len()),
    });
    for child in &node.subcommands {
        let mut child_path = path.clone();
        child_path.push(child.name.as_str());
        let child_state = collect_paths(child, child_path, passed_down.clone(), out);
        out[state].children.push((child.name.as_str(), child_state));
    }
    state
}

/// One node of a flattened tree.
#[derive(Clone, Debug)]
pub struct CommandPath<'a> {
    /// Pre-order index; the root is `0`.
    pub state: usize,
    /// Names from the root (exclusive) down to this command.
    pub path: Vec<&'a str>,
    /// The command itself.
    pub command: &'a CommandDescriptor,
    /// Global options declared by ancestors, outermost first.
    pub inherited: Vec<&'a OptionDescriptor>,
    /// `(name, state)` for each direct subcommand.
    pub children: Vec<(&'a str, usize)>,
}

impl<'a> CommandPath<'a> {
    /// Space-separated path for comments and diagnostics; `""` for the root.
    pub fn display(&self) -> String {
        self.path.join(" ")
    }

    /// Options accepted here: the command's own, then inherited globals.
    pub fn options(&self) -> impl Iterator<Item = &'a OptionDescriptor> {
        self.command
            .options
            .iter()
            .chain(self.inherited.iter().copied())
    }

    /// Every flag of every option, in order.
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.options()
            .flat_map(|opt| opt.flags.iter().map(String::as_str))
    }

    /// Flags whose option consumes the next word.
    pub fn value_flags(&self) -> impl Iterator<Item = &str> {
        self.options()
            .filter(|opt| opt.takes_value)
            .flat_map(|opt| opt.flags.iter().map(String::as_str))
    }

    /// `(flag, values)` for every flag whose argument has a fixed set of values.
    pub fn value_choices(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.options()
            .filter(|opt| opt.takes_value && !opt.possible_values.is_empty())
            .flat_map(|opt| {
                opt.flags
                    .iter()
                    .map(move |flag| (flag.as_str(), opt.possible_values.as_slice()))
            })
    }
}

impl OptionDescriptor {
    /// An option with the given spellings; duplicates are dropped, order kept.
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let flags = flags
            .into_iter()
            .map(Into::into)
            .filter(|flag| seen.insert(flag.clone()))
            .collect();
        Self {
            flags,
            ..Self::default()
        }
    }

    /// Mark the option as consuming a value.
    #[must_use]
    pub const fn taking_value(mut self) -> Self {
        self.takes_value = true;
        self
    }

    /// Mark the option as accepted by every descendant command.
    #[must_use]
    pub const fn global(mut self) -> Self {
        self.global = true;
        self
    }

    /// Restrict the value to `values`; implies [`Self::taking_value`].
    #[must_use]
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.takes_value = true;
        self.possible_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// The argument id a parser knows the option by: the first long
    /// spelling, else the first single-character short one.
    pub fn id(&self) -> Option<String> {
        let long = self
            .flags
            .iter()
            .find_map(|flag| flag.strip_prefix("--"))
            .map(ToString::to_string);
        long.or_else(|| {
            self.flags.iter().find_map(|flag| {
                let short = flag.strip_prefix('-')?;
                (short.chars().count() == 1).then(|| short.to_string())
            })
        })
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl ArgDescriptor {
    /// An optional, single-valued argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Whether `name` can be spliced into a script as a bare word.
pub fn is_safe_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Whether `flag` is a well-formed `-x` or `--long-name` spelling.
pub fn is_safe_flag(flag: &str) -> bool {
    if let Some(long) = flag.strip_prefix("--") {
        return is_safe_name(long);
    }
    flag.strip_prefix('-').is_some_and(is_safe_name)
}

/// Flags the parser adds to every command.
pub const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

/// Flags the parser adds to the root command.
pub const VERSION_FLAGS: [&str; 2] = ["-V", "--version"];

/// Builds and validates descriptor trees.
pub struct TreeBuilder;

impl TreeBuilder {
    /// Snapshot a clap command tree.
    ///
    /// Hidden commands and arguments are skipped, as are the help and
    /// version flags clap generates. Arguments without any short or long
    /// spelling that are not positional are ignored.
    pub fn from_command(command: &clap::Command) -> Result<CommandDescriptor> {
        let root = describe_command(command, &HashSet::new());
        Self::validate(&root)?;
        Ok(root)
    }

    /// Assemble a root from already-described top-level commands.
    pub fn from_descriptors(
        name: &str,
        description: &str,
        commands: impl IntoIterator<Item = CommandDescriptor>,
    ) -> Result<CommandDescriptor> {
        let root = CommandDescriptor {
            name: name.to_string(),
            description: description.to_string(),
            subcommands: commands.into_iter().collect(),
            ..CommandDescriptor::default()
        };
        Self::validate(&root)?;
        Ok(root)
    }

    /// Check the tree invariants for a CLI root.
    ///
    /// Sibling names must be unique and every name, flag and value must be a
    /// shell-safe token. Within one command no flag or argument name may be
    /// used twice, and no option may claim the help flags, the root's
    /// version flags, or a flag of a global option declared above it.
    pub fn validate(root: &CommandDescriptor) -> Result<()> {
        if !is_safe_name(&root.name) {
            return Err(Error::Structural(format!(
                "invalid CLI name '{}'",
                root.name
            )));
        }
        let mut reserved: Vec<&str> = HELP_FLAGS.to_vec();
        reserved.extend(VERSION_FLAGS);
        validate_node(root, &root.name, &reserved)
    }

    /// Check a command that will be attached below a CLI root.
    ///
    /// Same rules as [`Self::validate`], except that the version flags are
    /// free to use.
    pub fn validate_command(command: &CommandDescriptor) -> Result<()> {
        if !is_safe_name(&command.name) {
            return Err(Error::Structural(format!(
                "invalid command name '{}'",
                command.name
            )));
        }
        validate_node(command, &command.name, &HELP_FLAGS)
    }
}

fn validate_node(node: &CommandDescriptor, path: &str, reserved: &[&str]) -> Result<()> {
    let mut flags = HashSet::new();
    let mut ids = HashSet::new();
    for option in &node.options {
        if option.flags.is_empty() {
            return Err(Error::Structural(format!(
                "option without flags under '{path}'"
            )));
        }
        for flag in &option.flags {
            if !is_safe_flag(flag) {
                return Err(Error::Structural(format!(
                    "invalid flag '{flag}' under '{path}'"
                )));
            }
            if reserved.contains(&flag.as_str()) {
                return Err(Error::Structural(format!(
                    "flag '{flag}' under '{path}' is reserved"
                )));
            }
            if !flags.insert(flag.as_str()) {
                return Err(Error::Structural(format!(
                    "flag '{flag}' is declared twice under '{path}'"
                )));
            }
        }
        if !option.possible_values.is_empty() && !option.takes_value {
            return Err(Error::Structural(format!(
                "option '{}' under '{path}' lists values but takes none",
                option.flags[0]
            )));
        }
        if let Some(value) = option.possible_values.iter().find(|v| !is_safe_name(v)) {
            return Err(Error::Structural(format!(
                "invalid value '{value}' for '{}' under '{path}'",
                option.flags[0]
            )));
        }
        if let Some(id) = option.id() {
            if !ids.insert(id.clone()) {
                return Err(Error::Structural(format!(
                    "argument name '{id}' is used twice under '{path}'"
                )));
            }
        }
    }
    for arg in &node.positional_args {
        if !ids.insert(arg.name.clone()) {
            return Err(Error::Structural(format!(
                "argument name '{}' is used twice under '{path}'",
                arg.name
            )));
        }
    }

    let mut inherited: Vec<&str> = HELP_FLAGS.to_vec();
    inherited.extend(
        reserved
            .iter()
            .copied()
            .filter(|flag| !HELP_FLAGS.contains(flag) && !VERSION_FLAGS.contains(flag)),
    );
    inherited.extend(
        node.options
            .iter()
            .filter(|opt| opt.global)
            .flat_map(|opt| opt.flags.iter().map(String::as_str)),
    );

    let mut seen = HashSet::with_capacity(node.subcommands.len());
    for child in &node.subcommands {
        if !is_safe_name(&child.name) {
            return Err(Error::Structural(format!(
                "invalid command name '{}' under '{path}'",
                child.name
            )));
        }
        if child.name == "help" {
            return Err(Error::Structural(format!(
                "command name 'help' under '{path}' is reserved"
            )));
        }
        if !seen.insert(child.name.as_str()) {
            return Err(Error::Structural(format!(
                "duplicate command '{}' under '{path}'",
                child.name
            )));
        }
        validate_node(child, &format!("{path} {}", child.name), &inherited)?;
    }
    Ok(())
}

/// `globals` holds the ids of global arguments declared by ancestors; a built
/// command carries propagated copies of them, which are skipped here.
fn describe_command(command: &clap::Command, globals: &HashSet<String>) -> CommandDescriptor {
    let mut options = Vec::new();
    let mut positional_args = Vec::new();
    let mut child_globals = globals.clone();

    let generated = |arg: &&clap::Arg| {
        matches!(
            arg.get_action(),
            ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
        )
    };
    for arg in command
        .get_arguments()
        .filter(|arg| !arg.is_hide_set())
        .filter(|arg| !generated(arg))
        .filter(|arg| !globals.contains(arg.get_id().as_str()))
    {
        let description = arg.get_help().map(ToString::to_string).unwrap_or_default();
        if arg.is_positional() {
            let name = arg
                .get_value_names()
                .and_then(|names| names.first())
                .map_or_else(|| arg.get_id().as_str().to_uppercase(), ToString::to_string);
            positional_args.push(ArgDescriptor {
                name,
                description,
                required: arg.is_required_set(),
                variadic: arg
                    .get_num_args()
                    .is_some_and(|range| range.max_values() > 1),
            });
            continue;
        }

        let mut flags = Vec::new();
        if let Some(short) = arg.get_short() {
            flags.push(format!("-{short}"));
        }
        if let Some(long) = arg.get_long() {
            flags.push(format!("--{long}"));
        }
        for alias in arg.get_visible_aliases().unwrap_or_default() {
            flags.push(format!("--{alias}"));
        }
        if flags.is_empty() {
            continue;
        }
        let mut option = OptionDescriptor::new(flags).with_description(description);
        option.takes_value = arg.get_action().takes_values();
        option.global = arg.is_global_set();
        if option.global {
            child_globals.insert(arg.get_id().to_string());
        }
        if option.takes_value {
            option.possible_values = arg
                .get_possible_values()
                .into_iter()
                .filter(|value| !value.is_hide_set())
                .map(|value| value.get_name().to_string())
                .collect();
        }
        options.push(option);
    }

    CommandDescriptor {
        name: command.get_name().to_string(),
        description: command
            .get_about()
            .map(ToString::to_string)
            .unwrap_or_default(),
        options,
        positional_args,
        subcommands: command
            .get_subcommands()
            .filter(|sub| !sub.is_hide_set() && sub.get_name() != "help")
            .map(|sub| describe_command(sub, &child_globals))
            .collect(),
    }
}
