//! Completion script generation.
//!
//! Each dialect renders a [`CommandDescriptor`] snapshot into a script that
//! tracks the command path typed so far and offers the options and
//! subcommands valid at that point. Output is a pure function of the tree and
//! the CLI name: no timestamps, no environment lookups, declaration order
//! preserved.
//!
//! All four dialects share the same shape. The tree is flattened into
//! numbered states (see [`CommandDescriptor::paths`]); the script walks the
//! typed words, follows the transition for each subcommand name, skips the
//! argument of any option that takes a value, and completes from the
//! candidates of the state it ends in. Global options are offered in every
//! state below the command that declares them, and an option with a fixed
//! value set completes those values instead of file names.
//!
//! Generators trust their input: names and flags are spliced into scripts as
//! bare words, so callers validate the tree first. [`generate_completion`]
//! does this for you.

mod bash;
pub(crate) mod escape;
mod fish;
mod powershell;
mod writer;
mod zsh;

pub use bash::BashGenerator;
pub use fish::FishGenerator;
pub use powershell::PowerShellGenerator;
pub use zsh::ZshGenerator;

use crate::Result;
use crate::shell::ShellKind;
use crate::tree::{CommandDescriptor, TreeBuilder};

/// Renders completion scripts for one shell dialect.
pub trait ScriptGenerator: Send + Sync {
    /// The dialect this generator targets.
    fn shell(&self) -> ShellKind;

    /// Render the completion script for `tree`, registered for `cli_name`.
    ///
    /// `tree` must have passed [`TreeBuilder::validate`].
    fn generate(&self, tree: &CommandDescriptor, cli_name: &str) -> String;

    /// A statement that exports `var=value` into the current session.
    fn export_statement(&self, var: &str, value: &str) -> String;
}

static BASH: BashGenerator = BashGenerator;
static ZSH: ZshGenerator = ZshGenerator;
static FISH: FishGenerator = FishGenerator;
static POWERSHELL: PowerShellGenerator = PowerShellGenerator;

/// The generator for `shell`.
pub fn generator_for(shell: ShellKind) -> &'static dyn ScriptGenerator {
    match shell {
        ShellKind::Bash => &BASH,
        ShellKind::Zsh => &ZSH,
        ShellKind::Fish => &FISH,
        ShellKind::PowerShell => &POWERSHELL,
    }
}

/// Render the completion script for `tree` in `shell`'s dialect.
///
/// The root command's name is the name the script registers for.
///
/// # Errors
///
/// Returns [`crate::Error::Structural`] when the tree fails validation.
pub fn generate_completion(tree: &CommandDescriptor, shell: ShellKind) -> Result<String> {
    TreeBuilder::validate(tree)?;
    Ok(generator_for(shell).generate(tree, &tree.name))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::tree::{ArgDescriptor, CommandDescriptor, OptionDescriptor};

    /// `compline [-v] {deploy [--env ENV] [--strategy rolling|blue-green]
    /// {rollback} TARGET, status}` with `-v` global.
    pub fn sample_tree() -> CommandDescriptor {
        CommandDescriptor::new("compline")
            .with_description("Demo CLI")
            .with_option(
                OptionDescriptor::new(["-v", "--verbose"])
                    .global()
                    .with_description("Verbose output"),
            )
            .with_subcommand(
                CommandDescriptor::new("deploy")
                    .with_description("Deploy the app")
                    .with_option(
                        OptionDescriptor::new(["-e", "--env"])
                            .taking_value()
                            .with_description("Target environment"),
                    )
                    .with_option(
                        OptionDescriptor::new(["--strategy"])
                            .with_values(["rolling", "blue-green"])
                            .with_description("Rollout strategy"),
                    )
                    .with_arg(ArgDescriptor::new("TARGET"))
                    .with_subcommand(CommandDescriptor::new("rollback").with_description("Undo the last deploy")),
            )
            .with_subcommand(CommandDescriptor::new("status").with_description("Show status"))
    }

    /// Same shape with a description that exercises every quoting rule.
    pub fn hostile_tree() -> CommandDescriptor {
        CommandDescriptor::new("compline").with_subcommand(
            CommandDescriptor::new("quote")
                .with_description("it's $(rm -rf ~) `id` \"x\" \\ ;\nnext line \u{2019}smart\u{2019}"),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;

    fn generate(tree: &CommandDescriptor, shell: ShellKind) -> String {
        generate_completion(tree, shell).unwrap()
    }

    #[test]
    fn test_generator_for_matches_shell() {
        for shell in ShellKind::ALL {
            assert_eq!(generator_for(shell).shell(), shell);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let tree = fixtures::sample_tree();
        for shell in ShellKind::ALL {
            assert_eq!(generate(&tree, shell), generate(&tree, shell));
        }
    }

    #[test]
    fn test_every_dialect_handles_an_empty_tree() {
        let tree = CommandDescriptor::new("compline");
        for shell in ShellKind::ALL {
            let script = generate(&tree, shell);
            assert!(script.contains("compline"), "{shell} script lacks registration");
        }
    }

    #[test]
    fn test_descriptions_never_break_out_of_a_line() {
        let tree = fixtures::hostile_tree();
        for shell in ShellKind::ALL {
            let script = generate(&tree, shell);
            assert!(!script.contains("\nnext line"), "{shell} script kept a raw newline");
        }
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let tree = fixtures::sample_tree();
        for shell in ShellKind::ALL {
            let script = generate(&tree, shell);
            let deploy = script.find("deploy").unwrap_or(usize::MAX);
            let status = script.find("status").unwrap_or(0);
            assert!(deploy < status, "{shell} script reordered subcommands");
        }
    }

    #[test]
    fn test_unsafe_names_are_refused_instead_of_rendered() {
        let root_name = CommandDescriptor::new("x\ntouch /tmp/owned");
        let spaced = CommandDescriptor::new("compline").with_subcommand(CommandDescriptor::new("a b"));
        for shell in ShellKind::ALL {
            for tree in [&root_name, &spaced] {
                assert!(
                    matches!(generate_completion(tree, shell), Err(Error::Structural(_))),
                    "{shell} rendered {:?}",
                    tree.name
                );
            }
        }
    }
}
