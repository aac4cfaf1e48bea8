//! fish dialect.
//!
//! fish completions are declarative `complete` lines guarded by a condition.
//! A helper function replays the command line to find the current state and
//! every candidate is guarded by `__<cli>_complete_in <state>`. Options with a
//! fixed value set use `-x -a` so fish offers exactly those values.

use super::bash::path_label;
use super::escape::{fish_single, one_line};
use super::writer::ScriptWriter;
use super::ScriptGenerator;
use crate::naming;
use crate::shell::ShellKind;
use crate::tree::{CommandDescriptor, CommandPath, OptionDescriptor};

/// Generates fish `complete` definitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct FishGenerator;

impl ScriptGenerator for FishGenerator {
    fn shell(&self) -> ShellKind {
        ShellKind::Fish
    }

    fn generate(&self, tree: &CommandDescriptor, cli_name: &str) -> String {
        let prefix = format!("__{}_complete", naming::shell_ident(cli_name));
        let cli = fish_single(cli_name);
        let paths = tree.paths();

        let mut w = ScriptWriter::new("    ");
        w.line(format!("# fish completion for {}", one_line(cli_name)));
        w.blank();
        write_state_function(&mut w, &prefix, &paths);
        w.blank();
        w.block(format!("function {prefix}_in"), "end", |w| {
            w.line(format!("test ({prefix}_state) = $argv[1]"));
        });
        w.blank();
        w.line(format!("complete -c {cli} -e"));
        w.line(format!("complete -c {cli} -f"));
        for path in &paths {
            w.blank();
            w.line(format!("# {}", path_label(path)));
            let guard = fish_single(&format!("{prefix}_in {}", path.state));
            for sub in &path.command.subcommands {
                w.line(format!(
                    "complete -c {cli} -n {guard} -a {}{}",
                    fish_single(&sub.name),
                    description_flag(&sub.description)
                ));
            }
            for option in path.options() {
                w.line(format!("complete -c {cli} -n {guard}{}", option_spec(option)));
            }
            if !path.command.positional_args.is_empty() {
                w.line(format!("complete -c {cli} -n {guard} -F"));
            }
        }
        w.finish()
    }

    fn export_statement(&self, var: &str, value: &str) -> String {
        format!("set -gx {var} {}", fish_single(value))
    }
}

fn description_flag(description: &str) -> String {
    let description = one_line(description);
    if description.is_empty() {
        String::new()
    } else {
        format!(" -d {}", fish_single(&description))
    }
}

fn option_spec(option: &OptionDescriptor) -> String {
    let mut spec = String::new();
    for flag in &option.flags {
        if let Some(long) = flag.strip_prefix("--") {
            spec.push_str(&format!(" -l {}", fish_single(long)));
        } else if let Some(short) = flag.strip_prefix('-') {
            let switch = if short.chars().count() == 1 { "-s" } else { "-o" };
            spec.push_str(&format!(" {switch} {}", fish_single(short)));
        }
    }
    match (option.takes_value, option.possible_values.as_slice()) {
        (false, _) => {},
        (true, []) => spec.push_str(" -r -F"),
        (true, values) => {
            spec.push_str(&format!(" -x -a {}", fish_single(&values.join(" "))));
        },
    }
    spec.push_str(&description_flag(&option.description));
    spec
}

fn write_state_function(w: &mut ScriptWriter, prefix: &str, paths: &[CommandPath<'_>]) {
    w.block(format!("function {prefix}_state"), "end", |w| {
        w.line("set -l tokens (commandline -opc)");
        w.line("set -e tokens[1]");
        w.line("set -l node 0");
        w.line("set -l skip 0");
        w.block("for token in $tokens", "end", |w| {
            w.block("if test $skip -eq 1", "end", |w| {
                w.line("set skip 0");
                w.line("continue");
            });
            w.block("switch $node", "end", |w| {
                for path in paths {
                    let values: Vec<String> = path.value_flags().map(fish_single).collect();
                    if path.children.is_empty() && values.is_empty() {
                        continue;
                    }
                    w.line(format!("case {}", path.state));
                    w.nested(|w| {
                        w.block("switch $token", "end", |w| {
                            for (name, child) in &path.children {
                                w.line(format!("case {}", fish_single(name)));
                                w.nested(|w| w.line(format!("set node {child}")));
                            }
                            if !values.is_empty() {
                                w.line(format!("case {}", values.join(" ")));
                                w.nested(|w| w.line("set skip 1"));
                            }
                        });
                    });
                }
            });
        });
        w.line("echo $node");
    });
}
