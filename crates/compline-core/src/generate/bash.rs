//! Bash dialect.
//!
//! Bash has no notion of descriptions, so the script only offers words. State
//! is kept in three variables (`opts`, `subcommands`, `value_opts`) that the
//! entry function declares `local` and a per-state helper fills in. A second
//! lookup keyed by `state/flag` yields the fixed values of an option, if any.

use super::escape::{one_line, posix_single};
use super::writer::ScriptWriter;
use super::ScriptGenerator;
use crate::naming;
use crate::shell::ShellKind;
use crate::tree::{CommandDescriptor, CommandPath};

/// Generates bash completion scripts for `complete -F`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BashGenerator;

impl ScriptGenerator for BashGenerator {
    fn shell(&self) -> ShellKind {
        ShellKind::Bash
    }

    fn generate(&self, tree: &CommandDescriptor, cli_name: &str) -> String {
        let func = format!("_{}_complete", naming::shell_ident(cli_name));
        let paths = tree.paths();

        let mut w = ScriptWriter::new("    ");
        w.line(format!("# bash completion for {}", one_line(cli_name)));
        w.blank();
        write_state_function(&mut w, &func, &paths);
        w.blank();
        write_transition_function(&mut w, &func, &paths);
        w.blank();
        write_values_function(&mut w, &func, &paths);
        w.blank();
        write_entry_function(&mut w, &func);
        w.blank();
        w.line(format!(
            "complete -F {func} -o bashdefault -o default {}",
            posix_single(cli_name)
        ));
        w.finish()
    }

    fn export_statement(&self, var: &str, value: &str) -> String {
        format!("export {var}={}", posix_single(value))
    }
}

fn words(items: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let joined = items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    posix_single(&joined)
}

fn write_state_function(w: &mut ScriptWriter, func: &str, paths: &[CommandPath<'_>]) {
    w.block(format!("{func}_state() {{"), "}", |w| {
        w.block(r#"case "$1" in"#, "esac", |w| {
            for path in paths {
                w.line(format!("# {}", path_label(path)));
                w.block(format!("{})", path.state), ";;", |w| {
                    w.line(format!("opts={}", words(path.flags())));
                    w.line(format!(
                        "subcommands={}",
                        words(path.children.iter().map(|(name, _)| *name))
                    ));
                    w.line(format!("value_opts={}", words(path.value_flags())));
                });
            }
            w.block("*)", ";;", |w| {
                w.line("opts=''");
                w.line("subcommands=''");
                w.line("value_opts=''");
            });
        });
    });
}

fn write_transition_function(w: &mut ScriptWriter, func: &str, paths: &[CommandPath<'_>]) {
    w.block(format!("{func}_next() {{"), "}", |w| {
        w.line("next=''");
        w.block(r#"case "$1/$2" in"#, "esac", |w| {
            for path in paths {
                for (name, child) in &path.children {
                    w.line(format!(
                        "{}) next={child} ;;",
                        posix_single(&format!("{}/{name}", path.state))
                    ));
                }
            }
            w.line("*) ;;");
        });
    });
}

fn write_values_function(w: &mut ScriptWriter, func: &str, paths: &[CommandPath<'_>]) {
    w.block(format!("{func}_values() {{"), "}", |w| {
        w.line("values=''");
        w.block(r#"case "$1/$2" in"#, "esac", |w| {
            for path in paths {
                for (flag, values) in path.value_choices() {
                    w.line(format!(
                        "{}) values={} ;;",
                        posix_single(&format!("{}/{flag}", path.state)),
                        words(values)
                    ));
                }
            }
            w.line("*) ;;");
        });
    });
}

fn write_entry_function(w: &mut ScriptWriter, func: &str) {
    w.block(format!("{func}() {{"), "}", |w| {
        w.line("local cur prev word node next i opts subcommands value_opts values");
        w.line("COMPREPLY=()");
        w.line(r#"cur="${COMP_WORDS[COMP_CWORD]}""#);
        w.line(r#"prev="${COMP_WORDS[COMP_CWORD-1]}""#);
        w.line("node=0");
        w.line(format!(r#"{func}_state "$node""#));
        w.blank();
        w.block("for (( i = 1; i < COMP_CWORD; i++ )); do", "done", |w| {
            w.line(r#"word="${COMP_WORDS[i]}""#);
            w.block(
                r#"if [[ -n "$word" && " $value_opts " == *" $word "* ]]; then"#,
                "fi",
                |w| {
                    w.line("i=$(( i + 1 ))");
                    w.line("continue");
                },
            );
            w.line(r#"[[ "$word" == -* ]] && continue"#);
            w.line(format!(r#"{func}_next "$node" "$word""#));
            w.block(r#"if [[ -n "$next" ]]; then"#, "fi", |w| {
                w.line(r#"node="$next""#);
                w.line(format!(r#"{func}_state "$node""#));
            });
        });
        w.blank();
        w.block(
            r#"if [[ -n "$prev" && " $value_opts " == *" $prev "* ]]; then"#,
            "fi",
            |w| {
                w.line(format!(r#"{func}_values "$node" "$prev""#));
                w.line(r#"if [[ -n "$values" ]]; then"#);
                w.nested(|w| w.line(r#"COMPREPLY=( $(compgen -W "$values" -- "$cur") )"#));
                w.line("else");
                w.nested(|w| w.line(r#"COMPREPLY=( $(compgen -f -- "$cur") )"#));
                w.line("fi");
                w.line("return 0");
            },
        );
        w.line(r#"if [[ "$cur" == -* ]]; then"#);
        w.nested(|w| w.line(r#"COMPREPLY=( $(compgen -W "$opts" -- "$cur") )"#));
        w.line("else");
        w.nested(|w| w.line(r#"COMPREPLY=( $(compgen -W "$subcommands" -- "$cur") )"#));
        w.line("fi");
        w.line("return 0");
    });
}

pub(super) fn path_label(path: &CommandPath<'_>) -> String {
    let display = path.display();
    if display.is_empty() {
        "(root)".to_string()
    } else {
        display
    }
}
