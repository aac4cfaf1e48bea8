//! PowerShell dialect.
//!
//! A native argument completer backed by four hashtables: transitions keyed
//! by `state/word`, value-taking options and their fixed values keyed the
//! same way, and candidate lists keyed by state. Each candidate becomes a
//! `CompletionResult` with its description as the tooltip.

use super::bash::path_label;
use super::escape::{one_line, powershell_single};
use super::writer::ScriptWriter;
use super::ScriptGenerator;
use crate::shell::ShellKind;
use crate::tree::{CommandDescriptor, CommandPath};

/// Generates `Register-ArgumentCompleter` scripts.
#[derive(Clone, Copy, Debug, Default)]
pub struct PowerShellGenerator;

impl ScriptGenerator for PowerShellGenerator {
    fn shell(&self) -> ShellKind {
        ShellKind::PowerShell
    }

    fn generate(&self, tree: &CommandDescriptor, cli_name: &str) -> String {
        let paths = tree.paths();

        let mut w = ScriptWriter::new("    ");
        w.line(format!("# powershell completion for {}", one_line(cli_name)));
        w.blank();
        w.block(
            format!(
                "Register-ArgumentCompleter -Native -CommandName {} -ScriptBlock {{",
                powershell_single(cli_name)
            ),
            "}",
            |w| {
                w.line("param($wordToComplete, $commandAst, $cursorPosition)");
                w.blank();
                write_transitions(w, &paths);
                w.blank();
                write_value_options(w, &paths);
                w.blank();
                write_value_choices(w, &paths);
                w.blank();
                write_candidates(w, &paths);
                w.blank();
                write_walker(w);
            },
        );
        w.finish()
    }

    fn export_statement(&self, var: &str, value: &str) -> String {
        format!("$env:{var} = {}", powershell_single(value))
    }
}

fn key(state: usize, word: &str) -> String {
    powershell_single(&format!("{state}/{word}"))
}

fn write_transitions(w: &mut ScriptWriter, paths: &[CommandPath<'_>]) {
    w.block("$transitions = @{", "}", |w| {
        for path in paths {
            for (name, child) in &path.children {
                w.line(format!("{} = '{child}'", key(path.state, name)));
            }
        }
    });
}

fn write_value_options(w: &mut ScriptWriter, paths: &[CommandPath<'_>]) {
    w.block("$valueOptions = @{", "}", |w| {
        for path in paths {
            for flag in path.value_flags() {
                w.line(format!("{} = $true", key(path.state, flag)));
            }
        }
    });
}

fn write_value_choices(w: &mut ScriptWriter, paths: &[CommandPath<'_>]) {
    w.block("$valueChoices = @{", "}", |w| {
        for path in paths {
            for (flag, values) in path.value_choices() {
                let quoted: Vec<String> = values.iter().map(|v| powershell_single(v)).collect();
                w.line(format!("{} = @({})", key(path.state, flag), quoted.join(", ")));
            }
        }
    });
}

fn candidate(text: &str, kind: &str, description: &str) -> String {
    let tooltip = one_line(description);
    let tooltip = if tooltip.is_empty() { text } else { tooltip.as_str() };
    format!(
        "@{{ Text = {}; Kind = '{kind}'; Tooltip = {} }}",
        powershell_single(text),
        powershell_single(tooltip)
    )
}

fn write_candidates(w: &mut ScriptWriter, paths: &[CommandPath<'_>]) {
    w.block("$candidates = @{", "}", |w| {
        for path in paths {
            let command = path.command;
            w.line(format!("# {}", path_label(path)));
            w.block(format!("'{}' = @(", path.state), ")", |w| {
                for sub in &command.subcommands {
                    w.line(candidate(&sub.name, "ParameterValue", &sub.description));
                }
                for option in path.options() {
                    for flag in &option.flags {
                        w.line(candidate(flag, "ParameterName", &option.description));
                    }
                }
            });
        }
    });
}

fn write_walker(w: &mut ScriptWriter) {
    w.line("$words = @($commandAst.CommandElements |");
    w.nested(|w| {
        w.line("Select-Object -Skip 1 |");
        w.line("Where-Object { $_.Extent.EndOffset -lt $cursorPosition } |");
        w.line("ForEach-Object { $_.Extent.Text })");
    });
    w.line("$node = '0'");
    w.line("$skip = $false");
    w.line("$pending = ''");
    w.block("foreach ($word in $words) {", "}", |w| {
        w.line("if ($skip) { $skip = $false; continue }");
        w.line(r#"$lookup = "$node/$word""#);
        w.line("if ($valueOptions.ContainsKey($lookup)) { $skip = $true; $pending = $lookup; continue }");
        w.line("if ($transitions.ContainsKey($lookup)) { $node = $transitions[$lookup] }");
    });
    w.block("if ($skip) {", "}", |w| {
        w.block("if ($valueChoices.ContainsKey($pending)) {", "}", |w| {
            w.line("$valueChoices[$pending] |");
            w.nested(|w| {
                w.line("Where-Object { $_.StartsWith($wordToComplete, [System.StringComparison]::OrdinalIgnoreCase) } |");
                w.block("ForEach-Object {", "}", |w| {
                    w.line("[System.Management.Automation.CompletionResult]::new($_, $_, 'ParameterValue', $_)");
                });
            });
        });
        w.line("return");
    });
    w.blank();
    w.line("$candidates[$node] |");
    w.nested(|w| {
        w.line("Where-Object { $_.Text.StartsWith($wordToComplete, [System.StringComparison]::OrdinalIgnoreCase) } |");
        w.block("ForEach-Object {", "}", |w| {
            w.line("[System.Management.Automation.CompletionResult]::new($_.Text, $_.Text, $_.Kind, $_.Tooltip)");
        });
    });
}
