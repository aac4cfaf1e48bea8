//! Zsh dialect.
//!
//! Candidates are `name:description` items fed to `_describe`. The script can
//! be sourced from `.zshrc` (it registers itself with `compdef`) or dropped
//! into `$fpath` as an autoloaded `_<cli>` function, thanks to the `#compdef`
//! header and the `funcstack` check at the bottom.

use super::bash::path_label;
use super::escape::{one_line, posix_single, zsh_describe_item};
use super::writer::ScriptWriter;
use super::ScriptGenerator;
use crate::naming;
use crate::shell::ShellKind;
use crate::tree::{CommandDescriptor, CommandPath};

/// Generates zsh completion functions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZshGenerator;

impl ScriptGenerator for ZshGenerator {
    fn shell(&self) -> ShellKind {
        ShellKind::Zsh
    }

    fn generate(&self, tree: &CommandDescriptor, cli_name: &str) -> String {
        let func = format!("_{}_complete", naming::shell_ident(cli_name));
        let paths = tree.paths();
        let quoted_cli = posix_single(cli_name);

        let mut w = ScriptWriter::new("    ");
        w.line(format!("#compdef {}", one_line(cli_name)));
        w.line(format!("# zsh completion for {}", one_line(cli_name)));
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
            "if [[ \"${{funcstack[1]}}\" == {} ]]; then",
            posix_single(&format!("_{cli_name}"))
        ));
        w.nested(|w| w.line(format!(r#"{func} "$@""#)));
        w.line("else");
        w.nested(|w| {
            w.line("(( $+functions[compdef] )) || { autoload -Uz compinit && compinit }");
            w.line(format!("compdef {func} {quoted_cli}"));
        });
        w.line("fi");
        w.finish()
    }

    fn export_statement(&self, var: &str, value: &str) -> String {
        format!("export {var}={}", posix_single(value))
    }
}

fn write_array(w: &mut ScriptWriter, name: &str, items: Vec<String>) {
    if items.is_empty() {
        w.line(format!("{name}=()"));
        return;
    }
    w.block(format!("{name}=("), ")", |w| {
        for item in items {
            w.line(item);
        }
    });
}

fn write_state_function(w: &mut ScriptWriter, func: &str, paths: &[CommandPath<'_>]) {
    w.block(format!("{func}_state() {{"), "}", |w| {
        w.block(r#"case "$1" in"#, "esac", |w| {
            for path in paths {
                let command = path.command;
                w.line(format!("# {}", path_label(path)));
                w.block(format!("({})", path.state), ";;", |w| {
                    let opts = path
                        .options()
                        .flat_map(|opt| opt.flags.iter().map(|flag| zsh_describe_item(flag, &opt.description)))
                        .collect();
                    let subcommands = command
                        .subcommands
                        .iter()
                        .map(|sub| zsh_describe_item(&sub.name, &sub.description))
                        .collect();
                    let value_opts = path.value_flags().map(posix_single).collect();
                    write_array(w, "opts", opts);
                    write_array(w, "subcommands", subcommands);
                    write_array(w, "value_opts", value_opts);
                });
            }
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
                        "({}) next={child} ;;",
                        posix_single(&format!("{}/{name}", path.state))
                    ));
                }
            }
        });
    });
}

fn write_values_function(w: &mut ScriptWriter, func: &str, paths: &[CommandPath<'_>]) {
    w.block(format!("{func}_values() {{"), "}", |w| {
        w.line("values=()");
        w.block(r#"case "$1/$2" in"#, "esac", |w| {
            for path in paths {
                for (flag, values) in path.value_choices() {
                    let quoted: Vec<String> = values.iter().map(|v| posix_single(v)).collect();
                    w.line(format!(
                        "({}) values=({}) ;;",
                        posix_single(&format!("{}/{flag}", path.state)),
                        quoted.join(" ")
                    ));
                }
            }
        });
    });
}

fn write_entry_function(w: &mut ScriptWriter, func: &str) {
    w.block(format!("{func}() {{"), "}", |w| {
        w.line("local word next");
        w.line("local -i node=0 i");
        w.line("local -a opts subcommands value_opts values");
        w.line(format!("{func}_state $node"));
        w.blank();
        w.block("for (( i = 2; i < CURRENT; i++ )); do", "done", |w| {
            w.line(r#"word="${words[i]}""#);
            w.block(
                r#"if [[ -n "$word" ]] && (( ${value_opts[(Ie)$word]} )); then"#,
                "fi",
                |w| {
                    w.line("(( i++ ))");
                    w.line("continue");
                },
            );
            w.line(r#"[[ "$word" == -* ]] && continue"#);
            w.line(format!(r#"{func}_next $node "$word""#));
            w.block(r#"if [[ -n "$next" ]]; then"#, "fi", |w| {
                w.line("node=$next");
                w.line("opts=() subcommands=() value_opts=()");
                w.line(format!("{func}_state $node"));
            });
        });
        w.blank();
        w.block(
            r#"if (( CURRENT > 2 )) && [[ -n "${words[CURRENT-1]}" ]] && (( ${value_opts[(Ie)${words[CURRENT-1]}]} )); then"#,
            "fi",
            |w| {
                w.line(format!(r#"{func}_values $node "${{words[CURRENT-1]}}""#));
                w.line("if (( ${#values} )); then");
                w.nested(|w| w.line("compadd -a values"));
                w.line("else");
                w.nested(|w| w.line("_files"));
                w.line("fi");
                w.line("return");
            },
        );
        w.line(r#"if [[ "${words[CURRENT]}" == -* ]]; then"#);
        w.nested(|w| w.line("_describe -t options 'option' opts"));
        w.line("else");
        w.nested(|w| w.line("_describe -t commands 'command' subcommands || _files"));
        w.line("fi");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::fixtures::{hostile_tree, sample_tree};

    #[test]
    fn test_compdef_header_and_registration() {
        let script = ZshGenerator.generate(&sample_tree(), "compline");
        assert!(script.starts_with("#compdef compline\n"));
        assert!(script.contains("compdef _compline_complete 'compline'"));
        assert!(script.contains("(( $+functions[compdef] )) || { autoload -Uz compinit && compinit }"));
    }

    #[test]
    fn test_candidates_carry_descriptions() {
        let script = ZshGenerator.generate(&sample_tree(), "compline");
        assert!(script.contains("'deploy:Deploy the app'"));
        assert!(script.contains("'--env:Target environment'"));
        assert!(script.contains("'rollback:Undo the last deploy'"));
    }

    #[test]
    fn test_state_arrays_list_own_then_global_options() {
        let script = ZshGenerator.generate(&sample_tree(), "compline");
        assert!(script.contains(
            "        # deploy
        (1)
            opts=(
                '-e:Target environment'
                '--env:Target environment'
                '--strategy:Rollout strategy'
                '-v:Verbose output'
                '--verbose:Verbose output'
            )
            subcommands=(
                'rollback:Undo the last deploy'
            )
            value_opts=(
                '-e'
                '--env'
                '--strategy'
            )
        ;;
        # deploy rollback
        (2)
            opts=(
                '-v:Verbose output'
                '--verbose:Verbose output'
            )
            subcommands=()
            value_opts=()
        ;;
"
        ));
    }

    #[test]
    fn test_fixed_values_are_offered_for_their_option() {
        let script = ZshGenerator.generate(&sample_tree(), "compline");
        assert!(script.contains(
            "_compline_complete_values() {
    values=()
    case \"$1/$2\" in
        ('1/--strategy') values=('rolling' 'blue-green') ;;
    esac
}
"
        ));
        assert!(script.contains(
            "        _compline_complete_values $node \"${words[CURRENT-1]}\"
        if (( ${#values} )); then
            compadd -a values
        else
            _files
        fi
"
        ));
    }

    #[test]
    fn test_compdef_line_never_spans_lines() {
        let script = ZshGenerator.generate(&CommandDescriptor::new("x\ntouch /tmp/owned"), "x\ntouch /tmp/owned");
        assert_eq!(script.lines().next(), Some("#compdef x touch /tmp/owned"));
        assert!(!script.lines().any(|line| line.starts_with("touch")));
    }

    #[test]
    fn test_hostile_description_stays_quoted() {
        let script = ZshGenerator.generate(&hostile_tree(), "compline");
        assert!(script.contains(r#"'quote:it'\''s $(rm -rf ~) `id` "x" \ ; next line"#));
    }

    #[test]
    fn test_transitions() {
        let script = ZshGenerator.generate(&sample_tree(), "compline");
        assert!(script.contains("('0/deploy') next=1 ;;"));
        assert!(script.contains("('1/rollback') next=2 ;;"));
    }
}
