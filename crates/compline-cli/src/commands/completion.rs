//! `completion` subcommands
//!
//! Profile reads and writes run on tokio's blocking pool behind a spinner.
//! The shell is taken from the command line, then from `[completion] shell`
//! in the config file, and detected otherwise.

use anyhow::Result;
use colored::Colorize;
use compline_core::{
    CommandDescriptor, Completion, Config, FORMAT_VERSION, InstallAction, InstallOptions,
    InstallResult, InstallationStatus, ProcessEnv, ShellKind, UninstallOptions,
};
use tracing::debug;

use crate::cli::CompletionCommand;
use crate::error::CliError;
use crate::output::{OutputFormat, Spinner};

static ENV: ProcessEnv = ProcessEnv;

/// Execute a `completion` subcommand against `tree`.
pub async fn execute(
    command: CompletionCommand,
    tree: CommandDescriptor,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    let completion = Completion::new(&ENV, &tree.name)?;
    match command {
        CompletionCommand::Generate { shell } => {
            let shell = resolve_shell(&completion, shell.as_deref(), config)?;
            print!("{}", completion.generate(&tree, shell)?);
        },
        CompletionCommand::Script { shell } => {
            let shell = resolve_shell(&completion, shell.as_deref(), config)?;
            print!("{}", completion.script(&tree, shell)?);
        },
        CompletionCommand::Install {
            shell,
            scope,
            force,
        } => {
            let options = InstallOptions {
                shell: Some(resolve_shell(&completion, shell.as_deref(), config)?),
                scope: scope.unwrap_or(config.completion.scope),
                force,
            };
            install(completion, tree, options, quiet).await?;
        },
        CompletionCommand::Uninstall { shell, scope } => {
            let options = UninstallOptions {
                shell: Some(resolve_shell(&completion, shell.as_deref(), config)?),
                scope: scope.unwrap_or(config.completion.scope),
            };
            uninstall(completion, options, quiet).await?;
        },
        CompletionCommand::Status { shell, format } => {
            let shell = match shell.as_deref().or(config.completion.shell.as_deref()) {
                Some(name) => Some(completion.detect_shell(Some(name))?),
                None => None,
            };
            let status = tokio::task::spawn_blocking(move || completion.status(shell))
                .await
                .map_err(CliError::internal)?;
            print_status(&status, format)?;
        },
        CompletionCommand::Shells => list_shells(&completion, config),
    }
    Ok(())
}

fn resolve_shell(
    completion: &Completion<'_, ProcessEnv>,
    explicit: Option<&str>,
    config: &Config,
) -> Result<ShellKind> {
    let (shell, source) =
        completion.detect_shell_with_source(explicit.or(config.completion.shell.as_deref()))?;
    debug!("using {shell} ({source:?})");
    Ok(shell)
}

/// Run a profile operation on the blocking pool.
async fn blocking<T, F>(spinner: &Spinner, task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> compline_core::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            spinner.fail();
            Err(err.into())
        },
        Err(err) => {
            spinner.fail();
            Err(CliError::internal(err).into())
        },
    }
}

async fn install(
    completion: Completion<'static, ProcessEnv>,
    tree: CommandDescriptor,
    options: InstallOptions,
    quiet: bool,
) -> Result<()> {
    let shell = options.shell.map_or_else(String::new, |s| s.to_string());
    let spinner = Spinner::start(
        format!("Installing {shell} completion ({} scope)", options.scope),
        quiet,
    );
    let result = blocking(&spinner, move || completion.install(&tree, options)).await?;
    spinner.success(&install_summary(&shell, &result));

    if result.is_outdated() && !quiet {
        println!(
            "  {} installed block uses format v{}, current is v{FORMAT_VERSION}; re-run with --force to upgrade",
            "note:".yellow(),
            result.previous_version.unwrap_or_default(),
        );
    }
    if result.restart_required && !quiet {
        println!(
            "  Restart your shell or run: {}",
            result.activation_command.bold()
        );
    }
    Ok(())
}

fn install_summary(shell: &str, result: &InstallResult) -> String {
    let path = result.path.display();
    match result.action {
        InstallAction::AlreadyInstalled => {
            format!("{shell} completion is already installed in {path}")
        },
        InstallAction::Replaced => format!("Updated {shell} completion in {path}"),
        InstallAction::Installed => format!("Installed {shell} completion in {path}"),
    }
}

async fn uninstall(
    completion: Completion<'static, ProcessEnv>,
    options: UninstallOptions,
    quiet: bool,
) -> Result<()> {
    let shell = options.shell.map_or_else(String::new, |s| s.to_string());
    let spinner = Spinner::start(format!("Removing {shell} completion"), quiet);
    let result = blocking(&spinner, move || completion.uninstall(options)).await?;
    let path = result.path.display();
    let message = match result.removed_blocks {
        0 => format!("No {shell} completion found in {path}"),
        1 => format!("Removed {shell} completion from {path}"),
        n => format!("Removed {n} {shell} completion blocks from {path}"),
    };
    spinner.success(&message);
    Ok(())
}

fn print_status(status: &InstallationStatus, format: OutputFormat) -> Result<()> {
    if format.is_machine_readable() {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!("{:<11}{}", "Shell:", status.shell);
    if status.installed {
        let scope = status
            .scope
            .map_or_else(|| "unknown".to_string(), |s| s.to_string());
        println!(
            "{:<11}{} ({scope} scope, {})",
            "Installed:",
            "yes".green(),
            status.installation_type
        );
    } else {
        println!("{:<11}{}", "Installed:", "no".red());
    }
    if let Some(path) = &status.installation_path {
        println!("{:<11}{}", "Path:", path.display());
    }
    if let Some(version) = status.format_version {
        if status.is_outdated() {
            println!(
                "{:<11}v{version} {}",
                "Format:",
                format!("(outdated, current v{FORMAT_VERSION})").yellow()
            );
        } else {
            println!("{:<11}v{version}", "Format:");
        }
    }
    let active = match (status.installed, status.is_active) {
        (false, _) => "no".normal(),
        (true, Some(true)) => "yes".green(),
        (true, Some(false)) => "no".yellow(),
        (true, None) => "unknown".dimmed(),
    };
    println!("{:<11}{active}", "Active:");
    if let Some(message) = &status.error_message {
        println!("{:<11}{}", "Error:", message.red());
    }
    Ok(())
}

fn list_shells(completion: &Completion<'_, ProcessEnv>, config: &Config) {
    let detected = completion
        .detect_shell(config.completion.shell.as_deref())
        .ok();
    for shell in ShellKind::ALL {
        if Some(shell) == detected {
            println!("{shell} {}", "(detected)".green());
        } else {
            println!("{shell}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(action: InstallAction) -> InstallResult {
        InstallResult {
            path: PathBuf::from("/home/u/.bashrc"),
            action,
            previous_version: Some(1),
            restart_required: action != InstallAction::AlreadyInstalled,
            activation_command: "source /home/u/.bashrc".into(),
        }
    }

    #[test]
    fn test_install_summary_names_the_action() {
        assert_eq!(
            install_summary("bash", &result(InstallAction::Installed)),
            "Installed bash completion in /home/u/.bashrc"
        );
        assert_eq!(
            install_summary("bash", &result(InstallAction::Replaced)),
            "Updated bash completion in /home/u/.bashrc"
        );
        assert_eq!(
            install_summary("bash", &result(InstallAction::AlreadyInstalled)),
            "bash completion is already installed in /home/u/.bashrc"
        );
    }
}
