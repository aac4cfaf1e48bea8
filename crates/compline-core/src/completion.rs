//! Entry points used by a CLI's `completion` command.
//!
//! [`Completion`] ties the pieces together for one CLI: it detects the shell,
//! renders scripts from a descriptor tree, frames them with markers and the
//! session export, and hands installation to the [`ProfileManager`].

use std::path::PathBuf;

use tracing::debug;

pub use crate::generate::generate_completion;
use crate::generate::{generator_for, ScriptGenerator};
use crate::naming;
use crate::profile::{
    CompletionMarker, FORMAT_VERSION, InstallResult, InstallationScope, ProfileManager,
    UninstallResult,
};
use crate::shell::{DetectionSource, EnvReader, ShellDetector, ShellKind};
use crate::status::{InstallationStatus, StatusChecker};
use crate::tree::{is_safe_name, CommandDescriptor, TreeBuilder};
use crate::{Error, Result};

/// Options for [`Completion::install`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Target shell; detected when `None`.
    pub shell: Option<ShellKind>,
    /// Target scope.
    pub scope: InstallationScope,
    /// Replace an existing block.
    pub force: bool,
}

/// Options for [`Completion::uninstall`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Target shell; detected when `None`.
    pub shell: Option<ShellKind>,
    /// Target scope.
    pub scope: InstallationScope,
}

/// Completion operations for one CLI.
pub struct Completion<'a, E: EnvReader + ?Sized> {
    cli_name: String,
    profiles: ProfileManager<'a, E>,
}

impl<'a, E: EnvReader + ?Sized> Completion<'a, E> {
    /// Operations for `cli_name`, reading the environment through `env`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if `cli_name` is not a shell-safe word.
    pub fn new(env: &'a E, cli_name: &str) -> Result<Self> {
        if !is_safe_name(cli_name) {
            return Err(Error::Structural(format!("invalid CLI name '{cli_name}'")));
        }
        Ok(Self {
            cli_name: cli_name.to_string(),
            profiles: ProfileManager::new(env, cli_name),
        })
    }

    /// Resolve global locations under `root` (tests and packaging).
    #[must_use]
    pub fn with_system_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profiles = self.profiles.with_system_root(root);
        self
    }

    /// The underlying profile manager.
    pub fn profiles(&self) -> &ProfileManager<'a, E> {
        &self.profiles
    }

    /// Detect the invoking shell; `explicit` overrides every other signal.
    pub fn detect_shell(&self, explicit: Option<&str>) -> Result<ShellKind> {
        self.detect_shell_with_source(explicit).map(|(shell, _)| shell)
    }

    /// Like [`Self::detect_shell`], also reporting which signal decided.
    pub fn detect_shell_with_source(&self, explicit: Option<&str>) -> Result<(ShellKind, DetectionSource)> {
        ShellDetector::new(self.profiles.env(), &self.cli_name).detect_with_source(explicit)
    }

    fn resolve_shell(&self, shell: Option<ShellKind>) -> Result<ShellKind> {
        match shell {
            Some(shell) => Ok(shell),
            None => self.detect_shell(None),
        }
    }

    /// The raw completion script for `tree`.
    pub fn generate(&self, tree: &CommandDescriptor, shell: ShellKind) -> Result<String> {
        TreeBuilder::validate(tree)?;
        Ok(generator_for(shell).generate(tree, &self.cli_name))
    }

    /// The script framed exactly as it is installed: markers, script and the
    /// session export.
    pub fn script(&self, tree: &CommandDescriptor, shell: ShellKind) -> Result<String> {
        let body = self.block_body(tree, shell)?;
        Ok(CompletionMarker::new(&self.cli_name, shell)?.wrap(&body))
    }

    fn block_body(&self, tree: &CommandDescriptor, shell: ShellKind) -> Result<String> {
        let generator = generator_for(shell);
        let script = self.generate(tree, shell)?;
        let export = session_export(generator, &self.cli_name, shell);
        Ok(format!("{}\n{export}\n", script.trim_end()))
    }

    /// Install completion for `tree` into the shell profile.
    pub fn install(&self, tree: &CommandDescriptor, options: InstallOptions) -> Result<InstallResult> {
        let shell = self.resolve_shell(options.shell)?;
        debug!("installing {shell} completion ({} scope)", options.scope);
        let body = self.block_body(tree, shell)?;
        self.profiles.install(shell, options.scope, &body, options.force)
    }

    /// Remove installed completion blocks.
    pub fn uninstall(&self, options: UninstallOptions) -> Result<UninstallResult> {
        let shell = self.resolve_shell(options.shell)?;
        self.profiles.uninstall(shell, options.scope)
    }

    /// Report installation status for `shell`, or the detected shell.
    pub fn status(&self, shell: Option<ShellKind>) -> InstallationStatus {
        StatusChecker::new(&self.profiles).check(shell)
    }
}

fn session_export(generator: &dyn ScriptGenerator, cli_name: &str, shell: ShellKind) -> String {
    generator.export_statement(
        &naming::session_marker_var(cli_name),
        &format!("{shell}:{FORMAT_VERSION}"),
    )
}

/// Render and frame `tree` for `shell` as it would be installed for
/// `cli_name`.
pub fn generate_completion_script(
    tree: &CommandDescriptor,
    shell: ShellKind,
    cli_name: &str,
) -> Result<String> {
    if !is_safe_name(cli_name) {
        return Err(Error::Structural(format!("invalid CLI name '{cli_name}'")));
    }
    TreeBuilder::validate(tree)?;
    let generator = generator_for(shell);
    let script = generator.generate(tree, cli_name);
    let export = session_export(generator, cli_name, shell);
    let body = format!("{}\n{export}\n", script.trim_end());
    Ok(CompletionMarker::new(cli_name, shell)?.wrap(&body))
}
