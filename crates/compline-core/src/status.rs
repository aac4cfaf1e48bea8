//! Installation status.
//!
//! Status is read-only: it looks for a completion block in the user profile,
//! then the global one, and inspects the session marker variable that every
//! installed block exports. The marker only tells us something when it is
//! set and a block is installed, so [`InstallationStatus::is_active`] is a
//! tri-state.

use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::naming;
use crate::profile::{FORMAT_VERSION, InstallationScope, InstallationType, ProfileManager};
use crate::shell::{EnvReader, ShellDetector, ShellKind};

/// Snapshot of whether (and where) completion is installed for one shell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstallationStatus {
    /// Whether a completion block was found.
    pub installed: bool,
    /// The shell that was checked.
    pub shell: ShellKind,
    /// Profile holding the block.
    pub installation_path: Option<PathBuf>,
    /// How the block is attached.
    pub installation_type: InstallationType,
    /// Scope the block was found in.
    pub scope: Option<InstallationScope>,
    /// Format version of the installed block.
    pub format_version: Option<u32>,
    /// Whether an up-to-date block has been loaded into this session.
    ///
    /// `Some(true)` when the session marker names this shell and the current
    /// format version, `Some(false)` when it names another shell or an older
    /// version, `None` when nothing is installed or the marker is unset or
    /// unreadable.
    pub is_active: Option<bool>,
    /// Why the check was incomplete, if it was.
    pub error_message: Option<String>,
}

impl InstallationStatus {
    fn empty(shell: ShellKind) -> Self {
        Self {
            installed: false,
            shell,
            installation_path: None,
            installation_type: InstallationType::Unknown,
            scope: None,
            format_version: None,
            is_active: None,
            error_message: None,
        }
    }

    /// Whether the installed block predates the current format version.
    pub fn is_outdated(&self) -> bool {
        self.format_version.is_some_and(|v| v < FORMAT_VERSION)
    }
}

/// Interpret a session marker value (`<shell>:<version>`) for `shell`.
pub fn marker_activity(value: Option<&str>, shell: ShellKind) -> Option<bool> {
    let (name, version) = value?.trim().split_once(':')?;
    let marked: ShellKind = name.parse().ok()?;
    let version: u32 = version.parse().ok()?;
    Some(marked == shell && version == FORMAT_VERSION)
}

/// Reports installation status using a [`ProfileManager`] for lookups.
pub struct StatusChecker<'m, 'a, E: EnvReader + ?Sized> {
    profiles: &'m ProfileManager<'a, E>,
}

impl<'m, 'a, E: EnvReader + ?Sized> StatusChecker<'m, 'a, E> {
    /// A checker sharing `profiles`' environment and CLI name.
    pub const fn new(profiles: &'m ProfileManager<'a, E>) -> Self {
        Self { profiles }
    }

    /// Check `shell`, or the detected shell when `None`.
    ///
    /// Never fails: detection or read problems are reported through
    /// [`InstallationStatus::error_message`].
    pub fn check(&self, shell: Option<ShellKind>) -> InstallationStatus {
        let env = self.profiles.env();
        let cli_name = self.profiles.cli_name();
        let mut errors = Vec::new();

        let shell = match shell {
            Some(shell) => shell,
            None => match ShellDetector::new(env, cli_name).detect(None) {
                Ok(shell) => shell,
                Err(e) => {
                    errors.push(e.to_string());
                    env.platform().default_shell()
                },
            },
        };

        let mut status = InstallationStatus::empty(shell);

        for scope in InstallationScope::ALL {
            match self.profiles.find_installation(shell, scope) {
                Ok(Some(found)) => {
                    debug!("found {shell} completion in {}", found.location.path.display());
                    status.installed = true;
                    status.installation_type = found.location.kind;
                    status.installation_path = Some(found.location.path);
                    status.scope = Some(scope);
                    status.format_version = Some(found.version);
                    break;
                },
                Ok(None) => {},
                Err(e) => {
                    debug!("{scope} status check failed: {e}");
                    errors.push(e.to_string());
                },
            }
        }

        if status.installed {
            let marker_var = naming::session_marker_var(cli_name);
            status.is_active = marker_activity(env.var(&marker_var).as_deref(), shell);
        }
        if !errors.is_empty() {
            status.error_message = Some(errors.join("; "));
        }
        status
    }
}
