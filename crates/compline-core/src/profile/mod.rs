//! Shell profile management.
//!
//! [`ProfileManager`] owns every write to a user's shell startup files. It
//! installs a completion script as a marker-delimited block, replaces it on
//! `--force`, and removes it again, leaving the rest of the file byte-for-byte
//! as it was. Writes go to a temporary file in the same directory which is
//! then renamed over the profile, so a crash never leaves a half-written
//! startup file behind.

mod edit;
mod location;
mod marker;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

pub use location::{InstallationScope, InstallationType, ProfileLocation};
pub use marker::{BlockSpan, CompletionMarker, FORMAT_VERSION};

use crate::generate::escape::{posix_word, powershell_single};
use crate::shell::{EnvReader, Platform, ShellKind};
use crate::{Error, Result};
use location::{resolve_write_target, Locator};

/// What an install did to the profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallAction {
    /// A new block was appended.
    Installed,
    /// An existing block was replaced (`force`).
    Replaced,
    /// A block was already present; nothing was written.
    AlreadyInstalled,
}

/// Outcome of [`ProfileManager::install`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct InstallResult {
    /// The file that holds (or would hold) the block.
    pub path: PathBuf,
    /// What happened.
    pub action: InstallAction,
    /// Version of the block that was already present, if any.
    pub previous_version: Option<u32>,
    /// Whether the profile changed and open shells must reload it.
    pub restart_required: bool,
    /// Command that loads the completion into the current session.
    pub activation_command: String,
}

impl InstallResult {
    /// Whether a block was already present before this call.
    pub fn already_installed(&self) -> bool {
        self.action == InstallAction::AlreadyInstalled
    }

    /// Whether the existing block predates the current format version.
    pub fn is_outdated(&self) -> bool {
        self.already_installed() && self.previous_version.is_some_and(|v| v < FORMAT_VERSION)
    }
}

/// Outcome of [`ProfileManager::uninstall`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct UninstallResult {
    /// The profile that was inspected.
    pub path: PathBuf,
    /// Number of blocks removed; zero when nothing was installed.
    pub removed_blocks: usize,
}

/// A block found by [`ProfileManager::find_installation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundInstallation {
    /// Where it was found.
    pub location: ProfileLocation,
    /// Format version of the first block.
    pub version: u32,
}

/// Reads and edits shell profiles on behalf of one CLI.
pub struct ProfileManager<'a, E: EnvReader + ?Sized> {
    env: &'a E,
    cli_name: String,
    system_root: PathBuf,
}

impl<'a, E: EnvReader + ?Sized> ProfileManager<'a, E> {
    /// A manager for `cli_name` that resolves locations from `env`.
    pub fn new(env: &'a E, cli_name: impl Into<String>) -> Self {
        let system_root = match env.platform() {
            Platform::Posix => PathBuf::from("/"),
            Platform::Windows => PathBuf::from(r"C:\"),
        };
        Self {
            env,
            cli_name: cli_name.into(),
            system_root,
        }
    }

    /// Resolve global locations under `root` instead of the filesystem root.
    #[must_use]
    pub fn with_system_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.system_root = root.into();
        self
    }

    /// Environment the manager reads.
    pub fn env(&self) -> &'a E {
        self.env
    }

    /// CLI the manager edits profiles for.
    pub fn cli_name(&self) -> &str {
        &self.cli_name
    }

    /// Resolve the profile for `shell` and `scope` without touching it.
    ///
    /// Read-only callers (status, uninstall) use this; see
    /// [`Self::ensure_profile`] for the variant that creates the file.
    pub fn locate_profile(&self, shell: ShellKind, scope: InstallationScope) -> Result<ProfileLocation> {
        Locator {
            env: self.env,
            cli_name: &self.cli_name,
            system_root: &self.system_root,
        }
        .locate(shell, scope)
    }

    /// Resolve the profile and make sure it exists, creating parent
    /// directories and an empty file when absent. Existing content is never
    /// touched.
    pub fn ensure_profile(&self, shell: ShellKind, scope: InstallationScope) -> Result<ProfileLocation> {
        let location = self.locate_profile(shell, scope)?;
        ensure_file(&resolve_write_target(&location)?)?;
        Ok(location)
    }

    /// Command that loads `path` into a running `shell`.
    pub fn activation_command(shell: ShellKind, path: &Path) -> String {
        let display = path.display().to_string();
        match shell {
            ShellKind::PowerShell => format!(". {}", powershell_single(&display)),
            ShellKind::Bash | ShellKind::Zsh | ShellKind::Fish => {
                format!("source {}", posix_word(&display))
            },
        }
    }

    /// Install `body` as a completion block.
    ///
    /// Without `force` an existing block is left alone and reported as
    /// already installed (with its version, so callers can flag outdated
    /// blocks). With `force` the first block is replaced in place and any
    /// duplicates are dropped.
    pub fn install(
        &self,
        shell: ShellKind,
        scope: InstallationScope,
        body: &str,
        force: bool,
    ) -> Result<InstallResult> {
        let marker = CompletionMarker::new(&self.cli_name, shell)?;
        let location = self.ensure_profile(shell, scope)?;
        let target = resolve_write_target(&location)?;
        let content = read_profile(&target)?.unwrap_or_default();
        let spans = marker.find_blocks(&content, &target)?;
        let block = marker.wrap(body);
        let activation_command = Self::activation_command(shell, &location.path);

        let (updated, action, previous_version) = match spans.split_first() {
            None => (edit::append_block(&content, &block), InstallAction::Installed, None),
            Some((first, _)) if !force => {
                debug!(
                    "completion block v{} already present in {}",
                    first.version,
                    target.display()
                );
                if first.version < FORMAT_VERSION {
                    warn!(
                        "completion block in {} is format v{}, current is v{FORMAT_VERSION}; re-run with --force to update",
                        target.display(),
                        first.version
                    );
                }
                return Ok(InstallResult {
                    path: location.path,
                    action: InstallAction::AlreadyInstalled,
                    previous_version: Some(first.version),
                    restart_required: false,
                    activation_command,
                });
            },
            Some((first, duplicates)) => {
                let without_duplicates = edit::remove_blocks(&content, duplicates);
                (
                    edit::replace_block(&without_duplicates, *first, &block),
                    InstallAction::Replaced,
                    Some(first.version),
                )
            },
        };

        let changed = updated != content;
        if changed {
            write_atomic(&target, &updated)?;
            info!("installed {shell} completion into {}", target.display());
        }

        Ok(InstallResult {
            path: location.path,
            action,
            previous_version,
            restart_required: changed,
            activation_command,
        })
    }

    /// Remove every completion block for `shell` from the `scope` profile.
    ///
    /// A missing file or a file without a block is a successful no-op and is
    /// never rewritten.
    pub fn uninstall(&self, shell: ShellKind, scope: InstallationScope) -> Result<UninstallResult> {
        let location = self.locate_profile(shell, scope)?;
        let target = resolve_write_target(&location)?;
        let Some(content) = read_profile(&target)? else {
            debug!("{} does not exist, nothing to uninstall", target.display());
            return Ok(UninstallResult {
                path: location.path,
                removed_blocks: 0,
            });
        };

        let marker = CompletionMarker::new(&self.cli_name, shell)?;
        let spans = marker.find_blocks(&content, &target)?;
        if !spans.is_empty() {
            let updated = edit::remove_blocks(&content, &spans);
            write_atomic(&target, &updated)?;
            info!(
                "removed {} {shell} completion block(s) from {}",
                spans.len(),
                target.display()
            );
        }

        Ok(UninstallResult {
            path: location.path,
            removed_blocks: spans.len(),
        })
    }

    /// Look for an installed block for `shell` in the `scope` profile.
    pub fn find_installation(
        &self,
        shell: ShellKind,
        scope: InstallationScope,
    ) -> Result<Option<FoundInstallation>> {
        let location = self.locate_profile(shell, scope)?;
        let target = resolve_write_target(&location)?;
        let Some(content) = read_profile(&target)? else {
            return Ok(None);
        };
        let marker = CompletionMarker::new(&self.cli_name, shell)?;
        let spans = marker.find_blocks(&content, &target)?;
        Ok(spans.first().map(|span| FoundInstallation {
            location,
            version: span.version,
        }))
    }
}

/// Create `path` and its parent directories if they do not exist.
fn ensure_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::fs(parent, e))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::fs(path, e))?;
    Ok(())
}

/// Read a profile; `None` when it does not exist.
fn read_profile(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::fs(path, e)),
    }
}

/// Replace `path` with `content` via a sibling temp file and a rename,
/// keeping the original permissions.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".compline-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::fs(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::fs(tmp.path(), e))?;

    if let Ok(meta) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), meta.permissions()).map_err(|e| Error::fs(tmp.path(), e))?;
    }

    tmp.persist(path).map_err(|e| Error::fs(path, e.error))?;
    debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shell::MapEnv;
    use std::fs;
    use tempfile::TempDir;

    const SCRIPT: &str = "complete -F _compline_complete compline";

    fn setup() -> (TempDir, MapEnv) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let env = MapEnv::posix().with_var("HOME", dir.path().display().to_string());
        (dir, env)
    }

    fn manager<'a>(env: &'a MapEnv, dir: &TempDir) -> ProfileManager<'a, MapEnv> {
        ProfileManager::new(env, "compline").with_system_root(dir.path().join("sys"))
    }

    #[test]
    fn test_install_appends_block_and_preserves_content() {
        let (dir, env) = setup();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "export A=1\n").unwrap();

        let result = manager(&env, &dir)
            .install(ShellKind::Bash, InstallationScope::User, SCRIPT, false)
            .unwrap();

        assert_eq!(result.action, InstallAction::Installed);
        assert!(result.restart_required);
        assert_eq!(result.path, rc);
        assert_eq!(result.activation_command, format!("source {}", rc.display()));
        let content = fs::read_to_string(&rc).unwrap();
        assert_eq!(
            content,
            format!(
                "export A=1\n\n# BEGIN compline completion v1 [bash]\n{SCRIPT}\n# END compline completion [bash]\n"
            )
        );
    }

    #[test]
    fn test_install_twice_is_idempotent() {
        let (dir, env) = setup();
        let mgr = manager(&env, &dir);
        mgr.install(ShellKind::Bash, InstallationScope::User, SCRIPT, false).unwrap();
        let first = fs::read_to_string(dir.path().join(".bashrc")).unwrap();

        let second = mgr
            .install(ShellKind::Bash, InstallationScope::User, SCRIPT, false)
            .unwrap();
        assert!(second.already_installed());
        assert!(!second.restart_required);
        assert_eq!(fs::read_to_string(dir.path().join(".bashrc")).unwrap(), first);
    }

    #[test]
    fn test_force_replaces_block_in_place() {
        let (dir, env) = setup();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "a\n").unwrap();
        let mgr = manager(&env, &dir);
        mgr.install(ShellKind::Bash, InstallationScope::User, "old", false).unwrap();
        fs::write(&rc, format!("{}z\n", fs::read_to_string(&rc).unwrap())).unwrap();

        let result = mgr
            .install(ShellKind::Bash, InstallationScope::User, "new", true)
            .unwrap();
        assert_eq!(result.action, InstallAction::Replaced);
        assert!(result.restart_required);
        assert_eq!(
            fs::read_to_string(&rc).unwrap(),
            "a\n\n# BEGIN compline completion v1 [bash]\nnew\n# END compline completion [bash]\nz\n"
        );
    }

    #[test]
    fn test_outdated_block_is_reported_not_replaced() {
        let (dir, env) = setup();
        let rc = dir.path().join(".bashrc");
        let old = "# BEGIN compline completion v0 [bash]\nold\n# END compline completion [bash]\n";
        fs::write(&rc, old).unwrap();

        let result = manager(&env, &dir)
            .install(ShellKind::Bash, InstallationScope::User, SCRIPT, false)
            .unwrap();
        assert!(result.is_outdated());
        assert_eq!(result.previous_version, Some(0));
        assert_eq!(fs::read_to_string(&rc).unwrap(), old);
    }

    #[test]
    fn test_uninstall_restores_original_content() {
        let (dir, env) = setup();
        let rc = dir.path().join(".bashrc");
        let original = "export A=1\nalias g=git\n";
        fs::write(&rc, original).unwrap();
        let mgr = manager(&env, &dir);
        mgr.install(ShellKind::Bash, InstallationScope::User, SCRIPT, false).unwrap();

        let result = mgr.uninstall(ShellKind::Bash, InstallationScope::User).unwrap();
        assert_eq!(result.removed_blocks, 1);
        assert_eq!(fs::read_to_string(&rc).unwrap(), original);
    }

    #[test]
    fn test_uninstall_without_block_does_not_create_or_touch_files() {
        let (dir, env) = setup();
        let mgr = manager(&env, &dir);
        let result = mgr.uninstall(ShellKind::Zsh, InstallationScope::User).unwrap();
        assert_eq!(result.removed_blocks, 0);
        assert!(!dir.path().join(".zshrc").exists());
    }

    #[test]
    fn test_other_shell_blocks_are_untouched() {
        let (dir, env) = setup();
        let rc = dir.path().join(".bashrc");
        let zsh_block = "# BEGIN compline completion v1 [zsh]\nz\n# END compline completion [zsh]\n";
        fs::write(&rc, zsh_block).unwrap();
        let mgr = manager(&env, &dir);
        mgr.install(ShellKind::Bash, InstallationScope::User, SCRIPT, false).unwrap();
        mgr.uninstall(ShellKind::Bash, InstallationScope::User).unwrap();
        assert_eq!(fs::read_to_string(&rc).unwrap(), zsh_block);
    }

    #[test]
    fn test_malformed_block_blocks_install_and_uninstall() {
        let (dir, env) = setup();
        let rc = dir.path().join(".bashrc");
        let broken = "x\n# BEGIN compline completion v1 [bash]\nhalf\n";
        fs::write(&rc, broken).unwrap();
        let mgr = manager(&env, &dir);

        let err = mgr
            .install(ShellKind::Bash, InstallationScope::User, SCRIPT, true)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedBlock { line: 2, .. }));
        let err = mgr.uninstall(ShellKind::Bash, InstallationScope::User).unwrap_err();
        assert!(matches!(err, Error::MalformedBlock { .. }));
        assert_eq!(fs::read_to_string(&rc).unwrap(), broken);
    }

    #[test]
    fn test_install_creates_missing_directories() {
        let (dir, env) = setup();
        let result = manager(&env, &dir)
            .install(ShellKind::Fish, InstallationScope::User, SCRIPT, false)
            .unwrap();
        assert_eq!(result.path, dir.path().join(".config/fish/config.fish"));
        assert!(result.path.exists());
    }

    #[test]
    fn test_locate_is_read_only_and_ensure_creates() {
        let (dir, env) = setup();
        let mgr = manager(&env, &dir);
        let config = dir.path().join(".config/fish/config.fish");

        let located = mgr.locate_profile(ShellKind::Fish, InstallationScope::User).unwrap();
        assert_eq!(located.path, config);
        assert!(!config.parent().unwrap().exists());

        let ensured = mgr.ensure_profile(ShellKind::Fish, InstallationScope::User).unwrap();
        assert_eq!(ensured, located);
        assert_eq!(fs::read_to_string(&config).unwrap(), "");

        fs::write(&config, "set -x A 1\n").unwrap();
        mgr.ensure_profile(ShellKind::Fish, InstallationScope::User).unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), "set -x A 1\n");
    }

    #[test]
    fn test_global_standalone_file() {
        let (dir, env) = setup();
        let mgr = manager(&env, &dir);
        let result = mgr
            .install(ShellKind::Bash, InstallationScope::Global, SCRIPT, false)
            .unwrap();
        assert_eq!(result.path, dir.path().join("sys/etc/bash_completion.d/compline"));

        let found = mgr
            .find_installation(ShellKind::Bash, InstallationScope::Global)
            .unwrap()
            .unwrap();
        assert_eq!(found.location.kind, InstallationType::StandaloneFile);
        assert_eq!(found.version, FORMAT_VERSION);
    }

    #[test]
    fn test_permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, env) = setup();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "x\n").unwrap();
        fs::set_permissions(&rc, fs::Permissions::from_mode(0o600)).unwrap();

        manager(&env, &dir)
            .install(ShellKind::Bash, InstallationScope::User, SCRIPT, false)
            .unwrap();
        let mode = fs::metadata(&rc).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_powershell_activation_command() {
        let cmd = ProfileManager::<MapEnv>::activation_command(
            ShellKind::PowerShell,
            Path::new("/home/o'neil/profile.ps1"),
        );
        assert_eq!(cmd, ". '/home/o''neil/profile.ps1'");
    }
}
