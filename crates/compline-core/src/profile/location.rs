//! Where completion scripts live for each shell and scope.
//!
//! User scope edits the shell's interactive startup file and global scope
//! writes the system-wide location. Bash and fish have dedicated completion
//! directories system-wide, so there the block is the whole (standalone) file.
//!
//! | shell      | user                                          | global                                          |
//! |------------|-----------------------------------------------|-------------------------------------------------|
//! | bash       | `~/.bashrc`                                   | `/etc/bash_completion.d/<cli>`                  |
//! | zsh        | `${ZDOTDIR:-~}/.zshrc`                        | `/etc/zsh/zshrc` (or `/etc/zshrc`)              |
//! | fish       | `${XDG_CONFIG_HOME:-~/.config}/fish/config.fish` | `/usr/share/fish/vendor_completions.d/<cli>.fish` |
//! | powershell | `~/.config/powershell/Microsoft.PowerShell_profile.ps1` | `/opt/microsoft/powershell/7/profile.ps1` |
//!
//! On Windows the PowerShell profiles live under `Documents\PowerShell` and
//! `Program Files\PowerShell\7`.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shell::{EnvReader, Platform, ShellKind};
use crate::{Error, Result};

/// Whether an installation targets the current user or the whole system.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InstallationScope {
    /// The invoking user's startup file.
    #[default]
    User,
    /// A system-wide location; usually needs elevated privileges.
    Global,
}

impl InstallationScope {
    /// Both scopes, user first.
    pub const ALL: [Self; 2] = [Self::User, Self::Global];

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for InstallationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstallationScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "global" | "system" => Ok(Self::Global),
            other => Err(Error::Config(format!(
                "unknown installation scope '{other}' (expected 'user' or 'global')"
            ))),
        }
    }
}

/// How a completion script is attached to the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationType {
    /// A marker block inside a startup file shared with other content.
    ProfileBlock,
    /// A file that exists only to hold the completion script.
    StandaloneFile,
    /// Evidence of an installation that could not be attributed to a file.
    Unknown,
}

impl fmt::Display for InstallationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProfileBlock => "profile block",
            Self::StandaloneFile => "standalone file",
            Self::Unknown => "unknown",
        })
    }
}

/// A resolved profile target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileLocation {
    /// File to edit.
    pub path: PathBuf,
    /// Directory the path (and any symlink target) must stay inside.
    pub root: PathBuf,
    /// Whether the file is shared or dedicated.
    pub kind: InstallationType,
    /// Scope the location was resolved for.
    pub scope: InstallationScope,
}

/// Resolves profile locations from the environment.
pub(crate) struct Locator<'a, E: EnvReader + ?Sized> {
    pub(crate) env: &'a E,
    pub(crate) cli_name: &'a str,
    pub(crate) system_root: &'a Path,
}

impl<E: EnvReader + ?Sized> Locator<'_, E> {
    pub(crate) fn locate(&self, shell: ShellKind, scope: InstallationScope) -> Result<ProfileLocation> {
        let location = match scope {
            InstallationScope::User => self.user_location(shell)?,
            InstallationScope::Global => self.global_location(shell),
        };
        check_lexically_safe(&location)?;
        Ok(location)
    }

    fn home(&self) -> Result<PathBuf> {
        self.env.home_dir().ok_or_else(|| {
            Error::fs(
                "~",
                io::Error::new(io::ErrorKind::NotFound, "home directory could not be determined"),
            )
        })
    }

    /// `$var` when set, otherwise `home/fallback`; returns `(dir, root)`.
    fn env_dir_or_home(&self, var: &str, fallback: &str) -> Result<(PathBuf, PathBuf)> {
        if let Some(dir) = self.env.var(var) {
            let dir = PathBuf::from(dir);
            return Ok((dir.clone(), dir));
        }
        let home = self.home()?;
        Ok((home.join(fallback), home))
    }

    fn user_location(&self, shell: ShellKind) -> Result<ProfileLocation> {
        let (path, root) = match shell {
            ShellKind::Bash => {
                let home = self.home()?;
                (home.join(".bashrc"), home)
            },
            ShellKind::Zsh => {
                let (dir, root) = self.env_dir_or_home("ZDOTDIR", "")?;
                (dir.join(".zshrc"), root)
            },
            ShellKind::Fish => {
                let (dir, root) = self.env_dir_or_home("XDG_CONFIG_HOME", ".config")?;
                (dir.join("fish").join("config.fish"), root)
            },
            ShellKind::PowerShell => match self.env.platform() {
                Platform::Windows => {
                    let home = self.home()?;
                    (
                        home.join("Documents")
                            .join("PowerShell")
                            .join("Microsoft.PowerShell_profile.ps1"),
                        home,
                    )
                },
                Platform::Posix => {
                    let (dir, root) = self.env_dir_or_home("XDG_CONFIG_HOME", ".config")?;
                    (
                        dir.join("powershell").join("Microsoft.PowerShell_profile.ps1"),
                        root,
                    )
                },
            },
        };
        Ok(ProfileLocation {
            path,
            root,
            kind: InstallationType::ProfileBlock,
            scope: InstallationScope::User,
        })
    }

    fn global_location(&self, shell: ShellKind) -> ProfileLocation {
        let sys = self.system_root;
        let cli = self.cli_name;
        let (root, file, kind) = match shell {
            ShellKind::Bash => (
                sys.join("etc").join("bash_completion.d"),
                cli.to_string(),
                InstallationType::StandaloneFile,
            ),
            ShellKind::Zsh => {
                let debian = sys.join("etc").join("zsh");
                let root = if debian.is_dir() { debian } else { sys.join("etc") };
                (root, "zshrc".to_string(), InstallationType::ProfileBlock)
            },
            ShellKind::Fish => (
                sys.join("usr")
                    .join("share")
                    .join("fish")
                    .join("vendor_completions.d"),
                format!("{cli}.fish"),
                InstallationType::StandaloneFile,
            ),
            ShellKind::PowerShell => {
                let root = match self.env.platform() {
                    Platform::Windows => sys.join("Program Files").join("PowerShell").join("7"),
                    Platform::Posix => sys
                        .join("opt")
                        .join("microsoft")
                        .join("powershell")
                        .join("7"),
                };
                (root, "profile.ps1".to_string(), InstallationType::ProfileBlock)
            },
        };
        ProfileLocation {
            path: root.join(file),
            root,
            kind,
            scope: InstallationScope::Global,
        }
    }
}

fn unsafe_path(path: &Path, reason: impl Into<String>) -> Error {
    Error::PathSafety {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Reject relative paths, `..` components and paths outside their root.
fn check_lexically_safe(location: &ProfileLocation) -> Result<()> {
    let path = &location.path;
    if !path.is_absolute() || !location.root.is_absolute() {
        return Err(unsafe_path(path, "profile path is not absolute"));
    }
    // Starts-with is component-wise, so `..` must be ruled out separately.
    if path
        .components()
        .chain(location.root.components())
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(unsafe_path(path, "profile path contains '..'"));
    }
    if !path.starts_with(&location.root) {
        return Err(unsafe_path(
            path,
            format!("profile path is outside {}", location.root.display()),
        ));
    }
    Ok(())
}

/// The file that will actually be written for `location`.
///
/// A symlinked profile (dotfile managers) is written through to its target,
/// which must resolve inside the same root. Missing files resolve to
/// themselves.
pub(crate) fn resolve_write_target(location: &ProfileLocation) -> Result<PathBuf> {
    let path = &location.path;
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(path.clone()),
        Err(e) => return Err(Error::fs(path, e)),
    };
    if meta.is_dir() {
        return Err(unsafe_path(path, "profile path is a directory"));
    }
    if !meta.file_type().is_symlink() {
        return Ok(path.clone());
    }

    let target = std::fs::canonicalize(path).map_err(|e| Error::fs(path, e))?;
    let root = std::fs::canonicalize(&location.root).map_err(|e| Error::fs(&location.root, e))?;
    if !target.starts_with(&root) {
        return Err(unsafe_path(
            path,
            format!(
                "symlink resolves to {} outside {}",
                target.display(),
                root.display()
            ),
        ));
    }
    Ok(target)
}

// Fixture paths are POSIX-absolute.
#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shell::MapEnv;

    fn locate(env: &MapEnv, shell: ShellKind, scope: InstallationScope) -> Result<ProfileLocation> {
        Locator {
            env,
            cli_name: "compline",
            system_root: Path::new("/sysroot"),
        }
        .locate(shell, scope)
    }

    fn home_env() -> MapEnv {
        MapEnv::posix().with_var("HOME", "/home/ada")
    }

    #[test]
    fn test_user_paths() {
        let env = home_env();
        let cases = [
            (ShellKind::Bash, "/home/ada/.bashrc"),
            (ShellKind::Zsh, "/home/ada/.zshrc"),
            (ShellKind::Fish, "/home/ada/.config/fish/config.fish"),
            (
                ShellKind::PowerShell,
                "/home/ada/.config/powershell/Microsoft.PowerShell_profile.ps1",
            ),
        ];
        for (shell, expected) in cases {
            let location = locate(&env, shell, InstallationScope::User).unwrap();
            assert_eq!(location.path, PathBuf::from(expected), "{shell}");
            assert_eq!(location.kind, InstallationType::ProfileBlock);
        }
    }

    #[test]
    fn test_user_paths_honor_zdotdir_and_xdg() {
        let env = home_env()
            .with_var("ZDOTDIR", "/home/ada/.zsh")
            .with_var("XDG_CONFIG_HOME", "/home/ada/cfg");
        assert_eq!(
            locate(&env, ShellKind::Zsh, InstallationScope::User).unwrap().path,
            PathBuf::from("/home/ada/.zsh/.zshrc")
        );
        assert_eq!(
            locate(&env, ShellKind::Fish, InstallationScope::User).unwrap().path,
            PathBuf::from("/home/ada/cfg/fish/config.fish")
        );
    }

    #[test]
    fn test_global_paths_are_under_system_root() {
        let env = home_env();
        let bash = locate(&env, ShellKind::Bash, InstallationScope::Global).unwrap();
        assert_eq!(bash.path, PathBuf::from("/sysroot/etc/bash_completion.d/compline"));
        assert_eq!(bash.kind, InstallationType::StandaloneFile);

        let fish = locate(&env, ShellKind::Fish, InstallationScope::Global).unwrap();
        assert_eq!(
            fish.path,
            PathBuf::from("/sysroot/usr/share/fish/vendor_completions.d/compline.fish")
        );

        let pwsh = locate(&env, ShellKind::PowerShell, InstallationScope::Global).unwrap();
        assert_eq!(pwsh.path, PathBuf::from("/sysroot/opt/microsoft/powershell/7/profile.ps1"));
        assert_eq!(pwsh.kind, InstallationType::ProfileBlock);
    }

    #[test]
    fn test_relative_or_traversing_overrides_are_rejected() {
        let env = home_env().with_var("ZDOTDIR", "relative/dir");
        let err = locate(&env, ShellKind::Zsh, InstallationScope::User).unwrap_err();
        assert!(matches!(err, Error::PathSafety { .. }));

        let env = home_env().with_var("XDG_CONFIG_HOME", "/home/ada/../../etc");
        let err = locate(&env, ShellKind::Fish, InstallationScope::User).unwrap_err();
        assert!(matches!(err, Error::PathSafety { .. }));
    }

    #[test]
    fn test_missing_home_is_a_file_system_error() {
        let env = MapEnv::posix();
        let err = locate(&env, ShellKind::Bash, InstallationScope::User).unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("User".parse::<InstallationScope>().unwrap(), InstallationScope::User);
        assert_eq!("system".parse::<InstallationScope>().unwrap(), InstallationScope::Global);
        assert!("everywhere".parse::<InstallationScope>().is_err());
    }

    #[test]
    fn test_symlink_escaping_root_is_rejected() {
        let home = tempfile::TempDir::new().unwrap();
        let outside = tempfile::TempDir::new().unwrap();
        let target = outside.path().join("bashrc");
        std::fs::write(&target, "x\n").unwrap();
        let link = home.path().join(".bashrc");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let location = ProfileLocation {
            path: link,
            root: home.path().to_path_buf(),
            kind: InstallationType::ProfileBlock,
            scope: InstallationScope::User,
        };
        let err = resolve_write_target(&location).unwrap_err();
        assert!(matches!(err, Error::PathSafety { .. }));
    }

    #[test]
    fn test_symlink_inside_root_writes_through() {
        let home = tempfile::TempDir::new().unwrap();
        let dotfiles = home.path().join("dotfiles");
        std::fs::create_dir(&dotfiles).unwrap();
        std::fs::write(dotfiles.join("bashrc"), "x\n").unwrap();
        let link = home.path().join(".bashrc");
        std::os::unix::fs::symlink(dotfiles.join("bashrc"), &link).unwrap();

        let location = ProfileLocation {
            path: link,
            root: home.path().to_path_buf(),
            kind: InstallationType::ProfileBlock,
            scope: InstallationScope::User,
        };
        let resolved = resolve_write_target(&location).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(dotfiles.join("bashrc")).unwrap());
    }
}
