//! Shell classification.
//!
//! [`ShellDetector`] decides which of the four supported shells invoked the
//! CLI, without spawning a process. The signals, in priority order:
//!
//! 1. An explicit override: the `--shell` flag, then `<CLI>_SHELL`.
//! 2. The basename of `$SHELL`.
//! 3. The name of the parent process (Linux `/proc`, a plain file read).
//! 4. The platform default: `bash` on POSIX, `powershell` on Windows.
//!
//! All environment access goes through [`EnvReader`] so detection can be tested
//! without touching the real process environment.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::naming;
use crate::{Error, Result};

/// A shell we can generate completions for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// GNU Bash.
    Bash,
    /// Z shell.
    Zsh,
    /// fish.
    Fish,
    /// PowerShell (Windows PowerShell and `pwsh`).
    #[value(name = "powershell", alias = "pwsh")]
    PowerShell,
}

impl ShellKind {
    /// Every supported shell, in display order.
    pub const ALL: [Self; 4] = [Self::Bash, Self::Zsh, Self::Fish, Self::PowerShell];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
            Self::PowerShell => "powershell",
        }
    }

    /// Canonical names of all supported shells.
    #[must_use]
    pub fn supported_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|shell| shell.name()).collect()
    }

    /// Classify an executable path or bare name.
    ///
    /// Directory components (either separator), a login-shell `-` prefix and a
    /// `.exe` suffix are ignored; the comparison is case-insensitive.
    #[must_use]
    pub fn from_executable(path: &str) -> Option<Self> {
        let base = path.trim().rsplit(['/', '\\']).next()?;
        let lower = base.trim_start_matches('-').to_ascii_lowercase();
        match lower.strip_suffix(".exe").unwrap_or(&lower) {
            "bash" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            "fish" => Some(Self::Fish),
            "pwsh" | "powershell" => Some(Self::PowerShell),
            _ => None,
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShellKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_executable(s).ok_or_else(|| Error::UnsupportedShell {
            name: s.trim().to_string(),
        })
    }
}

/// Operating-system family, as far as shell conventions are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    /// Linux, macOS and the BSDs.
    Posix,
    /// Windows.
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Posix }
    }

    /// The shell assumed when no signal identifies one.
    #[must_use]
    pub const fn default_shell(self) -> ShellKind {
        match self {
            Self::Posix => ShellKind::Bash,
            Self::Windows => ShellKind::PowerShell,
        }
    }
}

/// Read access to the process environment.
pub trait EnvReader {
    /// Value of an environment variable; empty values count as unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Platform family used for defaults and profile locations.
    fn platform(&self) -> Platform;

    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME")
            .or_else(|| self.var("USERPROFILE"))
            .map(PathBuf::from)
    }

    /// Executable name of the parent process, if it can be read cheaply.
    fn parent_process_name(&self) -> Option<String> {
        None
    }
}

/// [`EnvReader`] backed by the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    fn platform(&self) -> Platform {
        Platform::current()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME")
            .map(PathBuf::from)
            .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
    }

    #[cfg(target_os = "linux")]
    fn parent_process_name(&self) -> Option<String> {
        let ppid = std::os::unix::process::parent_id();
        std::fs::read_to_string(format!("/proc/{ppid}/comm"))
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

/// In-memory [`EnvReader`] for tests and embedding.
#[derive(Clone, Debug)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    platform: Platform,
    parent: Option<String>,
}

impl MapEnv {
    /// An empty POSIX environment.
    #[must_use]
    pub fn posix() -> Self {
        Self {
            vars: HashMap::new(),
            platform: Platform::Posix,
            parent: None,
        }
    }

    /// An empty Windows environment.
    #[must_use]
    pub fn windows() -> Self {
        Self {
            platform: Platform::Windows,
            ..Self::posix()
        }
    }

    /// Add a variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the parent process name.
    #[must_use]
    pub fn with_parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }
}

impl EnvReader for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn parent_process_name(&self) -> Option<String> {
        self.parent.clone()
    }
}

/// Which signal decided the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionSource {
    /// The caller passed a shell explicitly.
    Explicit,
    /// The `<CLI>_SHELL` variable.
    OverrideVar,
    /// The basename of `$SHELL`.
    ShellVar,
    /// The parent process name.
    ParentProcess,
    /// Nothing matched; platform default.
    PlatformDefault,
}

/// Classifies the invoking shell for one CLI.
pub struct ShellDetector<'a, E: EnvReader + ?Sized> {
    env: &'a E,
    cli_name: &'a str,
}

impl<'a, E: EnvReader + ?Sized> ShellDetector<'a, E> {
    /// Create a detector reading `env` on behalf of `cli_name`.
    pub const fn new(env: &'a E, cli_name: &'a str) -> Self {
        Self { env, cli_name }
    }

    /// Detect the shell, honoring an explicit override when given.
    ///
    /// Only an unrecognized override fails; without one, detection always
    /// resolves to a shell.
    pub fn detect(&self, explicit: Option<&str>) -> Result<ShellKind> {
        self.detect_with_source(explicit).map(|(shell, _)| shell)
    }

    /// Like [`Self::detect`] but also reports which signal decided.
    pub fn detect_with_source(&self, explicit: Option<&str>) -> Result<(ShellKind, DetectionSource)> {
        if let Some(name) = explicit.filter(|name| !name.trim().is_empty()) {
            return Ok((name.parse()?, DetectionSource::Explicit));
        }

        let override_var = naming::shell_override_var(self.cli_name);
        if let Some(name) = self.env.var(&override_var) {
            debug!("shell override from {override_var}: {name}");
            return Ok((name.parse()?, DetectionSource::OverrideVar));
        }

        if let Some(shell) = self
            .env
            .var("SHELL")
            .as_deref()
            .and_then(ShellKind::from_executable)
        {
            debug!("shell detected from $SHELL: {shell}");
            return Ok((shell, DetectionSource::ShellVar));
        }

        if let Some(shell) = self
            .env
            .parent_process_name()
            .as_deref()
            .and_then(ShellKind::from_executable)
        {
            debug!("shell detected from parent process: {shell}");
            return Ok((shell, DetectionSource::ParentProcess));
        }

        let shell = self.env.platform().default_shell();
        debug!("no shell signal found, defaulting to {shell}");
        Ok((shell, DetectionSource::PlatformDefault))
    }
}
