//! Configuration for the completion subsystem.
//!
//! Configuration is a single optional TOML file. A missing file means
//! defaults; a malformed file is an error rather than a silent fallback.
//!
//! ## File Location
//!
//! The first of these that is set wins:
//!
//! 1. `$COMPLINE_CONFIG` (path to the file itself)
//! 2. `$COMPLINE_CONFIG_DIR/config.toml`
//! 3. `$XDG_CONFIG_HOME/compline/config.toml`
//! 4. `~/.compline/config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [completion]
//! shell = "zsh"      # skip detection
//! scope = "user"     # default for install/uninstall
//!
//! [builtins]
//! hello = true       # opt into the greeting command
//!
//! [[commands]]
//! name = "deploy"
//! description = "Deploy the current project"
//! message = "Deploying..."
//! options = [
//!     { flags = ["-e", "--env"], takes_value = true, description = "Target environment" },
//!     { flags = ["--strategy"], takes_value = true, possible_values = ["rolling", "blue-green"] },
//! ]
//! positional_args = [{ name = "TARGET" }]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::profile::InstallationScope;
use crate::shell::{EnvReader, ShellKind};
use crate::tree::CommandDescriptor;
use crate::{Error, Result};

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for completion commands.
    pub completion: CompletionConfig,
    /// Built-in command toggles by name; unlisted built-ins keep their default.
    pub builtins: BTreeMap<String, bool>,
    /// Commands declared in configuration rather than compiled in.
    pub commands: Vec<DeclaredCommand>,
}

/// `[completion]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Shell name that bypasses detection.
    pub shell: Option<String>,
    /// Scope used when none is given on the command line.
    pub scope: InstallationScope,
}

/// One `[[commands]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredCommand {
    /// Shape of the command as seen by the parser and completion.
    #[serde(flatten)]
    pub descriptor: CommandDescriptor,
    /// Text printed when the command runs.
    #[serde(default)]
    pub message: Option<String>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or contains
    /// invalid TOML.
    pub fn load<E: EnvReader + ?Sized>(env: &E) -> Result<Self> {
        match Self::config_path(env) {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no configuration location could be determined, using defaults");
                Ok(Self::default())
            },
        }
    }

    /// Load configuration from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse configuration text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if let Some(shell) = &config.completion.shell {
            shell.parse::<ShellKind>()?;
        }
        Ok(config)
    }

    /// Resolve the configuration file path (see the module docs for order).
    pub fn config_path<E: EnvReader + ?Sized>(env: &E) -> Option<PathBuf> {
        if let Some(file) = env.var("COMPLINE_CONFIG") {
            return Some(PathBuf::from(file));
        }
        if let Some(dir) = env.var("COMPLINE_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.toml"));
        }
        if let Some(dir) = env.var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(dir).join("compline").join("config.toml"));
        }
        env.home_dir()
            .map(|home| home.join(".compline").join("config.toml"))
    }

    /// Whether the built-in `name` is enabled, given its compiled-in default.
    pub fn builtin_enabled(&self, name: &str, default: bool) -> bool {
        self.builtins.get(name).copied().unwrap_or(default)
    }

    /// Configured shell, already validated by [`Self::from_toml`].
    pub fn shell(&self) -> Option<ShellKind> {
        self.completion.shell.as_deref().and_then(|s| s.parse().ok())
    }
}
