//! Error types and handling for compline-core operations.
//!
//! Every fallible operation in this crate returns [`Result<T, Error>`]. The
//! variants follow the failure taxonomy of the completion subsystem:
//!
//! - **Structural**: the command tree violates an invariant (duplicate
//!   siblings, unsafe names). Fatal, never retried.
//! - **File system**: a profile file could not be read or written.
//!   Recoverable by the user (permissions, elevation), never retried here.
//! - **Path safety**: a resolved path escapes the sanctioned directories.
//!   Fatal, never silently corrected.
//! - **Unsupported shell**: an explicit override names a shell we do not know.
//! - **Malformed block**: a profile contains a begin marker without its end
//!   marker, so no edit can be made safely.
//! - **Configuration**: the config file exists but cannot be parsed.
//!
//! ## Suggestions
//!
//! The CLI renders each error as a single line plus an optional hint:
//!
//! ```rust
//! use compline_core::Error;
//! use std::path::PathBuf;
//!
//! let err = Error::PathSafety {
//!     path: PathBuf::from("/etc/passwd"),
//!     reason: "outside the home directory".into(),
//! };
//! assert_eq!(err.category(), "path_safety");
//! assert!(!err.is_recoverable());
//! assert!(err.suggestion().is_some());
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::shell::ShellKind;

/// The main error type for compline-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A command tree invariant was violated.
    ///
    /// ## Common Causes
    ///
    /// - Two sibling commands registered under the same name
    /// - Two discovered commands claiming the same name
    /// - A command name or flag containing characters that are not safe to
    ///   splice into a shell script
    #[error("Structural error: {0}")]
    Structural(String),

    /// Reading or writing a profile file failed.
    ///
    /// The operation is aborted before any partial mutation becomes visible.
    #[error("File system error at {}: {source}", path.display())]
    FileSystem {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A resolved path falls outside the directories we are allowed to touch.
    #[error("Refusing to modify {}: {reason}", path.display())]
    PathSafety {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// An explicit shell override names a shell that is not supported.
    #[error(
        "Unsupported shell '{name}' (supported: {})",
        ShellKind::supported_names().join(", ")
    )]
    UnsupportedShell {
        /// The name that failed to resolve.
        name: String,
    },

    /// A completion block in a profile is missing its end marker.
    #[error("Malformed completion block in {} at line {line}: {reason}", path.display())]
    MalformedBlock {
        /// Profile file containing the block.
        path: PathBuf,
        /// One-based line of the begin marker.
        line: usize,
        /// What is wrong with the block.
        reason: String,
    },

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Whether the user can fix the failure and simply run the command again.
    ///
    /// Only file-system failures qualify. Nothing in this crate retries
    /// automatically: retrying a permission failure is pointless and retrying
    /// a write could insert a second marker block.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::FileSystem { .. })
    }

    /// Short identifier for the error category.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Structural(_) => "structural",
            Self::FileSystem { .. } => "file_system",
            Self::PathSafety { .. } => "path_safety",
            Self::UnsupportedShell { .. } => "unsupported_shell",
            Self::MalformedBlock { .. } => "malformed_block",
            Self::Config(_) => "config",
        }
    }

    /// A hint shown beneath the error line, when one applies.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::FileSystem { path, source } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    Some(format!(
                        "check the permissions of {} or re-run with elevated privileges",
                        path.display()
                    ))
                } else {
                    Some(format!("check that {} is readable and writable", path.display()))
                }
            },
            Self::PathSafety { .. } => Some(
                "profiles are only written inside the home directory or the system completion directories"
                    .to_string(),
            ),
            Self::UnsupportedShell { .. } => Some(format!(
                "pass one of: {}",
                ShellKind::supported_names().join(", ")
            )),
            Self::MalformedBlock { path, .. } => Some(format!(
                "remove the incomplete completion block from {} by hand",
                path.display()
            )),
            Self::Config(_) => Some("fix or remove the compline config file".to_string()),
            Self::Structural(_) => None,
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
