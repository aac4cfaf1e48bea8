//! CLI error handling with semantic exit codes.
//!
//! Errors are categorized so that scripts installing completion can tell a
//! permission problem from a refused path or a broken profile.
//!
//! # Exit Code Categories
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or unsupported shell |
//! | 3 | `Permission` | Profile file could not be read or written |
//! | 4 | `Safety` | Target path outside the sanctioned directories |
//! | 5 | `Integrity` | Invalid command tree or malformed completion block |
//! | 6 | `Config` | Configuration file could not be loaded |
//!
//! # Usage
//!
//! ```bash
//! compline completion install --scope global
//! case $? in
//!     0) echo "Installed" ;;
//!     3) echo "Re-run with elevated privileges" ;;
//!     *) echo "Other error" ;;
//! esac
//! ```

use std::fmt;
use std::process::ExitCode;

use colored::Colorize;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or unsupported shell (exit code 2).
    Usage = 2,

    /// File system access failed (exit code 3).
    ///
    /// Usually fixable by the user: permissions, elevation, a read-only
    /// mount.
    Permission = 3,

    /// Path safety violation (exit code 4).
    ///
    /// The resolved target escapes the home or system root. Never corrected
    /// automatically.
    Safety = 4,

    /// Structural or profile integrity error (exit code 5).
    Integrity = 5,

    /// Configuration error (exit code 6).
    Config = 6,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::Permission => "permission error",
            Self::Safety => "path safety error",
            Self::Integrity => "integrity error",
            Self::Config => "configuration error",
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that did not come from `compline_core`.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("permission denied")
            || msg_lower.contains("access is denied")
            || msg_lower.contains("read-only")
        {
            return Self::Permission;
        }

        if msg_lower.contains("refusing to modify") || msg_lower.contains("escapes") {
            return Self::Safety;
        }

        if msg_lower.contains("malformed")
            || msg_lower.contains("corrupt")
            || msg_lower.contains("structural")
        {
            return Self::Integrity;
        }

        if msg_lower.contains("configuration") || msg_lower.contains("config file") {
            return Self::Config;
        }

        if msg_lower.contains("invalid argument")
            || msg_lower.contains("missing required")
            || msg_lower.contains("invalid value")
            || msg_lower.contains("unsupported shell")
        {
            return Self::Usage;
        }

        Self::Internal
    }
}

impl From<&compline_core::Error> for ErrorCategory {
    fn from(err: &compline_core::Error) -> Self {
        use compline_core::Error;
        match err {
            Error::UnsupportedShell { .. } => Self::Usage,
            Error::FileSystem { .. } => Self::Permission,
            Error::PathSafety { .. } => Self::Safety,
            Error::Structural(_) | Error::MalformedBlock { .. } => Self::Integrity,
            Error::Config(_) => Self::Config,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a CLI error, inferring the category from the error message.
    pub fn inferred(source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        let category = category_of(&source);
        Self { category, source }
    }

    /// Create an internal error.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Internal, source)
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }

    /// Create an `ExitCode` from this error.
    #[must_use]
    pub fn as_exit_code(&self) -> ExitCode {
        self.category.as_exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

fn core_error(err: &anyhow::Error) -> Option<&compline_core::Error> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<compline_core::Error>())
}

fn category_of(err: &anyhow::Error) -> ErrorCategory {
    if let Some(core) = core_error(err) {
        return ErrorCategory::from(core);
    }
    ErrorCategory::infer_from_message(&err.to_string())
}

/// Determine the exit code from an `anyhow::Error`.
///
/// A `CliError` keeps its category, a `compline_core::Error` anywhere in the
/// chain is mapped explicitly, and anything else is inferred from the message.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    category_of(err).exit_code()
}

/// Print `err` to stderr: one line, an optional hint, and the full chain when
/// debug logging is enabled.
pub fn report(err: &anyhow::Error) {
    eprintln!("{} {err}", "error:".red().bold());
    if let Some(hint) = core_error(err).and_then(compline_core::Error::suggestion) {
        eprintln!("  {} {hint}", "hint:".yellow());
    }
    if tracing::enabled!(tracing::Level::DEBUG) {
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
}
