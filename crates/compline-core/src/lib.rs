//! # compline-core
//!
//! Command registration and shell completion for CLI tools.
//!
//! This crate turns a CLI's command tree into completion scripts for bash,
//! zsh, fish and PowerShell, and installs them into shell startup files
//! without disturbing anything else in those files.
//!
//! ## Architecture
//!
//! - **Tree**: [`CommandDescriptor`] snapshots built from `clap` or by hand
//! - **Registry**: merges built-in and discovered commands with precedence rules
//! - **Shell detection**: explicit override, `$SHELL`, parent process, platform default
//! - **Generators**: one deterministic script builder per shell dialect
//! - **Profiles**: marker-delimited blocks, atomic writes, path safety checks
//! - **Status**: where completion is installed and whether this session loaded it
//!
//! ## Quick Start
//!
//! ```rust
//! use compline_core::{generate_completion, CommandDescriptor, OptionDescriptor, ShellKind};
//!
//! let tree = CommandDescriptor::new("mycli")
//!     .with_option(OptionDescriptor::new(["-v", "--verbose"]))
//!     .with_subcommand(CommandDescriptor::new("deploy").with_description("Deploy the app"));
//!
//! let script = generate_completion(&tree, ShellKind::Zsh)?;
//! assert!(script.starts_with("#compdef mycli"));
//! # Ok::<(), compline_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`]:
//!
//! ```rust
//! use compline_core::{Error, ShellKind};
//!
//! match "tcsh".parse::<ShellKind>() {
//!     Ok(shell) => println!("shell: {shell}"),
//!     Err(Error::UnsupportedShell { name }) => eprintln!("unsupported: {name}"),
//!     Err(e) => eprintln!("error: {e}"),
//! }
//! ```

/// Completion entry points for a CLI
pub mod completion;
/// Configuration file loading
pub mod config;
/// Error types and result aliases
pub mod error;
/// Shell script generators
pub mod generate;
/// Identifier and environment variable naming
pub mod naming;
/// Shell profile editing
pub mod profile;
/// Built-in and discovered command registration
pub mod registry;
/// Shell classification and environment access
pub mod shell;
/// Installation status reporting
pub mod status;
/// Command descriptor trees
pub mod tree;

// Re-export commonly used types
pub use completion::{
    generate_completion, generate_completion_script, Completion, InstallOptions, UninstallOptions,
};
pub use config::{CompletionConfig, Config, DeclaredCommand};
pub use error::{Error, Result};
pub use generate::{generator_for, ScriptGenerator};
pub use profile::{
    InstallAction, InstallResult, InstallationScope, InstallationType, ProfileLocation,
    ProfileManager, UninstallResult, FORMAT_VERSION,
};
pub use registry::{
    register, BuiltinCommand, CommandOrigin, Diagnostic, DiscoveredCommand, RegisteredCommand,
    Registration,
};
pub use shell::{DetectionSource, EnvReader, MapEnv, Platform, ProcessEnv, ShellDetector, ShellKind};
pub use status::{InstallationStatus, StatusChecker};
pub use tree::{ArgDescriptor, CommandDescriptor, CommandPath, OptionDescriptor, TreeBuilder};
