//! Shared helpers for the CLI.
//!
//! - [`initialize_logging`]: tracing subscriber and color control from the
//!   global flags

mod logging;

pub use logging::initialize_logging;
