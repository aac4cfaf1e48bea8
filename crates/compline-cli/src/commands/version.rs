//! `version` built-in

/// Print the CLI and core versions.
pub fn execute() {
    println!("compline {}", env!("CARGO_PKG_VERSION"));
    println!("completion format v{}", compline_core::FORMAT_VERSION);
}
