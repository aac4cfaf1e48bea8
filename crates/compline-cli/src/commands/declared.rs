//! Commands declared in the configuration file.

use tracing::debug;

/// Run a declared command: print its configured message.
pub fn execute(name: &str, message: Option<&str>) {
    match message {
        Some(message) => println!("{message}"),
        None => debug!("'{name}' has no message configured"),
    }
}
