//! Progress display utilities

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

/// Spinner for file operations of unknown duration.
///
/// Draws on stderr only when stderr is a terminal and output is not quiet.
/// The final success line goes to stdout unless output is quiet.
pub struct Spinner {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl Spinner {
    /// Start a spinner with the given message.
    pub fn start(message: impl Into<String>, quiet: bool) -> Self {
        if quiet || !std::io::stderr().is_terminal() {
            return Self { bar: None, quiet };
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.into());
        pb.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar: Some(pb),
            quiet,
        }
    }

    /// Clear the spinner and print `message` to stdout.
    pub fn success(&self, message: &str) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
        if let Some(line) = self.success_line(message) {
            println!("{line}");
        }
    }

    fn success_line(&self, message: &str) -> Option<String> {
        (!self.quiet).then(|| format!("{} {message}", "✓".green()))
    }

    /// Clear the spinner; the error itself is reported by the caller.
    pub fn fail(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_spinner_prints_nothing() {
        let spinner = Spinner::start("Installing", true);
        assert!(spinner.bar.is_none());
        assert_eq!(spinner.success_line("Installed"), None);
    }

    #[test]
    fn test_success_line_is_marked() {
        colored::control::set_override(false);
        let spinner = Spinner::start("Installing", false);
        spinner.fail();
        assert_eq!(spinner.success_line("Installed").as_deref(), Some("✓ Installed"));
    }
}
