#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// An isolated home directory with its own config location.
pub struct Sandbox {
    pub home: TempDir,
}

#[allow(dead_code)]
impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("failed to create home dir for tests"),
        }
    }

    pub fn path(&self) -> &Path {
        self.home.path()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.path().join(".config").join("compline")
    }

    pub fn write_config(&self, content: &str) {
        let dir = self.config_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), content).unwrap();
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).unwrap()
    }

    /// A `compline` command that only sees this sandbox.
    pub fn cmd(&self) -> Command {
        let mut cmd = compline_cmd();
        cmd.env("HOME", self.path());
        cmd.env("COMPLINE_CONFIG_DIR", self.config_dir());
        cmd
    }
}

/// Create a configured `compline` command suitable for integration tests.
pub fn compline_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("compline"));
    cmd.timeout(CMD_TIMEOUT);
    for var in [
        "COMPLINE_CONFIG",
        "COMPLINE_SHELL",
        "COMPLINE_COMPLETION",
        "XDG_CONFIG_HOME",
        "ZDOTDIR",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("SHELL", "/bin/bash");
    cmd.env("NO_COLOR", "1");
    cmd
}
