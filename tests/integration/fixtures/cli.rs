#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated data and config dirs for one sequence of CLI runs.
pub struct CliFixture {
    root: TempDir,
}

impl CliFixture {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create fixture dir"),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config")
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("done.json")
    }

    pub fn work_dir(&self) -> &Path {
        self.root.path()
    }

    pub fn japa(&self) -> Command {
        Command::from_std(self.std_command())
    }

    /// Plain process command, for runs that outlive a single assert.
    pub fn std_command(&self) -> StdCommand {
        let mut cmd = StdCommand::new(env!("CARGO_BIN_EXE_japa"));
        cmd.current_dir(self.work_dir());
        cmd.env("JAPA_DATA_DIR", self.data_dir());
        cmd.env("JAPA_CONFIG_DIR", self.config_dir());
        cmd.env("JAPA_TESTING", "1");
        cmd.env("JAPA_NO_LOG_FILE", "1");
        cmd.env("JAPA_DEBOUNCE_MS", "50");
        cmd.env_remove("JAPA_STORE_PATH");
        cmd.env_remove("JAPA_BASE_URL");
        cmd.env_remove("JAPA_LISTEN_ADDR");
        cmd.env_remove("LOG");
        cmd
    }

    /// Run with `--json` and parse stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .japa()
            .args(args)
            .arg("--json")
            .output()
            .expect("run japa");
        assert!(
            output.status.success(),
            "japa {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("parse json output")
    }
}
