//! Shared integration-test helpers for running the `osce` binary.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Runs the `osce` binary with isolated environment variables.
pub struct OsceProcess;

impl OsceProcess {
    fn command(args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_osce"));
        cmd.args(args)
            .env_remove("OSCE_USER")
            .env_remove("OSCE_DATA_DIR")
            .env_remove("OSCE_SCENARIOS_DIR")
            .env_remove("OSCE_LOG_LEVEL")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Runs a command to completion with empty stdin.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        Self::command(args)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run osce")
    }

    /// Runs a command, feeding `input` on stdin and then closing it.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_with_input(args: &[&str], input: &str) -> Output {
        let mut child = Self::command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn osce");

        child
            .stdin
            .take()
            .expect("stdin not captured")
            .write_all(input.as_bytes())
            .expect("failed to write stdin");

        child.wait_with_output().expect("failed to wait for osce")
    }

    /// Path to a file under `tests/fixtures`.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Directory of valid station fixtures, usable as `--scenarios-dir`.
    #[must_use]
    pub fn stations_dir() -> PathBuf {
        Self::fixture_path("stations")
    }
}

/// Lossy stdout.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy stderr.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// `path` as `&str`.
#[allow(clippy::missing_panics_doc)]
pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 path")
}
