//! Runs the compiled `artpaint` binary against files in a scratch directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A scratch directory plus a handle to invoke the CLI
pub struct TestCli {
    pub dir: TempDir,
}

/// Captured result of one invocation
pub struct CliOutput {
    pub output: Output,
}

impl CliOutput {
    pub fn success(&self) -> bool {
        self.output.status.success()
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Panic with both streams unless the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "artpaint failed with {:?}\nstdout:\n{}\nstderr:\n{}",
            self.output.status,
            self.stdout(),
            self.stderr()
        );
        self
    }
}

impl TestCli {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Run `artpaint <args>` with logging kept quiet
    pub fn run(&self, args: &[&str]) -> CliOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_artpaint"))
            .args(args)
            .current_dir(self.dir.path())
            .env("RUST_LOG", "warn")
            .output()
            .unwrap();
        CliOutput { output }
    }
}
