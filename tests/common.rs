use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated environment for driving the built binary: its own HOME,
/// XDG config dir and GOBIN so tests never touch the real installation.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub gobin: PathBuf,
    pub config_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gobin = temp_dir.path().join("gobin");
        let config_dir = temp_dir.path().join("config");
        std::fs::create_dir_all(&gobin).expect("Failed to create gobin");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_binup"));

        Self {
            _temp_dir: temp_dir,
            gobin,
            config_dir,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_CONFIG_HOME", &self.config_dir);
        cmd.env("GOBIN", &self.gobin);
        cmd.env_remove("GOPATH");
        cmd
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.status.success(),
            "Command failed.\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.status.success(),
            "Command unexpectedly succeeded.\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, needle: &str) -> &Self {
        assert!(
            self.stdout.contains(needle),
            "stdout did not contain {:?}.\nstdout: {}",
            needle,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, needle: &str) -> &Self {
        assert!(
            self.stderr.contains(needle),
            "stderr did not contain {:?}.\nstderr: {}",
            needle,
            self.stderr
        );
        self
    }
}
