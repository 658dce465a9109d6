use crate::goenv::{EnvironmentPort, ProcessEnv, KEY_GOBIN, KEY_GOPATH};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use thiserror::Error;

const GO_EXE: &str = "go";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("is devel-binary copied from local environment")]
    DevelBinary,
    #[error("can't install {import_path}:\n{stderr}")]
    Install { import_path: String, stderr: String },
    #[error("cannot update with @master or @main using the 'binup'. please update manually.\n{0}")]
    MainOrMaster(String),
    #[error("can't check {0}")]
    LatestVersion(String),
    #[error("can't check go version:\n{0}")]
    ToolchainVersion(String),
    #[error("can't read build info from {}: {reason}", .path.display())]
    BuildInfo { path: PathBuf, reason: String },
    #[error("$GOPATH is not set")]
    GoPathNotSet,
}

/// Build metadata embedded in a 'go install'ed binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMetadata {
    pub import_path: String,
    pub module_path: String,
    pub version: String,
    pub go_version: String,
}

/// The external install/check tool. The engine only depends on this
/// trait; production wiring is `GoCmd`, tests use an instrumented stub.
pub trait GoTool: Send + Sync {
    /// Run "go install <import_path>@<selector>".
    fn install(&self, import_path: &str, selector: &str) -> Result<(), ToolError>;

    fn install_latest(&self, import_path: &str) -> Result<(), ToolError> {
        self.install(import_path, "latest")
    }

    /// Install from a moving branch: try @main, fall back to @master.
    /// Two candidate branch names are one logical attempt; the caller
    /// sees a single combined error.
    fn install_main_or_master(&self, import_path: &str) -> Result<(), ToolError> {
        let main_err = match self.install(import_path, "main") {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        match self.install(import_path, "master") {
            Ok(()) => Ok(()),
            Err(master_err) => {
                let main_msg = main_err.to_string();
                let master_msg = master_err.to_string();
                // Keep whichever error carries information. "unknown
                // revision" only says the branch name does not exist.
                let detail = if main_msg.contains("unknown revision main") {
                    master_msg
                } else if master_msg.contains("unknown revision master") {
                    main_msg
                } else {
                    format!("{main_msg}\n{master_msg}")
                };
                Err(ToolError::MainOrMaster(detail))
            }
        }
    }

    /// Run "go list -m -f {{.Version}} <module_path>@latest".
    fn latest_version(&self, module_path: &str) -> Result<String, ToolError>;

    /// Version of the installed Go toolchain, e.g. "go1.22.0".
    fn toolchain_version(&self) -> Result<String, ToolError>;

    /// Module version of the named binary under the install target, or
    /// "unknown" when it cannot be determined. Reads through the current
    /// environment, so during dry-run mode this sees the scratch
    /// directory.
    fn binary_version(&self, name: &str) -> String;

    fn read_build_metadata(&self, path: &Path) -> Result<BuildMetadata, ToolError>;
}

/// Production implementation shelling out to the go command.
pub struct GoCmd;

impl GoCmd {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoCmd {
    fn default() -> Self {
        Self::new()
    }
}

impl GoTool for GoCmd {
    fn install(&self, import_path: &str, selector: &str) -> Result<(), ToolError> {
        if import_path == "command-line-arguments" {
            return Err(ToolError::DevelBinary);
        }

        let output = Command::new(GO_EXE)
            .args(["install", &format!("{import_path}@{selector}")])
            .output()
            .map_err(|err| ToolError::Install {
                import_path: import_path.to_string(),
                stderr: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(ToolError::Install {
                import_path: import_path.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(())
    }

    fn latest_version(&self, module_path: &str) -> Result<String, ToolError> {
        let output = Command::new(GO_EXE)
            .args(["list", "-m", "-f", "{{.Version}}", &format!("{module_path}@latest")])
            .output()
            .map_err(|_| ToolError::LatestVersion(module_path.to_string()))?;
        if !output.status.success() {
            return Err(ToolError::LatestVersion(module_path.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn toolchain_version(&self) -> Result<String, ToolError> {
        let output = Command::new(GO_EXE)
            .arg("version")
            .output()
            .map_err(|err| ToolError::ToolchainVersion(err.to_string()))?;
        if !output.status.success() {
            return Err(ToolError::ToolchainVersion(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match go_version_re().captures(&stdout) {
            Some(caps) => Ok(caps[2].to_string()),
            None => Err(ToolError::ToolchainVersion(format!(
                "can't find go version string in {:?}",
                stdout.trim()
            ))),
        }
    }

    fn binary_version(&self, name: &str) -> String {
        let Ok(gobin) = go_bin(&ProcessEnv) else {
            return "unknown".to_string();
        };
        match self.read_build_metadata(&gobin.join(name)) {
            Ok(meta) if !meta.version.is_empty() => meta.version,
            _ => "unknown".to_string(),
        }
    }

    fn read_build_metadata(&self, path: &Path) -> Result<BuildMetadata, ToolError> {
        let output = Command::new(GO_EXE)
            .arg("version")
            .arg("-m")
            .arg(path)
            .output()
            .map_err(|err| ToolError::BuildInfo {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(ToolError::BuildInfo {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let meta = parse_build_metadata(&stdout);
        if meta.import_path.is_empty() && meta.module_path.is_empty() {
            return Err(ToolError::BuildInfo {
                path: path.to_path_buf(),
                reason: "no embedded module information".to_string(),
            });
        }
        Ok(meta)
    }
}

/// Parse the output of "go version -m <binary>":
///
/// ```text
/// /home/user/go/bin/gal: go1.19
///         path    github.com/nao1215/gal/cmd/gal
///         mod     github.com/nao1215/gal  v1.1.1  h1:...
/// ```
pub fn parse_build_metadata(output: &str) -> BuildMetadata {
    let mut meta = BuildMetadata::default();
    for (i, line) in output.lines().enumerate() {
        if i == 0 {
            if let Some((_, go_version)) = line.rsplit_once(": ") {
                meta.go_version = go_version.trim().to_string();
            }
            continue;
        }
        let fields: Vec<&str> = line.trim_start().split('\t').collect();
        match fields.as_slice() {
            ["path", import_path, ..] => meta.import_path = import_path.trim().to_string(),
            ["mod", module_path, rest @ ..] => {
                meta.module_path = module_path.trim().to_string();
                if let Some(version) = rest.first() {
                    meta.version = version.trim().to_string();
                }
            }
            _ => {}
        }
    }
    meta
}

/// Whether the go command is installed at all.
pub fn can_use_go_cmd() -> Result<(), ToolError> {
    let output = Command::new(GO_EXE)
        .arg("version")
        .output()
        .map_err(|err| ToolError::ToolchainVersion(err.to_string()))?;
    if !output.status.success() {
        return Err(ToolError::ToolchainVersion(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }
    Ok(())
}

/// Directory the go toolchain installs binaries into: $GOBIN, else
/// $GOPATH/bin, else the toolchain's own default GOPATH.
pub fn go_bin(env: &dyn EnvironmentPort) -> Result<PathBuf, ToolError> {
    if let Some(gobin) = env.get(KEY_GOBIN).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(gobin));
    }
    if let Some(gopath) = env.get(KEY_GOPATH).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(gopath).join("bin"));
    }

    let output = Command::new(GO_EXE)
        .args(["env", KEY_GOPATH])
        .output()
        .map_err(|_| ToolError::GoPathNotSet)?;
    let gopath = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || gopath.is_empty() {
        return Err(ToolError::GoPathNotSet);
    }
    Ok(PathBuf::from(gopath).join("bin"))
}

fn go_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|\s)(go[1-9]\S+)").unwrap())
}
