use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub const KEY_GOBIN: &str = "GOBIN";
pub const KEY_GOPATH: &str = "GOPATH";

/// Access to the process environment. Production code binds this to the
/// real environment; tests substitute a map so they can run concurrently
/// without racing on process-wide state.
pub trait EnvironmentPort: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;
}

/// The real process environment.
pub struct ProcessEnv;

impl EnvironmentPort for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        std::env::set_var(key, value);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GoenvError {
    #[error("$GOPATH and $GOBIN are not set")]
    NoInstallTarget,
    #[error("dry run mode is already active")]
    AlreadyInRehearsal,
    #[error("can not create temporary directory for dry run: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("failed to set {key} to env variable (value: {value}): {source}")]
    SetEnv {
        key: String,
        value: String,
        #[source]
        source: std::io::Error,
    },
}

/// Snapshot of the installation-target variables, plus the scratch
/// directory while dry-run redirection is active.
///
/// Exactly one of the two variables is authoritative: $GOBIN when set,
/// otherwise $GOPATH. Entering dry-run mode points the authoritative
/// variable at a scratch directory so installs never touch the real
/// target; leaving restores it and removes the scratch directory.
/// Share as `Arc<Mutex<GoPaths>>` so the signal handler's forced leave
/// cannot race a normal leave; `leave_rehearsal` is idempotent.
#[derive(Debug)]
pub struct GoPaths {
    gobin: String,
    gopath: String,
    scratch: Option<PathBuf>,
}

impl GoPaths {
    pub fn new(env: &dyn EnvironmentPort) -> Self {
        Self {
            gobin: env.get(KEY_GOBIN).unwrap_or_default(),
            gopath: env.get(KEY_GOPATH).unwrap_or_default(),
            scratch: None,
        }
    }

    pub fn in_rehearsal(&self) -> bool {
        self.scratch.is_some()
    }

    /// Redirect the authoritative variable to a fresh scratch directory.
    ///
    /// On any failure the environment is left untouched and the state
    /// stays normal.
    pub fn enter_rehearsal(&mut self, env: &dyn EnvironmentPort) -> Result<(), GoenvError> {
        if self.scratch.is_some() {
            return Err(GoenvError::AlreadyInRehearsal);
        }

        let key = if !self.gobin.is_empty() {
            KEY_GOBIN
        } else if !self.gopath.is_empty() {
            KEY_GOPATH
        } else {
            return Err(GoenvError::NoInstallTarget);
        };

        let scratch = tempfile::Builder::new()
            .prefix("binup-dryrun-")
            .tempdir()
            .map_err(GoenvError::Scratch)?
            .into_path();

        if let Err(source) = env.set(key, &scratch.to_string_lossy()) {
            let _ = fs::remove_dir_all(&scratch);
            return Err(GoenvError::SetEnv {
                key: key.to_string(),
                value: scratch.display().to_string(),
                source,
            });
        }

        tracing::debug!("redirected {} to {}", key, scratch.display());
        self.scratch = Some(scratch);
        Ok(())
    }

    /// Restore the authoritative variable and remove the scratch
    /// directory. A no-op when not in dry-run mode, so a forced leave
    /// from the signal handler and a normal leave can overlap safely.
    ///
    /// The state transitions back to normal even when restoring fails;
    /// staying redirected after a failed restore would only compound the
    /// damage.
    pub fn leave_rehearsal(&mut self, env: &dyn EnvironmentPort) -> Result<(), GoenvError> {
        let Some(scratch) = self.scratch.take() else {
            return Ok(());
        };

        let (key, original) = if !self.gobin.is_empty() {
            (KEY_GOBIN, self.gobin.as_str())
        } else {
            (KEY_GOPATH, self.gopath.as_str())
        };

        let restored = env.set(key, original).map_err(|source| GoenvError::SetEnv {
            key: key.to_string(),
            value: original.to_string(),
            source,
        });

        if let Err(err) = fs::remove_dir_all(&scratch) {
            tracing::warn!(
                "temporary directory for dry run remains: {}: {}",
                scratch.display(),
                err
            );
        }

        restored
    }
}
