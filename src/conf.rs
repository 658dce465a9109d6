use crate::version::{Package, Version};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "binup.conf";

// Versions are not persisted; imported packages carry this sentinel
// until the update refreshes them.
const IMPORTED_VERSION: &str = "<from binup.conf>";

/// Directory of the package-list file, e.g. $HOME/.config/binup.
pub fn dir_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("could not determine config directory")?
        .join("binup"))
}

pub fn file_path() -> Result<PathBuf> {
    Ok(dir_path()?.join(CONFIG_FILE_NAME))
}

/// Parse a package-list file: one "name = import/path" per line,
/// '#' starts a comment, blank lines are ignored.
pub fn read_conf_file(path: &Path) -> Result<Vec<Package>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("can't read {}", path.display()))?;

    let mut pkgs = Vec::new();
    for line in content.lines() {
        let line = line.split('#').next().unwrap_or_default();
        if line.trim().is_empty() {
            continue;
        }

        let Some((name, import_path)) = line.split_once('=') else {
            bail!("{} is not a {} file", path.display(), CONFIG_FILE_NAME);
        };
        let name = name.trim();
        let import_path = import_path.trim();
        if name.is_empty() || import_path.is_empty() || import_path.contains('=') {
            bail!("{} is not a {} file", path.display(), CONFIG_FILE_NAME);
        }

        pkgs.push(Package {
            name: name.to_string(),
            import_path: import_path.to_string(),
            module_path: String::new(),
            version: Version::new(IMPORTED_VERSION),
            go_version: Version::new(IMPORTED_VERSION),
        });
    }
    Ok(pkgs)
}

/// Write the package list. Version information is intentionally lost;
/// import always reinstalls at latest.
pub fn write_conf(writer: &mut dyn Write, pkgs: &[Package]) -> std::io::Result<()> {
    for pkg in pkgs {
        writeln!(writer, "{} = {}", pkg.name, pkg.import_path)?;
    }
    Ok(())
}
